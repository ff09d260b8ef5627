//! docbot CLI and Slack events server entry point.
//!
//! Binary name: `docbot`
//!
//! Parses CLI arguments, loads configuration, then dispatches to the
//! appropriate command handler or starts the events server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;
use tokio_util::sync::CancellationToken;

use cli::{Cli, Commands};
use state::{AppState, Runtime, SWEEP_INTERVAL, spawn_session_sweeper};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need config or logging
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "docbot", &mut std::io::stdout());
        return Ok(());
    }

    let filter = docbot_observe::verbosity_filter(cli.verbose, cli.quiet);
    docbot_observe::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    docbot_observe::shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let runtime = Runtime::load(cli.config.clone()).await?;

    match cli.command {
        Commands::Ask { channel, text } => {
            cli::ask::ask(&runtime, channel, text, cli.json).await?;
        }

        Commands::Check { ping } => {
            cli::check::check(&runtime, ping, cli.json).await?;
        }

        Commands::Serve { port, host } => {
            let state = AppState::init(&runtime)?;

            let shutdown = CancellationToken::new();
            let sweeper =
                spawn_session_sweeper(runtime.sessions.clone(), SWEEP_INTERVAL, shutdown.clone());

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            tracing::info!(
                addr = %addr,
                projects = runtime.projects.len(),
                model = %runtime.config.model,
                "docbot listening"
            );
            if !cli.quiet {
                println!(
                    "  {} docbot listening on {}",
                    console::style("⚡").bold(),
                    console::style(format!("http://{addr}/slack/events")).cyan()
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            shutdown.cancel();
            sweeper.await?;

            if !cli.quiet {
                println!("\n  Server stopped.");
            }
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

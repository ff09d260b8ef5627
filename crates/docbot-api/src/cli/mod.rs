//! CLI command definitions for the `docbot` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod ask;
pub mod check;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Slack assistant that answers questions about, and edits, project docs.
#[derive(Parser)]
#[command(name = "docbot", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to docbot.toml (default: $DOCBOT_CONFIG, then ./docbot.toml).
    #[arg(long, short = 'c', global = true, env = "DOCBOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the Slack events endpoint.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Run one message through the pipeline and print the reply.
    Ask {
        /// Channel id the message appears to come from (drives access rules).
        #[arg(long, default_value = "cli")]
        channel: String,

        /// Message text.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Validate configuration and list projects.
    Check {
        /// Also send a minimal request to the inference provider.
        #[arg(long)]
        ping: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::parse_from(["docbot", "ask", "--channel", "C1", "what", "changed?"]);
        match cli.command {
            Commands::Ask { channel, text } => {
                assert_eq!(channel, "C1");
                assert_eq!(text.join(" "), "what changed?");
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["docbot", "check", "--ping", "--json", "-vv"]);
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Check { ping: true }));
    }
}

//! `docbot check`: configuration and environment health check.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use secrecy::SecretString;

use docbot_core::store::DocumentStore;
use docbot_infra::llm::{ANTHROPIC_API_KEY_ENV, test_provider_connection};
use docbot_infra::slack::{SLACK_BOT_TOKEN_ENV, SLACK_SIGNING_SECRET_ENV};

use crate::state::Runtime;

/// One row of the project table.
#[derive(Debug, serde::Serialize)]
struct ProjectStatus {
    id: String,
    name: String,
    root: String,
    exists: bool,
    documents: Option<usize>,
}

pub async fn check(runtime: &Runtime, ping: bool, json: bool) -> Result<()> {
    let mut projects = Vec::with_capacity(runtime.projects.len());
    for project in &runtime.projects {
        let exists = tokio::fs::try_exists(&project.root).await.unwrap_or(false);
        let documents = runtime.store.list_documents(&project.id).await.ok().map(|d| d.len());
        projects.push(ProjectStatus {
            id: project.id.clone(),
            name: project.name.clone(),
            root: project.root.display().to_string(),
            exists,
            documents,
        });
    }

    let secrets = [
        (ANTHROPIC_API_KEY_ENV, is_set(&runtime.secrets.anthropic_api_key)),
        (SLACK_BOT_TOKEN_ENV, is_set(&runtime.secrets.slack_bot_token)),
        (SLACK_SIGNING_SECRET_ENV, is_set(&runtime.secrets.slack_signing_secret)),
    ];

    let ping_result = if ping {
        Some(match runtime.provider() {
            Ok(provider) => test_provider_connection(&provider, &runtime.config.model)
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        })
    } else {
        None
    };

    if json {
        let out = serde_json::json!({
            "config": runtime.config_path.display().to_string(),
            "model": runtime.config.model,
            "projects": projects,
            "channel_access": runtime.config.channel_access,
            "secrets": secrets.iter().map(|(k, v)| (k.to_string(), *v)).collect::<std::collections::BTreeMap<_, _>>(),
            "ping": ping_result.as_ref().map(|r| match r {
                Ok(()) => serde_json::json!({"ok": true}),
                Err(e) => serde_json::json!({"ok": false, "error": e}),
            }),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} docbot v{}",
        style("⚡").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("  Config: {}", style(runtime.config_path.display()).cyan());
    println!("  Model:  {}", runtime.config.model);
    println!();

    if projects.is_empty() {
        println!("  {}", style("No projects configured.").yellow());
    } else {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL_CONDENSED);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("Project").fg(Color::White),
            Cell::new("Name").fg(Color::White),
            Cell::new("Root").fg(Color::White),
            Cell::new("Docs").fg(Color::White),
        ]);
        for p in &projects {
            let docs = match (p.exists, p.documents) {
                (false, _) => Cell::new("missing").fg(Color::Red),
                (true, Some(n)) => Cell::new(n),
                (true, None) => Cell::new("unreadable").fg(Color::Yellow),
            };
            table.add_row(vec![
                Cell::new(&p.id).fg(Color::Cyan),
                Cell::new(&p.name),
                Cell::new(&p.root),
                docs,
            ]);
        }
        println!("{table}");
    }

    println!();
    println!("  {}", style("── Channel access ──").dim());
    if runtime.config.channel_access.is_empty() {
        println!("  All channels may access all projects.");
    } else {
        for (channel, allowed) in &runtime.config.channel_access {
            println!("  {channel}: {}", allowed.join(", "));
        }
    }

    println!();
    println!("  {}", style("── Secrets ──").dim());
    for (key, present) in secrets {
        println!("  {} {key}", check_mark(present));
    }

    if let Some(result) = ping_result {
        println!();
        match result {
            Ok(()) => println!("  {} Inference provider reachable", check_mark(true)),
            Err(e) => println!("  {} Inference provider: {e}", check_mark(false)),
        }
    }
    println!();
    Ok(())
}

fn is_set(secret: &Option<SecretString>) -> bool {
    secret.is_some()
}

fn check_mark(ok: bool) -> String {
    if ok {
        format!("{}", style("✓").green())
    } else {
        format!("{}", style("✗").red())
    }
}

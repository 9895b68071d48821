mod cli;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use condo_rag::core::config::AppPaths;
use condo_rag::core::logging;
use condo_rag::state::AppState;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = Arc::new(AppPaths::new());
    logging::init(&paths);

    let state = AppState::with_paths(paths, cli.mode).context("Failed to initialize")?;

    match cli.command {
        Command::Add { tenant, file } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let count = state
                .index
                .add_document(&tenant, &text)
                .await
                .with_context(|| format!("Failed to add document for {}", tenant))?;
            println!("{} chunks stored for {}", count, tenant);
        }
        Command::Search {
            tenant,
            query,
            top_k,
        } => {
            let top_k = top_k.unwrap_or_else(|| state.top_k());
            let outcome = state
                .index
                .search(&tenant, &query, top_k)
                .await
                .context("Search failed")?;
            println!("{}", outcome);
        }
        Command::Ask { tenant, question } => {
            let answer = state
                .answers
                .ask(&tenant, &question)
                .await
                .context("Failed to answer")?;
            println!("{}", answer);
        }
        Command::Tenants => {
            for tenant in state.index.list_tenants().await? {
                println!("{}", tenant);
            }
        }
        Command::Status => {
            let status = state.status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::ClearCache => {
            let removed = state.index.clear_cache().await?;
            println!("{} cache entries removed", removed);
        }
        Command::Config => {
            let settings = serde_json::to_value(&state.settings)?;
            let redacted = state.config.redact_sensitive_values(&settings);
            print!("{}", serde_yaml::to_string(&redacted)?);
        }
    }

    Ok(())
}

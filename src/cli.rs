use std::path::PathBuf;

use clap::{Parser, Subcommand};

use condo_rag::core::config::RetrievalMode;

#[derive(Debug, Parser)]
#[command(
    name = "condo-rag",
    about = "Question answering over condominium documents"
)]
pub struct Cli {
    /// Retrieval backend: heuristic, remote or vector (overrides config.yml)
    #[arg(long, global = true)]
    pub mode: Option<RetrievalMode>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replace a condominium's documents with the text of a file
    Add {
        /// Condominium id
        tenant: String,
        /// Plain-text document
        file: PathBuf,
    },
    /// Print the context retrieved for a question
    Search {
        tenant: String,
        query: String,
        /// Number of chunks to keep (defaults to the mode's top_k)
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Answer a question from the condominium's documents
    Ask { tenant: String, question: String },
    /// List condominiums with stored documents
    Tenants,
    /// Show index, cache and rate-limit state
    Status,
    /// Drop every cached relevance verdict
    ClearCache,
    /// Print the effective configuration with secrets redacted
    Config,
}

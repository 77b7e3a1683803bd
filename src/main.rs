//! # RAG Console CLI (`ragc`)
//!
//! Command-line front end for a retrieval-augmented-generation backend.
//! Each command drives the same client and operation lifecycle a graphical
//! front end would.
//!
//! ## Usage
//!
//! ```bash
//! ragc --config ./config/ragc.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ragc add <url>` | Submit a document URL for ingestion |
//! | `ragc ask "<query>"` | Ask a question against the corpus |
//! | `ragc stats` | Show document/chunk totals and per-source summaries |
//! | `ragc health` | Check that the backend is up |
//! | `ragc models` | List offered models |
//! | `ragc switch-model <id>` | Change the backend's active model |
//!
//! ## Examples
//!
//! ```bash
//! # Ingest a page as source code documentation
//! ragc add https://docs.rs/tokio --category code --tag async
//!
//! # Ask with a specific model, retrieving 5 chunks
//! ragc ask "What does spawn_blocking do?" --model llama-3.2-1b --k 5
//!
//! # Talk to a different backend for one call
//! ragc --base-url http://10.0.0.5:8000/api health
//! ```

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use rag_console::client::ApiClient;
use rag_console::config::{self, Config};
use rag_console::console::Console;
use rag_console::error::ClassifiedError;
use rag_console::models::{AddDocumentRequest, Category, SearchRequest};
use rag_console::operation::OperationRecord;

/// RAG Console — ingest documents into a RAG backend and ask questions
/// against them.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. Built-in defaults apply when the file does not exist.
#[derive(Parser)]
#[command(
    name = "ragc",
    about = "RAG Console — ingest documents and ask questions against a RAG backend",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/ragc.toml")]
    config: PathBuf,

    /// Override `backend.base_url` for this invocation.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Bearer token. Defaults to the env var named by `auth.token_env`.
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Submit a document URL for ingestion.
    Add {
        /// Document URL (http or https).
        url: String,

        /// Category tag: `general`, `code`, or a custom lowercase token.
        #[arg(long, default_value = "general")]
        category: Category,

        /// Free-form tag; repeat for several.
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Ask a question against the ingested corpus.
    Ask {
        /// The question.
        query: String,

        /// Model to answer with. Must be one of `ragc models`.
        #[arg(long)]
        model: Option<String>,

        /// Number of chunks to retrieve.
        #[arg(long)]
        k: Option<u32>,
    },

    /// Show corpus totals and per-source summaries.
    Stats,

    /// Check backend liveness.
    Health,

    /// List the models offered for answering.
    Models,

    /// Make a model the backend's active one.
    SwitchModel {
        /// Model identifier from `ragc models`.
        model: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut cfg = if cli.config.exists() {
        config::read_config(&cli.config)?
    } else {
        Config::minimal()
    };
    if let Some(base_url) = &cli.base_url {
        cfg.backend.base_url = base_url.clone();
    }
    config::validate(&cfg)?;

    let client = ApiClient::from_config(&cfg)?;
    if let Some(token) = cli.token.clone().or_else(|| cfg.auth.token_from_env()) {
        client.set_auth_token(&token)?;
    }

    match cli.command {
        Commands::Models => {
            let active = client.active_model();
            for model in client.offered_models() {
                let marker = if active.as_deref() == Some(model.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!("{} {}", marker, model);
            }
            return Ok(());
        }
        Commands::Stats => {
            let stats = client.get_stats().await.map_err(report)?;
            print_stats(&stats);
            return Ok(());
        }
        Commands::Health => {
            let health = client.get_health().await.map_err(report)?;
            match health.timestamp {
                Some(ts) => println!("status: {} ({})", health.status, ts),
                None => println!("status: {}", health.status),
            }
            return Ok(());
        }
        _ => {}
    }

    let console = Console::new(Arc::new(client));

    match cli.command {
        Commands::Add {
            url,
            category,
            tags,
        } => {
            let req = AddDocumentRequest::new(url, category).with_tags(tags);
            console.submit_document(req).await;
            let result = settled(console.documents().snapshot())?;
            if !result.is_success() {
                bail!("Ingestion failed: {}", result.message);
            }
            println!("Document added: {}", result.url);
            if !result.message.is_empty() {
                println!("  {}", result.message);
            }
        }
        Commands::Ask { query, model, k } => {
            let mut req = SearchRequest::new(query);
            req.model = model;
            req.k = k;
            console.ask(req).await;
            let result = settled(console.questions().snapshot())?;

            println!("{}", result.answer);
            if !result.sources.is_empty() {
                println!();
                println!("Sources:");
                for (i, citation) in result.sources.iter().enumerate() {
                    println!(
                        "  [{}] {}",
                        i + 1,
                        citation.source().unwrap_or("(unknown source)")
                    );
                    println!("      {}", snippet(&citation.content, 160));
                }
            }
        }
        Commands::SwitchModel { model } => {
            console.switch_model(model).await;
            let ack = settled(console.model_switch().snapshot())?;
            println!("Active model: {}", ack.model);
            if let Some(message) = ack.message {
                println!("  {}", message);
            }
        }
        Commands::Models | Commands::Stats | Commands::Health => {
            // Handled above (before building the console)
            unreachable!()
        }
    }

    Ok(())
}

/// Take the terminal outcome of a settled operation.
fn settled<T>(record: OperationRecord<T>) -> Result<T>
where
    T: Clone,
{
    if let Some(err) = record.error() {
        return Err(report(err.clone()));
    }
    match record.result() {
        Some(result) => Ok(result.clone()),
        None => bail!("operation ended in phase '{}'", record.phase().as_str()),
    }
}

/// Print a retry hint where one applies and hand the error to anyhow.
fn report(err: ClassifiedError) -> anyhow::Error {
    if err.is_retryable() {
        eprintln!("hint: the backend may be temporarily unavailable; retrying may help");
    }
    err.into()
}

fn print_stats(stats: &rag_console::models::StatsResult) {
    println!("RAG Console — Corpus Stats");
    println!("==========================");
    println!();
    println!("  Documents:   {}", stats.total_documents);
    println!("  Chunks:      {}", stats.total_chunks);

    if stats.sources.is_empty() {
        return;
    }

    println!();
    println!("  {:<40} {:>8}  {:<20}  TITLE", "URL", "CHUNKS", "ADDED");
    for source in &stats.sources {
        let added = source
            .added_at_utc()
            .map(|ts| ts.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| source.added_at.clone());
        println!(
            "  {:<40} {:>8}  {:<20}  {}",
            snippet(&source.url, 40),
            source.chunk_count,
            added,
            source.title
        );
    }
}

/// Shorten `text` to at most `max` characters on one line.
fn snippet(text: &str, max: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let cut: String = flat.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut)
}

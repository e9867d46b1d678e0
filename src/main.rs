//! # Context Chat CLI (`ctx-chat`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ctx-chat ingest <paths..>` | Embed documents and write the embeddings table |
//! | `ctx-chat ask "<question>"` | Answer one question with retrieved context |
//! | `ctx-chat chat` | Interactive question loop on stdin |
//! | `ctx-chat rank "<query>"` | Show stored documents ranked by similarity |
//! | `ctx-chat table inspect` | List the keys stored in an embeddings table |
//!
//! ## Examples
//!
//! ```bash
//! # Embed every PDF in a folder, first page only (see [ingest] max_pages)
//! ctx-chat ingest ./papers --config ./config/ctx-chat.toml
//!
//! # Ask with a previously saved table plus one extra document
//! ctx-chat ask "Who wrote the report?" --table ChatData.json --files notes.md
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use context_chat::{chat, config, ingest, table};

const DEFAULT_CONFIG: &str = "./config/ctx-chat.toml";

/// Context Chat: ground LLM answers in your own documents.
#[derive(Parser)]
#[command(
    name = "ctx-chat",
    about = "Context Chat: ground LLM answers in your own documents",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/ctx-chat.toml`; built-in defaults are used
    /// when that file does not exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (otherwise `RUST_LOG` or `info`).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed documents and write them to the embeddings table.
    ///
    /// Accepts files and directories. Directories are walked and filtered
    /// by the `[ingest]` include/exclude globs.
    Ingest {
        /// Files or directories to ingest.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Table file to write (defaults to `[table].path`).
        #[arg(long)]
        table: Option<PathBuf>,

        /// Merge into the existing table instead of replacing it.
        #[arg(long)]
        append: bool,
    },

    /// Answer a single question.
    Ask {
        /// The question to ask.
        question: String,

        /// Embeddings table to load (defaults to `[table].path` if present).
        #[arg(long)]
        table: Option<PathBuf>,

        /// Extra documents to embed for this session.
        #[arg(long, num_args = 1..)]
        files: Vec<PathBuf>,

        /// Print the prompt sent to the model on stderr.
        #[arg(long)]
        show_prompt: bool,
    },

    /// Start an interactive chat on stdin.
    Chat {
        /// Embeddings table to load (defaults to `[table].path` if present).
        #[arg(long)]
        table: Option<PathBuf>,

        /// Extra documents to embed for this session.
        #[arg(long, num_args = 1..)]
        files: Vec<PathBuf>,
    },

    /// Rank stored documents against a query.
    Rank {
        /// The query text.
        query: String,

        /// Embeddings table to load (defaults to `[table].path` if present).
        #[arg(long)]
        table: Option<PathBuf>,

        /// Extra documents to embed for this session.
        #[arg(long, num_args = 1..)]
        files: Vec<PathBuf>,

        /// Maximum number of results to print.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Inspect embeddings tables.
    Table {
        #[command(subcommand)]
        action: TableAction,
    },
}

#[derive(Subcommand)]
enum TableAction {
    /// List keys and vector dimensions of a table file (no network access).
    Inspect {
        /// Table file (defaults to `[table].path`).
        path: Option<PathBuf>,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = match &cli.config {
        Some(path) => config::load_or_default(path, true)?,
        None => config::load_or_default(&PathBuf::from(DEFAULT_CONFIG), false)?,
    };

    match cli.command {
        Commands::Ingest {
            paths,
            table,
            append,
        } => {
            ingest::run_ingest(&cfg, &paths, table.as_deref(), append).await?;
        }
        Commands::Ask {
            question,
            table,
            files,
            show_prompt,
        } => {
            chat::run_ask(&cfg, &question, table.as_deref(), &files, show_prompt).await?;
        }
        Commands::Chat { table, files } => {
            chat::run_chat(&cfg, table.as_deref(), &files).await?;
        }
        Commands::Rank {
            query,
            table,
            files,
            limit,
        } => {
            chat::run_rank(&cfg, &query, table.as_deref(), &files, limit).await?;
        }
        Commands::Table { action } => match action {
            TableAction::Inspect { path } => {
                let path = path.unwrap_or_else(|| cfg.table.path.clone());
                table::run_inspect(&path)?;
            }
        },
    }

    Ok(())
}

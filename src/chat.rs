//! Chat session: retrieval-augmented question answering.
//!
//! A [`ChatSession`] owns the [`Retriever`] (and through it the session's
//! [`EmbeddingStore`]) plus a [`CompletionProvider`]. Each question is
//! embedded, matched against the store, composed into a prompt with
//! [`prompt::compose`], and sent to the completion service.

use anyhow::{bail, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use context_chat_core::prompt;
use context_chat_core::retrieval::{RetrievalOutcome, Retriever};
use context_chat_core::store::EmbeddingStore;
use context_chat_core::Error;

use crate::completion::{create_completion, CompletionProvider};
use crate::config::{Config, IngestConfig};
use crate::embedding::create_provider;
use crate::ingest::{self, IngestReport};
use crate::table;

/// One answered question.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    /// Prompt actually sent to the completion service.
    pub prompt: String,
    pub reply: String,
    pub outcome: RetrievalOutcome,
}

pub struct ChatSession {
    retriever: Retriever,
    completion: Arc<dyn CompletionProvider>,
}

impl ChatSession {
    pub fn new(retriever: Retriever, completion: Arc<dyn CompletionProvider>) -> Self {
        Self {
            retriever,
            completion,
        }
    }

    pub fn retriever_mut(&mut self) -> &mut Retriever {
        &mut self.retriever
    }

    pub fn store(&self) -> &EmbeddingStore {
        self.retriever.store()
    }

    /// Embed documents into the session store; later questions can
    /// retrieve them.
    pub async fn add_documents(
        &mut self,
        paths: &[PathBuf],
        config: &IngestConfig,
        batch_size: usize,
    ) -> Result<IngestReport> {
        let embedder = Arc::clone(self.retriever.embedder());
        ingest::ingest_paths(
            paths,
            config,
            embedder.as_ref(),
            batch_size,
            self.retriever_mut().store_mut(),
        )
        .await
    }

    /// Answer `question`, grounding it with the best stored text.
    ///
    /// Blank questions are rejected before any service call. Embedding
    /// failures surface as [`Error::EmbeddingService`] and completion
    /// failures as [`Error::CompletionService`]; neither is retried here.
    pub async fn ask(&self, question: &str) -> Result<ChatTurn> {
        if question.trim().is_empty() {
            bail!("Question is empty");
        }

        let outcome = self.retriever.query(question).await?;
        let prompt = prompt::compose(&outcome, question);
        debug!(prompt = %prompt, "sending prompt");

        let reply = self
            .completion
            .complete(&prompt)
            .await
            .map_err(|e| Error::CompletionService(format!("{:#}", e)))?;

        Ok(ChatTurn {
            prompt,
            reply,
            outcome,
        })
    }
}

/// Build a retriever from config, seeded from a table and/or documents.
///
/// `table` overrides `[table].path`. An explicitly given table must exist;
/// the configured default is loaded only when present.
pub async fn load_retriever(
    config: &Config,
    table_override: Option<&Path>,
    files: &[PathBuf],
) -> Result<Retriever> {
    let embedder = create_provider(&config.embedding)?;
    let mut store = EmbeddingStore::new();

    let table_path = table_override.unwrap_or(config.table.path.as_path());
    if table_override.is_some() || table_path.exists() {
        table::import_table(table_path, &mut store)?;
    }

    if !files.is_empty() {
        ingest::ingest_paths(
            files,
            &config.ingest,
            embedder.as_ref(),
            config.embedding.batch_size,
            &mut store,
        )
        .await?;
    }

    info!(entries = store.len(), model = embedder.model_name(), "session store ready");
    Ok(Retriever::new(store, embedder).with_min_score(config.retrieval.min_score))
}

/// `ctx-chat ask`: answer one question and print the reply.
pub async fn run_ask(
    config: &Config,
    question: &str,
    table: Option<&Path>,
    files: &[PathBuf],
    show_prompt: bool,
) -> Result<()> {
    let retriever = load_retriever(config, table, files).await?;
    let session = ChatSession::new(retriever, create_completion(&config.completion)?);

    let turn = session.ask(question).await?;
    if show_prompt {
        eprintln!("{}\n", turn.prompt);
    }
    println!("{}", turn.reply);
    Ok(())
}

/// `ctx-chat chat`: interactive loop over stdin.
///
/// Lines starting with `/` are commands: `/add <path..>` ingests more
/// documents, `/save [path]` exports the session store, `/stats` prints
/// its size, `/quit` leaves.
pub async fn run_chat(config: &Config, table: Option<&Path>, files: &[PathBuf]) -> Result<()> {
    let retriever = load_retriever(config, table, files).await?;
    let mut session = ChatSession::new(retriever, create_completion(&config.completion)?);
    let default_table = table.unwrap_or(config.table.path.as_path()).to_path_buf();

    eprintln!(
        "ctx-chat: {} stored documents. Type /quit to exit.",
        session.store().len()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        std::io::stderr().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_command(line) {
            Some(ReplCommand::Quit) => break,
            Some(ReplCommand::Stats) => {
                let store = session.store();
                eprintln!(
                    "{} documents, dims {}",
                    store.len(),
                    store
                        .dims()
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "-".to_string())
                );
            }
            Some(ReplCommand::Add(paths)) if paths.is_empty() => {
                eprintln!("usage: /add <path..>")
            }
            Some(ReplCommand::Add(paths)) => {
                match session
                    .add_documents(&paths, &config.ingest, config.embedding.batch_size)
                    .await
                {
                    Ok(report) => eprintln!(
                        "added {} documents ({} skipped), {} stored",
                        report.loaded,
                        report.skipped,
                        session.store().len()
                    ),
                    Err(e) => eprintln!("Error: {:#}", e),
                }
            }
            Some(ReplCommand::Save(path)) => {
                let path = path.unwrap_or_else(|| default_table.clone());
                match table::export_table(&path, session.store()) {
                    Ok(n) => eprintln!("saved {} rows to {}", n, path.display()),
                    Err(e) => eprintln!("Error: {:#}", e),
                }
            }
            Some(ReplCommand::Unknown(cmd)) => {
                eprintln!("unknown command: {} (try /add, /save, /stats, /quit)", cmd)
            }
            None => match session.ask(line).await {
                Ok(turn) => println!("{}", turn.reply),
                Err(e) => eprintln!("Error: {:#}", e),
            },
        }
    }

    Ok(())
}

/// `ctx-chat rank`: print stored texts scored against a query.
pub async fn run_rank(
    config: &Config,
    query: &str,
    table: Option<&Path>,
    files: &[PathBuf],
    limit: usize,
) -> Result<()> {
    let retriever = load_retriever(config, table, files).await?;
    let ranking = retriever.rank(query).await?;

    if ranking.is_empty() {
        println!("No stored documents.");
        return Ok(());
    }

    for (i, result) in ranking.iter().take(limit).enumerate() {
        let snippet: String = result.text.chars().take(100).collect();
        println!("{}. [{:.4}] {}", i + 1, result.score, snippet);
    }
    Ok(())
}

#[derive(Debug, PartialEq)]
enum ReplCommand {
    Quit,
    Stats,
    Add(Vec<PathBuf>),
    Save(Option<PathBuf>),
    Unknown(String),
}

fn parse_command(line: &str) -> Option<ReplCommand> {
    let rest = line.strip_prefix('/')?;
    let mut parts = rest.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

    Some(match name {
        "quit" | "exit" | "q" => ReplCommand::Quit,
        "stats" => ReplCommand::Stats,
        "add" => ReplCommand::Add(
            arg.map(|a| a.split_whitespace().map(PathBuf::from).collect())
                .unwrap_or_default(),
        ),
        "save" => ReplCommand::Save(arg.map(PathBuf::from)),
        other => ReplCommand::Unknown(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("what is this?"), None);
        assert_eq!(parse_command("/quit"), Some(ReplCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ReplCommand::Quit));
        assert_eq!(parse_command("/stats"), Some(ReplCommand::Stats));
        assert_eq!(parse_command("/save"), Some(ReplCommand::Save(None)));
        assert_eq!(parse_command("/add"), Some(ReplCommand::Add(Vec::new())));
        assert_eq!(
            parse_command("/add a.pdf  notes/"),
            Some(ReplCommand::Add(vec![
                PathBuf::from("a.pdf"),
                PathBuf::from("notes/")
            ]))
        );
        assert_eq!(
            parse_command("/save  out/table.json "),
            Some(ReplCommand::Save(Some(PathBuf::from("out/table.json"))))
        );
        assert_eq!(
            parse_command("/frobnicate"),
            Some(ReplCommand::Unknown("frobnicate".to_string()))
        );
    }
}

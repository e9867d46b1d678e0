//! Document ingestion: files → text → embeddings → store.
//!
//! Ingestion runs as three explicit steps so no store write interleaves
//! with pending reads or embedding calls:
//!
//! 1. [`collect_files`] expands the given paths (directories are walked
//!    and filtered by the `[ingest]` globs).
//! 2. [`read_documents`] extracts and flattens the text of every file,
//!    skipping unreadable or empty ones with a warning.
//! 3. [`embed_documents`] embeds the texts in batches; the caller then
//!    applies the result with a single [`EmbeddingStore::bulk_load`].

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use context_chat_core::embedding::EmbeddingProvider;
use context_chat_core::store::EmbeddingStore;

use crate::config::{Config, IngestConfig};
use crate::embedding::create_provider;
use crate::extract;
use crate::table;

/// Text extracted from one file.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub text: String,
}

/// Summary of an ingestion run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    /// Files selected for reading.
    pub files: usize,
    /// Documents embedded and loaded.
    pub loaded: usize,
    /// Files skipped because extraction failed or produced no text.
    pub skipped: usize,
}

/// Expand files and directories into the list of files to ingest.
///
/// Explicit files are kept when their extension is supported. Directories
/// are walked recursively and filtered by `include_globs`/`exclude_globs`
/// (relative to the directory). Order is deterministic and duplicates are
/// dropped.
pub fn collect_files(paths: &[PathBuf], config: &IngestConfig) -> Result<Vec<PathBuf>> {
    let include_set = build_globset(&config.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for root in paths {
        if !root.exists() {
            bail!("Path does not exist: {}", root.display());
        }

        if root.is_file() {
            if extract::content_type_for_path(root).is_none() {
                warn!(path = %root.display(), "unsupported file type; skipping");
                continue;
            }
            if seen.insert(root.clone()) {
                files.push(root.clone());
            }
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(root).follow_links(config.follow_symlinks) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            let rel_str = relative.to_string_lossy().to_string();

            if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
                continue;
            }
            if extract::content_type_for_path(path).is_none() {
                continue;
            }
            found.push(path.to_path_buf());
        }

        // Sort for deterministic ordering
        found.sort();
        for path in found {
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }
    }

    Ok(files)
}

/// Read and extract every file, skipping failures.
///
/// Returns the documents in input order plus the number skipped.
pub fn read_documents(files: &[PathBuf], config: &IngestConfig) -> (Vec<SourceDocument>, usize) {
    let mut docs = Vec::with_capacity(files.len());
    let mut skipped = 0;

    for path in files {
        match read_document(path, config.max_pages) {
            Ok(Some(doc)) => docs.push(doc),
            Ok(None) => {
                warn!(path = %path.display(), "no text extracted; skipping");
                skipped += 1;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %format!("{:#}", e), "extraction failed; skipping");
                skipped += 1;
            }
        }
    }

    (docs, skipped)
}

fn read_document(path: &Path, max_pages: Option<usize>) -> Result<Option<SourceDocument>> {
    let content_type = extract::content_type_for_path(path)
        .ok_or_else(|| anyhow::anyhow!("unsupported file type"))?;
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let text = extract::extract_text(&bytes, content_type, max_pages)?;

    if text.is_empty() {
        return Ok(None);
    }
    debug!(path = %path.display(), chars = text.chars().count(), "extracted text");
    Ok(Some(SourceDocument {
        path: path.to_path_buf(),
        text,
    }))
}

/// Embed documents in batches of `batch_size`, preserving order.
///
/// Any failed batch aborts the run; nothing is returned partially.
pub async fn embed_documents(
    provider: &dyn EmbeddingProvider,
    docs: &[SourceDocument],
    batch_size: usize,
) -> Result<Vec<(String, Vec<f32>)>> {
    let mut pairs = Vec::with_capacity(docs.len());

    for (n, batch) in docs.chunks(batch_size.max(1)).enumerate() {
        let texts: Vec<String> = batch.iter().map(|d| d.text.clone()).collect();
        let vectors = provider
            .embed(&texts)
            .await
            .with_context(|| format!("Embedding batch {} failed", n + 1))?;
        if vectors.len() != texts.len() {
            bail!(
                "Embedding batch {} returned {} vectors for {} documents",
                n + 1,
                vectors.len(),
                texts.len()
            );
        }
        pairs.extend(texts.into_iter().zip(vectors));
    }

    Ok(pairs)
}

/// Run the full pipeline and load the results into `store`.
pub async fn ingest_paths(
    paths: &[PathBuf],
    config: &IngestConfig,
    provider: &dyn EmbeddingProvider,
    batch_size: usize,
    store: &mut EmbeddingStore,
) -> Result<IngestReport> {
    let files = collect_files(paths, config)?;
    let (docs, skipped) = read_documents(&files, config);

    let pairs = embed_documents(provider, &docs, batch_size).await?;
    let loaded = store.bulk_load(pairs)?;

    info!(files = files.len(), loaded, skipped, "ingested documents");
    Ok(IngestReport {
        files: files.len(),
        loaded,
        skipped,
    })
}

/// `ctx-chat ingest`: embed documents and write the embeddings table.
///
/// With `append`, rows already in the table are loaded first so new
/// documents are merged into it (re-ingested texts are overwritten).
pub async fn run_ingest(
    config: &Config,
    paths: &[PathBuf],
    table_override: Option<&Path>,
    append: bool,
) -> Result<()> {
    let table_path = table_override.unwrap_or(config.table.path.as_path());
    let provider = create_provider(&config.embedding)?;

    let mut store = EmbeddingStore::new();
    if append && table_path.exists() {
        table::import_table(table_path, &mut store)?;
    }
    let existing = store.len();

    let report = ingest_paths(
        paths,
        &config.ingest,
        provider.as_ref(),
        config.embedding.batch_size,
        &mut store,
    )
    .await?;
    let rows = table::export_table(table_path, &store)?;

    println!("ingest");
    println!("  files: {}", report.files);
    println!("  embedded: {}", report.loaded);
    println!("  skipped: {}", report.skipped);
    if append {
        println!("  existing rows: {}", existing);
    }
    println!("  table: {} ({} rows)", table_path.display(), rows);
    Ok(())
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn docs_dir() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("b.md"), "# Beta\nsecond").unwrap();
        fs::write(root.join("a.txt"), "alpha\nfirst").unwrap();
        fs::write(root.join("sub/c.txt"), "gamma").unwrap();
        fs::write(root.join("empty.txt"), "\n\n").unwrap();
        fs::write(root.join("image.png"), [0u8, 1, 2]).unwrap();
        fs::write(root.join("node_modules/pkg/readme.md"), "vendored").unwrap();
        tmp
    }

    #[test]
    fn test_collect_files_walks_and_filters() {
        let tmp = docs_dir();
        let files = collect_files(&[tmp.path().to_path_buf()], &IngestConfig::default()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(tmp.path()).unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.md", "empty.txt", "sub/c.txt"]);
    }

    #[test]
    fn test_collect_files_respects_excludes_and_dedupes() {
        let tmp = docs_dir();
        let config = IngestConfig {
            exclude_globs: vec!["sub/**".to_string()],
            ..Default::default()
        };
        let explicit = tmp.path().join("a.txt");
        let files = collect_files(&[explicit.clone(), tmp.path().to_path_buf()], &config).unwrap();
        assert_eq!(files[0], explicit);
        assert_eq!(files.iter().filter(|p| **p == explicit).count(), 1);
        assert!(!files.iter().any(|p| p.ends_with("sub/c.txt")));
    }

    #[test]
    fn test_collect_files_missing_path() {
        let err = collect_files(&[PathBuf::from("/definitely/not/here")], &IngestConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_read_documents_flattens_and_skips_empty() {
        let tmp = docs_dir();
        let files = collect_files(&[tmp.path().to_path_buf()], &IngestConfig::default()).unwrap();
        let (docs, skipped) = read_documents(&files, &IngestConfig::default());
        assert_eq!(skipped, 1);
        let texts: Vec<&str> = docs.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["alpha first", "# Beta second", "gamma"]);
    }
}

//! Embeddings table file: load into and save from an [`EmbeddingStore`].
//!
//! The table is a JSON array of `{"Key": ..., "Value": ...}` rows, one per
//! stored text, with the vector encoded as a JSON array string. This is the
//! same two-column shape the chatbot has always exported, so tables can be
//! moved between sessions and edited by hand.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use context_chat_core::store::EmbeddingStore;
use context_chat_core::table::{decode_rows, TableRow};

/// Read all rows from a table file.
pub fn read_table(path: &Path) -> Result<Vec<TableRow>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read embeddings table: {}", path.display()))?;
    let rows: Vec<TableRow> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid embeddings table: {}", path.display()))?;
    Ok(rows)
}

/// Write rows to a table file, creating parent directories.
pub fn write_table(path: &Path, rows: &[TableRow]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(rows)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write embeddings table: {}", path.display()))?;
    Ok(())
}

/// Decode a table file and bulk-load it into `store`.
///
/// All rows are decoded before the store is touched; a malformed row
/// aborts the import. Returns the number of rows applied.
pub fn import_table(path: &Path, store: &mut EmbeddingStore) -> Result<usize> {
    let rows = read_table(path)?;
    let entries = decode_rows(&rows)?;
    let applied = store.bulk_load(entries)?;
    info!(path = %path.display(), rows = applied, "imported embeddings table");
    Ok(applied)
}

/// Export every entry of `store` to `path`. Returns the number of rows.
pub fn export_table(path: &Path, store: &EmbeddingStore) -> Result<usize> {
    let rows = store.to_rows()?;
    write_table(path, &rows)?;
    info!(path = %path.display(), rows = rows.len(), "exported embeddings table");
    Ok(rows.len())
}

/// `ctx-chat table inspect`: list a table's keys and vector sizes.
pub fn run_inspect(path: &Path) -> Result<()> {
    let rows = read_table(path)?;
    let entries = decode_rows(&rows)?;

    let mut store = EmbeddingStore::new();
    store.bulk_load(entries)?;

    println!("table {}", path.display());
    println!("  rows: {}", rows.len());
    println!("  entries: {}", store.len());
    match store.dims() {
        Some(d) => println!("  dims: {}", d),
        None => println!("  dims: -"),
    }
    for entry in store.entries() {
        let snippet: String = entry.text.chars().take(80).collect();
        println!("  - {}", snippet);
    }
    Ok(())
}

//! # Context Chat Core
//!
//! Shared, WASM-safe logic for Context Chat: vector math, the embedding
//! store, best-match retrieval, and prompt composition.
//!
//! This crate contains no tokio, HTTP, filesystem I/O, or other
//! native-only dependencies. Embedding and completion services are
//! reached only through traits implemented by the application crate.
//!
//! ## Data flow
//!
//! ```text
//! documents ──▶ EmbeddingStore::bulk_load
//!                       │
//! query ──▶ Retriever::query ──▶ EmbeddingStore::best_match ──▶ vector::cosine_similarity
//!                       │
//!                       ▼
//!            prompt::compose ──▶ completion service
//! ```

pub mod embedding;
pub mod error;
pub mod prompt;
pub mod retrieval;
pub mod store;
pub mod table;
pub mod vector;

pub use error::{Error, Result};

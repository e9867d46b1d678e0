//! Best-match retrieval over an owned [`EmbeddingStore`].
//!
//! The [`Retriever`] embeds an incoming query through its
//! [`EmbeddingProvider`] and asks the store for the single best entry.
//! An empty store short-circuits to [`RetrievalOutcome::NoContext`]
//! without touching the embedding service.

use std::sync::Arc;

use tracing::debug;

use crate::embedding::EmbeddingProvider;
use crate::error::{Error, Result};
use crate::store::{preview, EmbeddingStore, SimilarityResult};

/// Result of a retrieval attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalOutcome {
    /// Nothing usable as context; the query goes out unaugmented.
    NoContext,
    /// The stored text most similar to the query.
    BestMatch { text: String, score: f32 },
}

impl RetrievalOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, RetrievalOutcome::BestMatch { .. })
    }
}

/// Embeds queries and selects the best stored context for them.
pub struct Retriever {
    store: EmbeddingStore,
    embedder: Arc<dyn EmbeddingProvider>,
    min_score: Option<f32>,
}

impl Retriever {
    pub fn new(store: EmbeddingStore, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            store,
            embedder,
            min_score: None,
        }
    }

    /// Report matches scoring strictly below `min_score` as `NoContext`.
    pub fn with_min_score(mut self, min_score: Option<f32>) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn store(&self) -> &EmbeddingStore {
        &self.store
    }

    /// Mutable access for ingestion between queries.
    pub fn store_mut(&mut self) -> &mut EmbeddingStore {
        &mut self.store
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Find the stored text that best grounds `raw_query`.
    ///
    /// # Errors
    ///
    /// - [`Error::EmbeddingService`] if embedding the query fails (not retried here).
    /// - Any error from [`EmbeddingStore::best_match`], e.g. a query vector
    ///   whose dimensionality disagrees with the store.
    pub async fn query(&self, raw_query: &str) -> Result<RetrievalOutcome> {
        if self.store.is_empty() {
            debug!("store is empty; skipping query embedding");
            return Ok(RetrievalOutcome::NoContext);
        }

        let query_vec = self.embed_query(raw_query).await?;
        let Some(best) = self.store.best_match(&query_vec)? else {
            return Ok(RetrievalOutcome::NoContext);
        };

        if let Some(min) = self.min_score {
            if best.score < min {
                debug!(
                    score = best.score,
                    min_score = min,
                    text = %preview(&best.text),
                    "best match below threshold"
                );
                return Ok(RetrievalOutcome::NoContext);
            }
        }

        debug!(score = best.score, text = %preview(&best.text), "best match");
        Ok(RetrievalOutcome::BestMatch {
            text: best.text,
            score: best.score,
        })
    }

    /// Full ranking of the store against `raw_query`, best first.
    pub async fn rank(&self, raw_query: &str) -> Result<Vec<SimilarityResult>> {
        if self.store.is_empty() {
            return Ok(Vec::new());
        }
        let query_vec = self.embed_query(raw_query).await?;
        self.store.rank_against(&query_vec)
    }

    async fn embed_query(&self, raw_query: &str) -> Result<Vec<f32>> {
        self.embedder
            .embed_one(raw_query)
            .await
            .map_err(|e| Error::EmbeddingService(format!("{:#}", e)))
    }
}

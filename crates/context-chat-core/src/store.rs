//! In-memory embedding store with deterministic similarity ranking.
//!
//! The store maps source text to its embedding vector. Every entry shares
//! one dimensionality, fixed by the first successful insert. Entries keep
//! the position of their first insertion, which is the tie-break for
//! equal scores: the earliest-inserted entry ranks first.
//!
//! Zero-magnitude stored vectors cannot be scored; they are ranked with
//! `f32::NEG_INFINITY` so they never outrank a scoreable entry.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::vector::{self, cosine_similarity};

/// A stored `(text, vector)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingEntry {
    pub text: String,
    pub vector: Vec<f32>,
}

/// Score of one stored entry against a query vector.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityResult {
    /// Source text of the stored entry.
    pub text: String,
    /// Cosine similarity, or `f32::NEG_INFINITY` when undefined.
    pub score: f32,
}

/// Session-owned mapping from source text to embedding vector.
#[derive(Debug, Default, Clone)]
pub struct EmbeddingStore {
    entries: Vec<EmbeddingEntry>,
    index: HashMap<String, usize>,
    dims: Option<usize>,
}

impl EmbeddingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dimensionality shared by all entries, `None` until the first insert.
    pub fn dims(&self) -> Option<usize> {
        self.dims
    }

    pub fn get(&self, text: &str) -> Option<&[f32]> {
        self.index
            .get(text)
            .map(|&i| self.entries[i].vector.as_slice())
    }

    /// Entries in first-insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &EmbeddingEntry> {
        self.entries.iter()
    }

    /// Drop every entry and forget the dimensionality.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.dims = None;
    }

    /// Insert or overwrite the vector for `text`.
    ///
    /// The first insert into an empty store fixes the dimensionality.
    /// Overwriting keeps the entry's original position.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyVector`] for a zero-length vector.
    /// - [`Error::NonFiniteValue`] if any component is NaN or infinite.
    /// - [`Error::DimensionMismatch`] if the length differs from [`dims`](Self::dims).
    pub fn insert(&mut self, text: impl Into<String>, vector: Vec<f32>) -> Result<()> {
        validate_vector(&vector, self.dims)?;
        self.apply(text.into(), vector);
        Ok(())
    }

    /// Insert a batch of entries in sequence order.
    ///
    /// Later duplicates override earlier ones, as with repeated
    /// [`insert`](Self::insert) calls. The whole batch is validated before
    /// anything is applied, so a failing batch leaves the store untouched.
    ///
    /// Returns the number of pairs applied.
    pub fn bulk_load<I, S>(&mut self, entries: I) -> Result<usize>
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: Into<String>,
    {
        let batch: Vec<(String, Vec<f32>)> =
            entries.into_iter().map(|(t, v)| (t.into(), v)).collect();

        let mut dims = self.dims;
        for (text, vector) in &batch {
            if let Err(e) = validate_vector(vector, dims) {
                warn!(text = %preview(text), error = %e, "rejecting bulk load");
                return Err(e);
            }
            dims = Some(vector.len());
        }

        let count = batch.len();
        for (text, vector) in batch {
            self.apply(text, vector);
        }
        debug!(count, total = self.len(), "bulk load applied");
        Ok(count)
    }

    /// Score every entry against `query`, best first.
    ///
    /// Ordering is descending by score; equal scores keep insertion order.
    /// An empty store yields an empty ranking.
    ///
    /// # Errors
    ///
    /// - [`Error::DimensionMismatch`] if `query` does not match [`dims`](Self::dims).
    /// - [`Error::NonFiniteValue`] if `query` contains NaN or infinity.
    /// - [`Error::UndefinedSimilarity`] if `query` has zero magnitude.
    pub fn rank_against(&self, query: &[f32]) -> Result<Vec<SimilarityResult>> {
        let mut results = self.score_all(query)?;
        // Stable sort: ties stay in insertion order. Scores are never NaN,
        // and -0.0 must tie with +0.0 as it does in `best_match`.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        Ok(results)
    }

    /// The highest-scoring entry, or `None` for an empty store.
    ///
    /// Selects the same entry as the head of [`rank_against`](Self::rank_against):
    /// a candidate replaces the current best only when strictly greater.
    pub fn best_match(&self, query: &[f32]) -> Result<Option<SimilarityResult>> {
        let mut best: Option<SimilarityResult> = None;
        for candidate in self.score_all(query)? {
            let replace = best
                .as_ref()
                .map_or(true, |current| candidate.score > current.score);
            if replace {
                best = Some(candidate);
            }
        }
        Ok(best)
    }

    fn score_all(&self, query: &[f32]) -> Result<Vec<SimilarityResult>> {
        let Some(dims) = self.dims else {
            return Ok(Vec::new());
        };
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }
        validate_vector(query, Some(dims))?;
        if vector::magnitude(query) == 0.0 {
            return Err(Error::UndefinedSimilarity);
        }

        self.entries
            .iter()
            .map(|entry| {
                let score = match cosine_similarity(&entry.vector, query) {
                    Ok(s) => s,
                    Err(Error::UndefinedSimilarity) => f32::NEG_INFINITY,
                    Err(e) => return Err(e),
                };
                Ok(SimilarityResult {
                    text: entry.text.clone(),
                    score,
                })
            })
            .collect()
    }

    fn apply(&mut self, text: String, vector: Vec<f32>) {
        self.dims = Some(vector.len());
        match self.index.get(&text) {
            Some(&i) => self.entries[i].vector = vector,
            None => {
                self.index.insert(text.clone(), self.entries.len());
                self.entries.push(EmbeddingEntry { text, vector });
            }
        }
    }
}

fn validate_vector(vector: &[f32], dims: Option<usize>) -> Result<()> {
    if vector.is_empty() {
        return Err(Error::EmptyVector);
    }
    if let Some(expected) = dims {
        if vector.len() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }
    }
    if let Some(index) = vector::first_non_finite(vector) {
        return Err(Error::NonFiniteValue { index });
    }
    Ok(())
}

/// Short prefix of a source text for log lines.
pub(crate) fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(48).collect();
    if out.len() < text.len() {
        out.push('…');
    }
    out
}

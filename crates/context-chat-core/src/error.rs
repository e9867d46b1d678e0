//! Error taxonomy shared by every core operation.

use thiserror::Error;

/// Errors produced by the core retrieval pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Vector length differs from the store's dimensionality, or the two
    /// operands of a similarity computation differ in length.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Cosine similarity is undefined because one operand has zero magnitude.
    #[error("similarity is undefined for a zero-magnitude vector")]
    UndefinedSimilarity,

    /// An empty vector cannot establish or match a dimensionality.
    #[error("embedding vector is empty")]
    EmptyVector,

    /// Vector contains NaN or infinity at the given position.
    #[error("embedding vector has a non-finite value at index {index}")]
    NonFiniteValue { index: usize },

    /// The external embedding service failed.
    #[error("embedding service error: {0}")]
    EmbeddingService(String),

    /// The external completion service failed.
    #[error("completion service error: {0}")]
    CompletionService(String),

    /// A vector could not be rendered as a table value.
    #[error("cannot encode vector for key {key:?}: {reason}")]
    Encode { key: String, reason: String },

    /// A table row could not be decoded into a vector.
    #[error("cannot decode vector for key {key:?}: {reason}")]
    Decode { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

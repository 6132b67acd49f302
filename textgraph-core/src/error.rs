//! Error types for the textgraph-core crate.

use thiserror::Error;

/// Top-level error type for attention computations.
#[derive(Debug, Error)]
pub enum GatError {
    /// The query text produced no tokens after normalization.
    #[error("Input error: query text contains no word tokens")]
    EmptyQuery,

    #[error("Dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("Ragged score matrix: row {row} has {actual} cells, expected {expected}")]
    RaggedMatrix {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Embedding count {embeddings} does not match token count {tokens}")]
    TokenCountMismatch { tokens: usize, embeddings: usize },

    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl GatError {
    pub fn dimension_mismatch(left: usize, right: usize) -> Self {
        Self::DimensionMismatch { left, right }
    }
}

pub type Result<T> = std::result::Result<T, GatError>;

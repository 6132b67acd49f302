//! # textgraph-core: attention over text-as-graph
//!
//! Turns a paragraph and a query into a normalized `N x N` attention matrix
//! over the query tokens, using one of two GAT scoring variants:
//!
//! - **Educational**: deterministic sinusoidal embeddings, dot-product scores
//!   with LeakyReLU and an adjacency bonus, no self-attention.
//! - **Original**: richer node features projected by Xavier-initialized
//!   weights, scored as `a . [Wh_i || Wh_j]` with self-attention.
//!
//! ```text
//! tokenize -> embed -> score -> softmax -> aggregate -> ComputationResult
//! ```
//!
//! Everything runs synchronously on the calling thread. Embedders and the
//! trace sink are injected into [`AttentionPipeline`]; nothing is global.

pub mod config;
pub mod embedding;
pub mod error;
pub mod matrix;
pub mod pipeline;
pub mod scoring;
pub mod similarity;
pub mod softmax;
pub mod stats;
pub mod tokenizer;
pub mod trace;

// Re-exports
pub use config::{GatConfig, WeightSeed, load_config};
pub use embedding::{FeatureEmbedder, SimpleEmbedder, TokenEmbedder};
pub use error::GatError;
pub use matrix::AttentionMatrix;
pub use pipeline::{
    AttentionPipeline, ComputationDetails, ComputationResult, DualComputationResult, Variant,
    compute_attention, compute_dual_attention,
};
pub use scoring::{AttentionScorer, EducationalScorer, OriginalScorer};
pub use similarity::cosine_similarity;
pub use softmax::SoftmaxNormalizer;
pub use stats::AttentionStats;
pub use tokenizer::tokenize;
pub use trace::{LogTrace, NoopTrace, RecordingTrace, TraceEvent, TraceSink};

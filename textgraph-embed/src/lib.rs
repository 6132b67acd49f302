//! # textgraph-embed: real-embedding backend
//!
//! Runs an [`EmbeddingModel`] on a dedicated worker task and exposes it
//! through [`EmbeddingClient`]. Requests are correlated by callback id and
//! fail with [`BackendError::Timeout`] when the worker does not answer in
//! time. Attention from the backend is cosine similarity between token
//! embeddings; [`compute_with_fallback`] drops back to the synthetic
//! educational pipeline when the backend is unavailable.

pub mod attention;
pub mod client;
pub mod error;
pub mod fallback;
pub mod model;
pub mod protocol;
pub mod worker;

pub use attention::{ModelInfo, cosine_attention};
pub use client::EmbeddingClient;
pub use error::BackendError;
pub use fallback::compute_with_fallback;
pub use model::{DemoGemmaModel, EmbeddingModel, ProgressReporter};
pub use protocol::{BackendStatus, TaskType};

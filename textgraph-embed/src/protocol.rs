//! Messages exchanged between [`crate::EmbeddingClient`] and the worker task.

use serde::{Deserialize, Serialize};
use textgraph_core::ComputationResult;

use crate::error::BackendError;

/// Retrieval role the embeddings are produced for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Query,
    #[default]
    Document,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Document => "document",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkerRequest {
    Load,
    Embed {
        texts: Vec<String>,
        task_type: TaskType,
    },
    Attention {
        tokens: Vec<String>,
        task_type: TaskType,
    },
}

impl WorkerRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Embed { .. } => "embed",
            Self::Attention { .. } => "attention",
        }
    }
}

/// A request tagged with the id its reply is correlated by.
#[derive(Debug, Clone)]
pub struct WorkerMessage {
    pub callback_id: u64,
    pub request: WorkerRequest,
}

#[derive(Debug, Clone)]
pub enum WorkerReply {
    Loaded { device: String },
    Embeddings(Vec<Vec<f64>>),
    Attention(Box<ComputationResult>),
}

#[derive(Debug)]
pub struct WorkerResponse {
    pub callback_id: u64,
    pub result: Result<WorkerReply, BackendError>,
}

/// Snapshot of the backend's loading state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendStatus {
    pub is_loading: bool,
    pub is_ready: bool,
    pub progress: u8,
    pub status: String,
    pub error: Option<String>,
    pub model_name: String,
    pub device: Option<String>,
    pub embedding_dimension: usize,
}

impl BackendStatus {
    pub fn waiting(model_name: &str, embedding_dimension: usize) -> Self {
        Self {
            is_loading: false,
            is_ready: false,
            progress: 0,
            status: "Waiting to initialize...".into(),
            error: None,
            model_name: model_name.to_string(),
            device: None,
            embedding_dimension,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_type_defaults_to_document() {
        assert_eq!(TaskType::default(), TaskType::Document);
        assert_eq!(TaskType::default().as_str(), "document");
        assert_eq!(TaskType::Query.as_str(), "query");
    }

    #[test]
    fn test_status_serializes_camel_case() {
        let status = BackendStatus::waiting("m", 768);
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["isReady"], false);
        assert_eq!(json["embeddingDimension"], 768);
    }

    #[test]
    fn test_request_kind() {
        assert_eq!(WorkerRequest::Load.kind(), "load");
        assert_eq!(
            WorkerRequest::Embed {
                texts: vec![],
                task_type: TaskType::Query
            }
            .kind(),
            "embed"
        );
    }
}

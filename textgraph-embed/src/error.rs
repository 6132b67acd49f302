//! Backend-specific error types.

use textgraph_core::GatError;

/// Errors raised by the embedding backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Request {callback_id} timed out after {timeout_secs}s")]
    Timeout { callback_id: u64, timeout_secs: u64 },

    #[error("Model not loaded")]
    ModelNotLoaded,

    #[error("Embedding worker is no longer running")]
    WorkerClosed,

    #[error("Model error: {0}")]
    Model(String),

    #[error("Unexpected reply for request {callback_id}: expected {expected}")]
    UnexpectedReply {
        callback_id: u64,
        expected: &'static str,
    },

    #[error(transparent)]
    Core(#[from] GatError),
}

impl BackendError {
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message() {
        let err = BackendError::Timeout {
            callback_id: 3,
            timeout_secs: 60,
        };
        assert_eq!(err.to_string(), "Request 3 timed out after 60s");
        assert!(err.is_timeout());
    }

    #[test]
    fn test_core_error_passthrough() {
        let err: BackendError = GatError::dimension_mismatch(768, 64).into();
        assert_eq!(err.to_string(), "Dimension mismatch: 768 vs 64");
        assert!(!err.is_timeout());
    }
}

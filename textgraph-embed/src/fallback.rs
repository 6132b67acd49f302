//! Backend attention with a synthetic fallback.

use textgraph_core::{AttentionPipeline, ComputationResult, GatError, Variant, tokenize};
use tracing::{info, warn};

use crate::client::EmbeddingClient;
use crate::error::BackendError;
use crate::protocol::TaskType;

/// Compute attention over the query tokens with the embedding backend. If
/// the backend fails or times out, the educational pipeline answers instead.
///
/// An empty query is an error on both paths and is never retried.
pub async fn compute_with_fallback(
    client: &EmbeddingClient,
    pipeline: &AttentionPipeline,
    paragraph: &str,
    query: &str,
) -> Result<ComputationResult, BackendError> {
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() {
        return Err(GatError::EmptyQuery.into());
    }

    match client.attention(query_tokens, TaskType::Query).await {
        Ok(mut result) => {
            let limit = pipeline.config().pipeline.paragraph_display_limit;
            result.paragraph_tokens = tokenize(paragraph).into_iter().take(limit).collect();
            info!(
                tokens = result.query_tokens.len(),
                "Attention computed by embedding backend"
            );
            Ok(result)
        }
        Err(e) => {
            warn!(error = %e, "Embedding backend failed, using synthetic embeddings");
            Ok(pipeline.compute(paragraph, query, Variant::Educational)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DemoGemmaModel, EmbeddingModel, ProgressReporter};
    use async_trait::async_trait;
    use std::sync::Arc;
    use textgraph_core::config::BackendConfig;

    struct BrokenModel;

    #[async_trait]
    impl EmbeddingModel for BrokenModel {
        async fn load(&self, _progress: &ProgressReporter) -> Result<String, BackendError> {
            Err(BackendError::model("no runtime available"))
        }

        async fn embed_batch(
            &self,
            _texts: &[String],
            _task_type: TaskType,
        ) -> Result<Vec<Vec<f64>>, BackendError> {
            Err(BackendError::ModelNotLoaded)
        }

        fn dimensions(&self) -> usize {
            768
        }

        fn model_id(&self) -> &str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_backend_result_used_when_available() {
        let client = EmbeddingClient::spawn(
            Arc::new(DemoGemmaModel::default()),
            &BackendConfig::default(),
        );
        let pipeline = AttentionPipeline::default();
        let result = compute_with_fallback(
            &client,
            &pipeline,
            "graphs connect nodes with edges",
            "graph attention network",
        )
        .await
        .unwrap();
        assert_eq!(
            result.computation_details.method,
            "EmbeddingGemma Cosine Similarity"
        );
        assert_eq!(result.paragraph_tokens.len(), 5);
        assert_eq!(result.attention_matrix.size(), 3);
    }

    #[tokio::test]
    async fn test_falls_back_to_educational() {
        let client = EmbeddingClient::spawn(Arc::new(BrokenModel), &BackendConfig::default());
        let pipeline = AttentionPipeline::default();
        let result = compute_with_fallback(&client, &pipeline, "the cat sat", "cat sat")
            .await
            .unwrap();
        let expected = pipeline
            .compute("the cat sat", "cat sat", Variant::Educational)
            .unwrap();
        assert_eq!(result, expected);
        assert!(client.status().error.is_some());
    }

    #[tokio::test]
    async fn test_empty_query_is_not_retried() {
        let client = EmbeddingClient::spawn(Arc::new(BrokenModel), &BackendConfig::default());
        let pipeline = AttentionPipeline::default();
        let err = compute_with_fallback(&client, &pipeline, "text", "  ?! ")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Core(GatError::EmptyQuery)));
        assert_eq!(client.status().error, None);
    }
}

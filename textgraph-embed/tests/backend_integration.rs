use std::sync::Arc;

use pretty_assertions::assert_eq;
use textgraph_core::{AttentionPipeline, GatConfig, Variant, tokenize};
use textgraph_embed::{
    BackendStatus, DemoGemmaModel, EmbeddingClient, TaskType, compute_with_fallback,
};

fn client(config: &GatConfig) -> EmbeddingClient {
    let model = DemoGemmaModel::new(
        config.backend.model_id.clone(),
        config.backend.dimensions,
    );
    EmbeddingClient::spawn(Arc::new(model), &config.backend)
}

#[tokio::test]
async fn test_status_progresses_to_ready() {
    let config = GatConfig::default();
    let client = client(&config);
    assert_eq!(
        client.status(),
        BackendStatus::waiting(&config.backend.model_id, 768)
    );

    let device = client.initialize().await.unwrap();
    let status = client.status();
    assert_eq!(device, "demo");
    assert!(status.is_ready);
    assert!(!status.is_loading);
    assert_eq!(status.progress, 100);
    assert_eq!(status.device.as_deref(), Some("demo"));
}

#[tokio::test]
async fn test_backend_and_synthetic_share_query_tokens() {
    let config = GatConfig::default();
    let client = client(&config);
    let pipeline = AttentionPipeline::new(config.clone());
    let paragraph = "Graph attention networks weigh neighbouring nodes.";
    let query = "graph attention weighs nodes";

    let backend = compute_with_fallback(&client, &pipeline, paragraph, query)
        .await
        .unwrap();
    let synthetic = pipeline
        .compute(paragraph, query, Variant::Educational)
        .unwrap();

    assert_eq!(backend.query_tokens, tokenize(query));
    assert_eq!(backend.query_tokens, synthetic.query_tokens);
    assert_eq!(backend.paragraph_tokens, synthetic.paragraph_tokens);
    assert_eq!(backend.computation_details.dimensions, 768);
    for row in backend.attention_matrix.rows() {
        assert!(row.iter().all(|v| (0.0..=1.0).contains(v)));
    }
}

#[tokio::test]
async fn test_many_concurrent_requests_resolve_to_their_callers() {
    let config = GatConfig::default();
    let client = Arc::new(client(&config));

    let mut tasks = Vec::new();
    for word in ["alpha", "beta", "gamma", "delta", "epsilon", "zeta"] {
        let client = Arc::clone(&client);
        tasks.push(tokio::spawn(async move {
            let vectors = client
                .embed(vec![word.to_string()], TaskType::Document)
                .await
                .unwrap();
            (word, vectors)
        }));
    }

    let model = DemoGemmaModel::default();
    for task in tasks {
        let (word, vectors) = task.await.unwrap();
        assert_eq!(
            vectors,
            vec![model.semantic_embedding(word, TaskType::Document)]
        );
    }
    assert_eq!(client.pending_count(), 0);
}

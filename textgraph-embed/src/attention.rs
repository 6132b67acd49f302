//! Cosine-similarity attention over backend embeddings.

use textgraph_core::{
    AttentionMatrix, AttentionStats, ComputationDetails, ComputationResult, GatError,
    cosine_similarity,
};

use crate::error::BackendError;
use crate::protocol::TaskType;

/// Identity of the model that produced the embeddings.
#[derive(Debug, Clone)]
pub struct ModelInfo<'a> {
    pub model_id: &'a str,
    pub device: &'a str,
    pub task_type: TaskType,
}

/// Build an attention result where cell `[i][j]` is the cosine similarity of
/// tokens `i` and `j` mapped from `[-1, 1]` to `[0, 1]`; the diagonal is 0.
pub fn cosine_attention(
    tokens: Vec<String>,
    embeddings: &[Vec<f64>],
    info: &ModelInfo<'_>,
) -> Result<ComputationResult, BackendError> {
    let n = tokens.len();
    if embeddings.len() != n {
        return Err(GatError::TokenCountMismatch {
            tokens: n,
            embeddings: embeddings.len(),
        }
        .into());
    }
    let mut rows = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i != j {
                let similarity = cosine_similarity(&embeddings[i], &embeddings[j])?;
                rows[i][j] = (similarity + 1.0) / 2.0;
            }
        }
    }

    let matrix = AttentionMatrix::new(rows)?;
    let stats = AttentionStats::aggregate(&matrix, false);
    let details = ComputationDetails {
        method: "EmbeddingGemma Cosine Similarity".into(),
        dimensions: embeddings.first().map(Vec::len).unwrap_or(0),
        task_type: Some(info.task_type.as_str().to_string()),
        self_attention: false,
        matrix_size: format!("{n}x{n}"),
        non_zero_elements: matrix.non_zero_count(),
        embeddings: Some(embeddings.len()),
        model: Some(info.model_id.to_string()),
        device: Some(info.device.to_string()),
        ..Default::default()
    };

    Ok(ComputationResult::compose(
        tokens,
        matrix,
        stats,
        details,
        Vec::new(),
    ))
}

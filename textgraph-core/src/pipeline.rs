//! Attention pipeline and result composition.
//!
//! `tokenize -> embed -> score -> normalize -> aggregate`, run synchronously
//! per call. Every call builds its own embeddings, weights and matrices; the
//! pipeline itself only holds configuration and injected collaborators.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::GatConfig;
use crate::embedding::{FeatureEmbedder, LinearTransform, SimpleEmbedder, TokenEmbedder};
use crate::error::{GatError, Result};
use crate::matrix::AttentionMatrix;
use crate::scoring::{AttentionScorer, EducationalScorer, OriginalScorer};
use crate::softmax::SoftmaxNormalizer;
use crate::stats::AttentionStats;
use crate::tokenizer::tokenize;
use crate::trace::{NoopTrace, TraceEvent, TraceSink};

/// Which attention algorithm to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Dot-product GAT, no self-attention.
    Educational,
    /// Veličković-style concatenated-feature GAT, self-attention included.
    Original,
}

impl Variant {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "educational" => Some(Self::Educational),
            "original" => Some(Self::Original),
            _ => None,
        }
    }

    pub fn includes_self_attention(&self) -> bool {
        matches!(self, Self::Original)
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Educational => write!(f, "educational"),
            Self::Original => write!(f, "original"),
        }
    }
}

/// Metadata describing how a matrix was produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputationDetails {
    pub method: String,
    pub dimensions: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    pub self_attention: bool,
    pub matrix_size: String,
    pub non_zero_elements: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_matrix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attention_vector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

/// Output of one attention computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputationResult {
    pub query_tokens: Vec<String>,
    pub attention_matrix: AttentionMatrix,
    pub min_attention: f64,
    pub max_attention: f64,
    pub computation_details: ComputationDetails,
    /// Leading paragraph tokens, truncated for display.
    pub paragraph_tokens: Vec<String>,
}

impl ComputationResult {
    /// Assemble a result from a normalized matrix.
    pub fn compose(
        query_tokens: Vec<String>,
        attention_matrix: AttentionMatrix,
        stats: AttentionStats,
        computation_details: ComputationDetails,
        paragraph_tokens: Vec<String>,
    ) -> Self {
        Self {
            query_tokens,
            attention_matrix,
            min_attention: stats.min_attention,
            max_attention: stats.max_attention,
            computation_details,
            paragraph_tokens,
        }
    }

    pub fn stats(&self) -> AttentionStats {
        AttentionStats {
            min_attention: self.min_attention,
            max_attention: self.max_attention,
        }
    }
}

/// Both variants computed over the same tokenized query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DualComputationResult {
    pub query_tokens: Vec<String>,
    pub educational: ComputationResult,
    pub original: ComputationResult,
}

/// Runs attention computations with injected embedders and trace sink.
pub struct AttentionPipeline {
    config: GatConfig,
    embedder: Arc<dyn TokenEmbedder>,
    feature_embedder: Arc<dyn TokenEmbedder>,
    trace: Arc<dyn TraceSink>,
}

impl Default for AttentionPipeline {
    fn default() -> Self {
        Self::new(GatConfig::default())
    }
}

impl AttentionPipeline {
    pub fn new(config: GatConfig) -> Self {
        let embedder = Arc::new(SimpleEmbedder::from_config(&config.educational));
        let feature_embedder = Arc::new(FeatureEmbedder::new(config.original.input_dim));
        Self {
            config,
            embedder,
            feature_embedder,
            trace: Arc::new(NoopTrace),
        }
    }

    /// Replace the educational-variant embedder.
    pub fn with_embedder(mut self, embedder: Arc<dyn TokenEmbedder>) -> Self {
        self.embedder = embedder;
        self
    }

    /// Replace the node-feature generator of the original variant.
    pub fn with_feature_embedder(mut self, embedder: Arc<dyn TokenEmbedder>) -> Self {
        self.feature_embedder = embedder;
        self
    }

    pub fn with_trace(mut self, trace: Arc<dyn TraceSink>) -> Self {
        self.trace = trace;
        self
    }

    pub fn config(&self) -> &GatConfig {
        &self.config
    }

    /// Tokenize both texts and run `variant`.
    pub fn compute(
        &self,
        paragraph_text: &str,
        query_text: &str,
        variant: Variant,
    ) -> Result<ComputationResult> {
        let (paragraph, query) = self.tokenize_inputs(paragraph_text, query_text)?;
        match variant {
            Variant::Educational => self.compute_educational(&paragraph, query),
            Variant::Original => self.compute_original(&paragraph, query),
        }
    }

    /// Run both variants over one tokenization of the query.
    pub fn compute_dual(
        &self,
        paragraph_text: &str,
        query_text: &str,
    ) -> Result<DualComputationResult> {
        let (paragraph, query) = self.tokenize_inputs(paragraph_text, query_text)?;
        let educational = self.compute_educational(&paragraph, query.clone())?;
        let original = self.compute_original(&paragraph, query.clone())?;
        Ok(DualComputationResult {
            query_tokens: query,
            educational,
            original,
        })
    }

    /// Score caller-supplied embeddings (for example from a transformer
    /// backend) with the educational algorithm.
    pub fn compute_from_embeddings(
        &self,
        query_tokens: Vec<String>,
        embeddings: &[Vec<f64>],
    ) -> Result<ComputationResult> {
        if query_tokens.is_empty() {
            return Err(GatError::EmptyQuery);
        }
        if query_tokens.len() != embeddings.len() {
            return Err(GatError::TokenCountMismatch {
                tokens: query_tokens.len(),
                embeddings: embeddings.len(),
            });
        }
        for (i, (token, vector)) in query_tokens.iter().zip(embeddings).enumerate() {
            self.trace.record(&TraceEvent::embedded(i, token, vector));
        }

        let (matrix, stats) = self.run_educational(embeddings)?;
        let details = ComputationDetails {
            method: "Educational GAT (precomputed embeddings)".into(),
            dimensions: embeddings.first().map(Vec::len).unwrap_or(0),
            self_attention: false,
            matrix_size: matrix_size(query_tokens.len()),
            non_zero_elements: matrix.non_zero_count(),
            embeddings: Some(embeddings.len()),
            ..Default::default()
        };
        Ok(ComputationResult::compose(
            query_tokens,
            matrix,
            stats,
            details,
            Vec::new(),
        ))
    }

    fn tokenize_inputs(
        &self,
        paragraph_text: &str,
        query_text: &str,
    ) -> Result<(Vec<String>, Vec<String>)> {
        let paragraph = tokenize(paragraph_text);
        let query = tokenize(query_text);
        if query.is_empty() {
            return Err(GatError::EmptyQuery);
        }
        self.trace.record(&TraceEvent::Tokenized {
            query: query.clone(),
            paragraph: paragraph.clone(),
        });
        Ok((paragraph, query))
    }

    fn display_paragraph(&self, paragraph: &[String]) -> Vec<String> {
        paragraph
            .iter()
            .take(self.config.pipeline.paragraph_display_limit)
            .cloned()
            .collect()
    }

    fn embed_traced(
        &self,
        embedder: &dyn TokenEmbedder,
        query: &[String],
        paragraph: &[String],
    ) -> Vec<Vec<f64>> {
        let vectors = embedder.embed_tokens(query, paragraph);
        for (i, (token, vector)) in query.iter().zip(&vectors).enumerate() {
            self.trace.record(&TraceEvent::embedded(i, token, vector));
        }
        vectors
    }

    fn trace_scores(&self, scores: &[Vec<f64>]) {
        for (row, values) in scores.iter().enumerate() {
            for (col, raw) in values.iter().enumerate() {
                self.trace.record(&TraceEvent::Scored {
                    row,
                    col,
                    raw: *raw,
                });
            }
        }
    }

    fn finish(
        &self,
        raw: &[Vec<f64>],
        include_diagonal: bool,
    ) -> Result<(AttentionMatrix, AttentionStats)> {
        let softmax = SoftmaxNormalizer::from_config(&self.config.pipeline, !include_diagonal);
        let matrix = softmax.normalize_traced(raw, self.trace.as_ref())?;
        let stats = AttentionStats::aggregate(&matrix, include_diagonal);
        self.trace.record(&TraceEvent::Aggregated {
            min: stats.min_attention,
            max: stats.max_attention,
        });
        Ok((matrix, stats))
    }

    fn run_educational(
        &self,
        embeddings: &[Vec<f64>],
    ) -> Result<(AttentionMatrix, AttentionStats)> {
        let scorer = EducationalScorer::from_config(&self.config.educational);
        let scores = scorer.score(embeddings)?;
        self.trace_scores(&scores);
        self.finish(&scores, scorer.self_attention())
    }

    fn compute_educational(
        &self,
        paragraph: &[String],
        query: Vec<String>,
    ) -> Result<ComputationResult> {
        let embeddings = self.embed_traced(self.embedder.as_ref(), &query, paragraph);
        let (matrix, stats) = self.run_educational(&embeddings)?;

        tracing::debug!(
            tokens = query.len(),
            min = stats.min_attention,
            max = stats.max_attention,
            "Educational attention computed"
        );

        let details = ComputationDetails {
            method: "Educational GAT (dot-product attention)".into(),
            dimensions: self.embedder.dimensions(),
            self_attention: false,
            matrix_size: matrix_size(query.len()),
            non_zero_elements: matrix.non_zero_count(),
            embeddings: Some(embeddings.len()),
            ..Default::default()
        };
        Ok(ComputationResult::compose(
            query,
            matrix,
            stats,
            details,
            self.display_paragraph(paragraph),
        ))
    }

    fn compute_original(
        &self,
        paragraph: &[String],
        query: Vec<String>,
    ) -> Result<ComputationResult> {
        let cfg = &self.config.original;
        // Drawn fresh for every computation; only a fixed seed makes it repeatable.
        let w = LinearTransform::xavier(cfg.input_dim, cfg.hidden_dim, cfg.weight_seed);
        let scorer = OriginalScorer::from_config(cfg);

        let node_features = self.embed_traced(self.feature_embedder.as_ref(), &query, paragraph);
        let transformed = node_features
            .iter()
            .map(|h| w.apply(h))
            .collect::<Result<Vec<_>>>()?;

        let scores = scorer.score(&transformed)?;
        self.trace_scores(&scores);
        let (matrix, stats) = self.finish(&scores, scorer.self_attention())?;

        tracing::debug!(
            tokens = query.len(),
            min = stats.min_attention,
            max = stats.max_attention,
            "Original GAT attention computed"
        );

        let details = ComputationDetails {
            method: "Original GAT (Veličković et al.)".into(),
            dimensions: cfg.input_dim,
            self_attention: true,
            matrix_size: matrix_size(query.len()),
            non_zero_elements: matrix.non_zero_count(),
            features: Some(transformed.len()),
            weight_matrix: Some(format!("{}x{}", cfg.input_dim, cfg.hidden_dim)),
            attention_vector: Some(format!("{}D", scorer.attention().len())),
            ..Default::default()
        };
        Ok(ComputationResult::compose(
            query,
            matrix,
            stats,
            details,
            self.display_paragraph(paragraph),
        ))
    }
}

fn matrix_size(n: usize) -> String {
    format!("{n}x{n}")
}

/// Run one variant with the default configuration.
pub fn compute_attention(
    paragraph_text: &str,
    query_text: &str,
    variant: Variant,
) -> Result<ComputationResult> {
    AttentionPipeline::default().compute(paragraph_text, query_text, variant)
}

/// Run both variants with the default configuration.
pub fn compute_dual_attention(
    paragraph_text: &str,
    query_text: &str,
) -> Result<DualComputationResult> {
    AttentionPipeline::default().compute_dual(paragraph_text, query_text)
}

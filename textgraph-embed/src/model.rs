//! Embedding model abstraction and the built-in demo model.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::BackendError;
use crate::protocol::{BackendStatus, TaskType};

/// Publishes load progress into the shared [`BackendStatus`].
#[derive(Clone)]
pub struct ProgressReporter {
    status: Arc<watch::Sender<BackendStatus>>,
}

impl ProgressReporter {
    pub fn new(status: Arc<watch::Sender<BackendStatus>>) -> Self {
        Self { status }
    }

    /// Update the status message and, when given, the percentage.
    pub fn report(&self, message: impl Into<String>, progress: Option<u8>) {
        let message = message.into();
        tracing::debug!(%message, ?progress, "Backend progress");
        self.status.send_modify(|s| {
            s.status = message;
            if let Some(p) = progress {
                s.progress = p.min(100);
            }
        });
    }

    /// Record the execution device chosen by the model.
    pub fn device(&self, device: &str) {
        self.status
            .send_modify(|s| s.device = Some(device.to_string()));
    }
}

/// A text embedding model driven by the worker task.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Load weights and tokenizer. Returns the execution device name.
    async fn load(&self, progress: &ProgressReporter) -> Result<String, BackendError>;

    /// Embed one batch of texts; one vector per text.
    async fn embed_batch(
        &self,
        texts: &[String],
        task_type: TaskType,
    ) -> Result<Vec<Vec<f64>>, BackendError>;

    fn dimensions(&self) -> usize;

    fn model_id(&self) -> &str;
}

/// Deterministic stand-in for a sentence embedding model.
///
/// Each dimension mixes a character seed, word length, vowel density, a
/// query/document bias, and a 32-bit string hash, squashed with `tanh`.
#[derive(Debug, Clone)]
pub struct DemoGemmaModel {
    model_id: String,
    dimensions: usize,
}

impl DemoGemmaModel {
    pub fn new(model_id: impl Into<String>, dimensions: usize) -> Self {
        Self {
            model_id: model_id.into(),
            dimensions,
        }
    }

    pub fn semantic_embedding(&self, text: &str, task_type: TaskType) -> Vec<f64> {
        let clean: String = text
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace())
            .collect();
        let len = clean.chars().count();

        let seed: f64 = clean
            .chars()
            .enumerate()
            .map(|(i, c)| f64::from(u32::from(c)) * (i + 1) as f64)
            .sum();
        let vowels = clean.chars().filter(|c| "aeiou".contains(*c)).count();
        let vowel_density = if len > 0 {
            vowels as f64 / len as f64
        } else {
            0.0
        };
        let hash = f64::from(string_hash(&clean));
        let task_bias = match task_type {
            TaskType::Query => 0.15,
            TaskType::Document => -0.15,
        };

        (0..self.dimensions)
            .map(|d| {
                let k = (d + 1) as f64;
                let value = (seed * 0.001 * k).sin() * 0.3
                    + (seed * 0.002 * k).cos() * 0.2
                    + (len as f64 * 0.1 * k).sin() * 0.1
                    + (vowel_density * std::f64::consts::PI * k).sin() * 0.1
                    + task_bias * (k * 0.01).cos()
                    + (hash * 0.0001 * k).sin() * 0.15;
                value.tanh()
            })
            .collect()
    }
}

impl Default for DemoGemmaModel {
    fn default() -> Self {
        Self::new("onnx-community/embeddinggemma-300m-ONNX", 768)
    }
}

/// `h = h * 31 + c` over 32-bit wrapping arithmetic, absolute value.
fn string_hash(text: &str) -> u32 {
    text.chars()
        .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(u32::from(c) as i32))
        .unsigned_abs()
}

#[async_trait]
impl EmbeddingModel for DemoGemmaModel {
    async fn load(&self, progress: &ProgressReporter) -> Result<String, BackendError> {
        progress.report("Loading tokenizer...", Some(0));
        progress.device("demo");
        progress.report("Loading model (demo)...", Some(50));
        Ok("demo".to_string())
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        task_type: TaskType,
    ) -> Result<Vec<Vec<f64>>, BackendError> {
        Ok(texts
            .iter()
            .map(|t| self.semantic_embedding(t, task_type))
            .collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_hash_matches_java_style() {
        // "ab" = 97 * 31 + 98
        assert_eq!(string_hash("ab"), 3105);
        assert_eq!(string_hash(""), 0);
    }

    #[test]
    fn test_semantic_embedding_bounds() {
        let model = DemoGemmaModel::default();
        let v = model.semantic_embedding("attention", TaskType::Query);
        assert_eq!(v.len(), 768);
        assert!(v.iter().all(|x| *x > -1.0 && *x < 1.0));
    }

    #[test]
    fn test_task_type_changes_embedding() {
        let model = DemoGemmaModel::default();
        assert_ne!(
            model.semantic_embedding("graph", TaskType::Query),
            model.semantic_embedding("graph", TaskType::Document)
        );
    }

    #[test]
    fn test_non_letters_ignored() {
        let model = DemoGemmaModel::new("m", 16);
        assert_eq!(
            model.semantic_embedding("Graph-42!", TaskType::Document),
            model.semantic_embedding("graph", TaskType::Document)
        );
    }

    #[tokio::test]
    async fn test_load_reports_device() {
        let (tx, rx) = watch::channel(BackendStatus::waiting("m", 768));
        let reporter = ProgressReporter::new(Arc::new(tx));
        let device = DemoGemmaModel::default().load(&reporter).await.unwrap();
        assert_eq!(device, "demo");
        assert_eq!(rx.borrow().device.as_deref(), Some("demo"));
        assert_eq!(rx.borrow().progress, 50);
    }
}

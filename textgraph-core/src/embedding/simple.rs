//! Deterministic sinusoidal embedding for the educational variant.

use super::{TokenEmbedder, token_seed};
use crate::config::EducationalConfig;

/// Embedding derived only from token text and paragraph membership.
///
/// Values are not clamped; in practice they stay within `[-1, 1]`.
#[derive(Debug, Clone)]
pub struct SimpleEmbedder {
    dimensions: usize,
    context_bonus: f64,
}

impl Default for SimpleEmbedder {
    fn default() -> Self {
        Self::from_config(&EducationalConfig::default())
    }
}

impl SimpleEmbedder {
    pub fn new(dimensions: usize, context_bonus: f64) -> Self {
        Self {
            dimensions,
            context_bonus,
        }
    }

    pub fn from_config(config: &EducationalConfig) -> Self {
        Self::new(config.dimensions, config.context_bonus)
    }
}

impl TokenEmbedder for SimpleEmbedder {
    fn embed(&self, token: &str, _position: usize, context: &[String]) -> Vec<f64> {
        let seed = token_seed(token) as f64;
        let bonus = if context.iter().any(|c| c == token) {
            self.context_bonus
        } else {
            0.0
        };

        (0..self.dimensions)
            .map(|d| {
                let k = (d + 1) as f64;
                (seed * 0.01 * k).sin() * 0.5 + (seed * 0.02 * k).cos() * 0.3 + bonus
            })
            .collect()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "simple"
    }
}

//! Richer node features for the original GAT variant.
//!
//! Each dimension sums a lexical term, a contextual term (only when the token
//! occurs in the paragraph), a positional term, and a length term.

use super::{TokenEmbedder, token_seed};

#[derive(Debug, Clone)]
pub struct FeatureEmbedder {
    dimensions: usize,
}

impl Default for FeatureEmbedder {
    fn default() -> Self {
        Self::new(64)
    }
}

impl FeatureEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl TokenEmbedder for FeatureEmbedder {
    fn embed(&self, token: &str, position: usize, context: &[String]) -> Vec<f64> {
        let seed = token_seed(token) as f64;
        let context_index = context.iter().position(|c| c == token);
        let length = token.chars().count() as f64;
        let i = position as f64;

        (0..self.dimensions)
            .map(|d| {
                let k = (d + 1) as f64;
                let df = d as f64;

                let lexical = (seed * k * 0.01).sin() * 0.3 + (seed * k * 0.02).cos() * 0.2;
                let contextual = context_index
                    .map(|idx| ((seed + idx as f64) * 0.03).sin() * 0.2)
                    .unwrap_or(0.0);
                let positional = (i * 0.1 + df * 0.05).sin() * 0.1;
                let length_term = (length / 10.0) * (df * 0.04).cos();

                lexical + contextual + positional + length_term
            })
            .collect()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "features"
    }
}

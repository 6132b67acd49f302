//! Pairwise raw attention scores.
//!
//! Two interchangeable scorers:
//! - [`EducationalScorer`]: embedding dot product, LeakyReLU (slope 0.1),
//!   +0.3 for adjacent tokens, clamped at zero, self-attention fixed at 0.
//! - [`OriginalScorer`]: `e_ij = a . [Wh_i || Wh_j]` followed by LeakyReLU
//!   (slope 0.01), self-attention included.

use crate::config::{EducationalConfig, OriginalConfig};
use crate::embedding::attention_vector;
use crate::error::{GatError, Result};
use crate::similarity::{dot, leaky_relu};

/// Produces an `N x N` raw score matrix from per-token feature vectors.
pub trait AttentionScorer: Send + Sync {
    fn score(&self, features: &[Vec<f64>]) -> Result<Vec<Vec<f64>>>;

    /// Whether diagonal cells carry a real score.
    fn self_attention(&self) -> bool;
}

fn check_uniform(features: &[Vec<f64>]) -> Result<usize> {
    let dim = features.first().map(Vec::len).unwrap_or(0);
    if let Some(bad) = features.iter().find(|f| f.len() != dim) {
        return Err(GatError::dimension_mismatch(dim, bad.len()));
    }
    Ok(dim)
}

#[derive(Debug, Clone)]
pub struct EducationalScorer {
    leaky_slope: f64,
    adjacency_bonus: f64,
}

impl Default for EducationalScorer {
    fn default() -> Self {
        Self::from_config(&EducationalConfig::default())
    }
}

impl EducationalScorer {
    pub fn new(leaky_slope: f64, adjacency_bonus: f64) -> Self {
        Self {
            leaky_slope,
            adjacency_bonus,
        }
    }

    pub fn from_config(config: &EducationalConfig) -> Self {
        Self::new(config.leaky_slope, config.adjacency_bonus)
    }
}

impl AttentionScorer for EducationalScorer {
    fn score(&self, embeddings: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        check_uniform(embeddings)?;
        let n = embeddings.len();
        let mut scores = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let activated = leaky_relu(dot(&embeddings[i], &embeddings[j])?, self.leaky_slope);
                let bonus = if i.abs_diff(j) == 1 {
                    self.adjacency_bonus
                } else {
                    0.0
                };
                scores[i][j] = (activated + bonus).max(0.0);
            }
        }
        Ok(scores)
    }

    fn self_attention(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
pub struct OriginalScorer {
    attention: Vec<f64>,
    leaky_slope: f64,
}

impl Default for OriginalScorer {
    fn default() -> Self {
        Self::from_config(&OriginalConfig::default())
    }
}

impl OriginalScorer {
    pub fn new(attention: Vec<f64>, leaky_slope: f64) -> Self {
        Self {
            attention,
            leaky_slope,
        }
    }

    /// Uses the fixed attention vector of length `2 * hidden_dim`.
    pub fn from_config(config: &OriginalConfig) -> Self {
        Self::new(attention_vector(config.hidden_dim * 2), config.leaky_slope)
    }

    pub fn attention(&self) -> &[f64] {
        &self.attention
    }
}

impl AttentionScorer for OriginalScorer {
    fn score(&self, transformed: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        let dim = check_uniform(transformed)?;
        if !transformed.is_empty() && self.attention.len() != dim * 2 {
            return Err(GatError::dimension_mismatch(self.attention.len(), dim * 2));
        }

        Ok(transformed
            .iter()
            .map(|wh_i| {
                transformed
                    .iter()
                    .map(|wh_j| {
                        let e_ij: f64 = self
                            .attention
                            .iter()
                            .zip(wh_i.iter().chain(wh_j))
                            .map(|(a, x)| a * x)
                            .sum();
                        leaky_relu(e_ij, self.leaky_slope)
                    })
                    .collect()
            })
            .collect())
    }

    fn self_attention(&self) -> bool {
        true
    }
}

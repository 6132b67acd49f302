//! Simulated learnable parameters of the original GAT variant.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::WeightSeed;
use crate::error::{GatError, Result};

/// Weight matrix `W` of shape `output_dim x input_dim`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearTransform {
    weights: Vec<Vec<f64>>,
    input_dim: usize,
}

impl LinearTransform {
    /// Xavier-uniform initialization: every weight is drawn from
    /// `[-limit, limit)` with `limit = sqrt(6 / (input_dim + output_dim))`.
    pub fn xavier(input_dim: usize, output_dim: usize, seed: WeightSeed) -> Self {
        let mut rng = match seed {
            WeightSeed::Fixed(s) => StdRng::seed_from_u64(s),
            WeightSeed::Entropy => StdRng::from_entropy(),
        };
        let limit = (6.0 / (input_dim + output_dim).max(1) as f64).sqrt();

        let weights = (0..output_dim)
            .map(|_| {
                (0..input_dim)
                    .map(|_| {
                        if limit > 0.0 {
                            rng.gen_range(-limit..limit)
                        } else {
                            0.0
                        }
                    })
                    .collect()
            })
            .collect();

        Self { weights, input_dim }
    }

    /// Wrap an explicit weight matrix.
    pub fn from_weights(weights: Vec<Vec<f64>>) -> Result<Self> {
        let input_dim = weights.first().map(Vec::len).unwrap_or(0);
        for row in &weights {
            if row.len() != input_dim {
                return Err(GatError::dimension_mismatch(input_dim, row.len()));
            }
        }
        Ok(Self { weights, input_dim })
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn output_dim(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> &[Vec<f64>] {
        &self.weights
    }

    /// Compute `W h`.
    pub fn apply(&self, h: &[f64]) -> Result<Vec<f64>> {
        if h.len() != self.input_dim {
            return Err(GatError::dimension_mismatch(self.input_dim, h.len()));
        }
        Ok(self
            .weights
            .iter()
            .map(|row| row.iter().zip(h).map(|(w, x)| w * x).sum())
            .collect())
    }
}

/// Fixed attention vector `a` applied to `[Wh_i || Wh_j]`.
pub fn attention_vector(dim: usize) -> Vec<f64> {
    (0..dim)
        .map(|i| {
            let i = i as f64;
            (i * 0.1).sin() * 0.3 + (i * 0.05).cos() * 0.2
        })
        .collect()
}

//! Global attention range used by consumers for opacity mapping.

use serde::{Deserialize, Serialize};

use crate::matrix::AttentionMatrix;

/// `{ min, max }` over the qualifying cells of a normalized matrix.
///
/// The scan starts from `min = 1.0`, `max = 0.0`, so a matrix with no
/// qualifying cells yields the inverted range `(1.0, 0.0)`; see
/// [`AttentionStats::is_degenerate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttentionStats {
    pub min_attention: f64,
    pub max_attention: f64,
}

impl Default for AttentionStats {
    fn default() -> Self {
        Self {
            min_attention: 1.0,
            max_attention: 0.0,
        }
    }
}

impl AttentionStats {
    /// Scan `matrix`. With `include_diagonal == false`, zero cells (the
    /// masked diagonal) are ignored.
    pub fn aggregate(matrix: &AttentionMatrix, include_diagonal: bool) -> Self {
        matrix
            .rows()
            .iter()
            .flatten()
            .filter(|v| include_diagonal || **v > 0.0)
            .fold(Self::default(), |acc, &v| Self {
                min_attention: acc.min_attention.min(v),
                max_attention: acc.max_attention.max(v),
            })
    }

    /// `min > max`: nothing qualified, render flat.
    pub fn is_degenerate(&self) -> bool {
        self.min_attention > self.max_attention
    }

    pub fn range(&self) -> f64 {
        self.max_attention - self.min_attention
    }

    /// Map `value` into `[0, 1]` relative to the range, or `0.5` when the
    /// range is empty or inverted.
    pub fn scale(&self, value: f64) -> f64 {
        let range = self.range();
        if range > 0.0 {
            ((value - self.min_attention) / range).clamp(0.0, 1.0)
        } else {
            0.5
        }
    }
}

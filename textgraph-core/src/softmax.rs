//! Row-wise softmax normalization.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::matrix::{AttentionMatrix, check_square};
use crate::trace::{NoopTrace, TraceEvent, TraceSink};

/// Turns raw scores into per-row probability distributions.
///
/// When the diagonal is excluded it is masked out of the distribution and
/// reported as exactly `0.0`. A row whose exponentials sum to zero (every
/// participating score is `-inf`, or no cell participates) is degenerate and
/// passes through unnormalized.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftmaxNormalizer {
    round_to_one_decimal: bool,
    exclude_diagonal: bool,
}

impl SoftmaxNormalizer {
    pub fn new(round_to_one_decimal: bool, exclude_diagonal: bool) -> Self {
        Self {
            round_to_one_decimal,
            exclude_diagonal,
        }
    }

    pub fn from_config(config: &PipelineConfig, exclude_diagonal: bool) -> Self {
        Self::new(config.round_to_one_decimal, exclude_diagonal)
    }

    pub fn normalize(&self, raw: &[Vec<f64>]) -> Result<AttentionMatrix> {
        self.normalize_traced(raw, &NoopTrace)
    }

    /// Normalize every row, reporting each to `trace`.
    pub fn normalize_traced(
        &self,
        raw: &[Vec<f64>],
        trace: &dyn TraceSink,
    ) -> Result<AttentionMatrix> {
        check_square(raw)?;

        let rows = raw
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let (values, degenerate) = self.normalize_row(i, row);
                if degenerate {
                    tracing::debug!(row = i, "Softmax row summed to zero, keeping raw scores");
                }
                trace.record(&TraceEvent::Normalized {
                    row: i,
                    values: values.clone(),
                    degenerate,
                });
                values
            })
            .collect();

        Ok(AttentionMatrix::from_square(rows))
    }

    /// Normalize a single row; the flag is `true` for a degenerate row.
    pub fn normalize_row(&self, index: usize, row: &[f64]) -> (Vec<f64>, bool) {
        let masked = |j: usize| self.exclude_diagonal && j == index;

        let max = row
            .iter()
            .enumerate()
            .filter(|(j, _)| !masked(*j))
            .map(|(_, v)| *v)
            .fold(f64::NEG_INFINITY, f64::max);

        let exps: Vec<f64> = row
            .iter()
            .enumerate()
            .map(|(j, v)| {
                if masked(j) || !max.is_finite() {
                    0.0
                } else {
                    (v - max).exp()
                }
            })
            .collect();
        let sum: f64 = exps.iter().sum();

        let (values, degenerate) = if sum > 0.0 {
            (exps.iter().map(|e| e / sum).collect::<Vec<_>>(), false)
        } else {
            (row.to_vec(), true)
        };

        let values = values
            .into_iter()
            .enumerate()
            .map(|(j, v)| if masked(j) { 0.0 } else { self.round(v) })
            .collect();
        (values, degenerate)
    }

    fn round(&self, v: f64) -> f64 {
        if self.round_to_one_decimal {
            (v * 10.0).round() / 10.0
        } else {
            v
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_rows_sum_to_one() {
        let softmax = SoftmaxNormalizer::new(false, false);
        let m = softmax
            .normalize(&[vec![0.1, 2.0, -1.0], vec![0.0, 0.0, 0.0], vec![5.0, 1.0, 3.0]])
            .unwrap();
        for sum in m.row_sums() {
            assert_close(sum, 1.0);
        }
        assert_close(m.get(1, 1).unwrap(), 1.0 / 3.0);
    }

    #[test]
    fn test_matches_plain_exponentials() {
        let softmax = SoftmaxNormalizer::new(false, false);
        let m = softmax.normalize(&[vec![1.0, 2.0], vec![0.5, 0.5]]).unwrap();
        let e1 = 1.0f64.exp();
        let e2 = 2.0f64.exp();
        assert_close(m.get(0, 0).unwrap(), e1 / (e1 + e2));
        assert_close(m.get(0, 1).unwrap(), e2 / (e1 + e2));
    }

    #[test]
    fn test_excluded_diagonal_is_exact_zero() {
        let softmax = SoftmaxNormalizer::new(false, true);
        let m = softmax
            .normalize(&[vec![0.0, 0.4, 0.1], vec![0.4, 0.0, 0.7], vec![0.1, 0.7, 0.0]])
            .unwrap();
        for (i, sum) in m.row_sums().into_iter().enumerate() {
            assert_eq!(m.get(i, i), Some(0.0));
            assert_close(sum, 1.0);
        }
    }

    #[test]
    fn test_degenerate_row_falls_back_to_raw() {
        let softmax = SoftmaxNormalizer::new(false, false);
        let raw = vec![f64::NEG_INFINITY, f64::NEG_INFINITY];
        let (values, degenerate) = softmax.normalize_row(0, &raw);
        assert!(degenerate);
        assert_eq!(values, raw);
    }

    #[test]
    fn test_single_token_with_masked_diagonal_is_degenerate() {
        let softmax = SoftmaxNormalizer::new(false, true);
        let (values, degenerate) = softmax.normalize_row(0, &[0.0]);
        assert!(degenerate);
        assert_eq!(values, vec![0.0]);
    }

    #[test]
    fn test_rounding_to_one_decimal() {
        let softmax = SoftmaxNormalizer::new(true, false);
        let m = softmax.normalize(&[vec![0.0, 1.0], vec![0.0, 0.0]]).unwrap();
        // e / (1 + e) = 0.731.. -> 0.7
        assert_eq!(m.get(0, 1), Some(0.7));
        assert_eq!(m.get(0, 0), Some(0.3));
        assert_eq!(m.get(1, 0), Some(0.5));
    }

    #[test]
    fn test_large_scores_do_not_overflow() {
        let softmax = SoftmaxNormalizer::new(false, false);
        let m = softmax.normalize(&[vec![1000.0, 999.0], vec![0.0, 0.0]]).unwrap();
        assert!(m.rows().iter().flatten().all(|v| v.is_finite()));
        assert_close(m.row_sums()[0], 1.0);
    }

    #[test]
    fn test_ragged_input_rejected() {
        let softmax = SoftmaxNormalizer::default();
        assert!(softmax.normalize(&[vec![1.0, 2.0]]).is_err());
    }

    #[test]
    fn test_trace_records_every_row() {
        let sink = crate::trace::RecordingTrace::new();
        let softmax = SoftmaxNormalizer::new(false, true);
        softmax
            .normalize_traced(&[vec![0.0, 1.0], vec![1.0, 0.0]], &sink)
            .unwrap();
        assert_eq!(sink.len(), 2);
    }
}

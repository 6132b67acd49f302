//! Square attention matrix.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{GatError, Result};

/// Row-major `N x N` matrix; cell `[i][j]` is the attention token `i` pays to token `j`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AttentionMatrix(Vec<Vec<f64>>);

impl<'de> Deserialize<'de> for AttentionMatrix {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let rows = Vec::<Vec<f64>>::deserialize(deserializer)?;
        Self::new(rows).map_err(serde::de::Error::custom)
    }
}

impl AttentionMatrix {
    /// Wrap `rows`, rejecting non-square input.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        check_square(&rows)?;
        Ok(Self(rows))
    }

    pub(crate) fn from_square(rows: Vec<Vec<f64>>) -> Self {
        Self(rows)
    }

    /// Number of tokens (rows).
    pub fn size(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.0
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.0.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn row_sums(&self) -> Vec<f64> {
        self.0.iter().map(|r| r.iter().sum()).collect()
    }

    pub fn diagonal(&self) -> Vec<f64> {
        self.0.iter().enumerate().map(|(i, r)| r[i]).collect()
    }

    /// Strongest incoming attention per token (column maxima, floored at 0).
    pub fn column_max(&self) -> Vec<f64> {
        let n = self.size();
        (0..n)
            .map(|j| self.0.iter().map(|r| r[j]).fold(0.0, f64::max))
            .collect()
    }

    /// Cells strictly greater than zero.
    pub fn non_zero_count(&self) -> usize {
        self.0.iter().flatten().filter(|v| **v > 0.0).count()
    }

    pub fn into_inner(self) -> Vec<Vec<f64>> {
        self.0
    }
}

/// Verify every row has as many cells as there are rows.
pub fn check_square(rows: &[Vec<f64>]) -> Result<()> {
    let n = rows.len();
    for (i, row) in rows.iter().enumerate() {
        if row.len() != n {
            return Err(GatError::RaggedMatrix {
                row: i,
                expected: n,
                actual: row.len(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_ragged() {
        let err = AttentionMatrix::new(vec![vec![0.0, 1.0], vec![1.0]]).unwrap_err();
        assert!(matches!(
            err,
            GatError::RaggedMatrix {
                row: 1,
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_accessors() {
        let m = AttentionMatrix::new(vec![vec![0.0, 1.0], vec![0.25, 0.75]]).unwrap();
        assert_eq!(m.size(), 2);
        assert_eq!(m.get(1, 0), Some(0.25));
        assert_eq!(m.get(2, 0), None);
        assert_eq!(m.row_sums(), vec![1.0, 1.0]);
        assert_eq!(m.diagonal(), vec![0.0, 0.75]);
        assert_eq!(m.column_max(), vec![0.25, 1.0]);
        assert_eq!(m.non_zero_count(), 3);
    }

    #[test]
    fn test_serializes_as_nested_arrays() {
        let m = AttentionMatrix::new(vec![vec![0.5]]).unwrap();
        assert_eq!(serde_json::to_string(&m).unwrap(), "[[0.5]]");
    }

    #[test]
    fn test_deserialize_checks_squareness() {
        let m: AttentionMatrix = serde_json::from_str("[[0.0, 1.0], [1.0, 0.0]]").unwrap();
        assert_eq!(m.diagonal(), vec![0.0, 0.0]);

        let err = serde_json::from_str::<AttentionMatrix>("[[0.5], [0.5]]").unwrap_err();
        assert!(err.to_string().contains("row 0 has 1 cells"), "{err}");
        assert!(serde_json::from_str::<AttentionMatrix>("[[0.5, 0.5]]").is_err());
    }
}

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::math::stats::GridStats;

/// Lower clip bound for estimated cells, also the value painted over dead zones.
pub const MIN_RSSI_DBM: f64 = -100.0;
/// Upper clip bound for estimated cells.
pub const MAX_RSSI_DBM: f64 = -30.0;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("heatmap row {row} has {found} cells, expected {expected}")]
pub struct RaggedGridError {
    pub row: usize,
    pub expected: usize,
    pub found: usize,
}

/// Dense grid of estimated RSSI values, stored row-major as `(rows, cols)`.
///
/// Serialized as a list of rows so project files stay readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct CoverageGrid {
    values: Array2<f64>,
}

impl CoverageGrid {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            values: Array2::zeros((rows, cols)),
        }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, RaggedGridError> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        let mut flat = Vec::with_capacity(rows.len() * cols);
        for (row, values) in rows.iter().enumerate() {
            if values.len() != cols {
                return Err(RaggedGridError {
                    row,
                    expected: cols,
                    found: values.len(),
                });
            }
            flat.extend_from_slice(values);
        }
        let shape = (rows.len(), cols);
        let values = Array2::from_shape_vec(shape, flat).map_err(|_| RaggedGridError {
            row: 0,
            expected: cols,
            found: 0,
        })?;
        Ok(Self { values })
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.values.outer_iter().map(|row| row.to_vec()).collect()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut Array2<f64> {
        &mut self.values
    }

    /// Clamps every cell into `[MIN_RSSI_DBM, MAX_RSSI_DBM]`.
    pub fn clip(&mut self) {
        self.values
            .mapv_inplace(|v| v.clamp(MIN_RSSI_DBM, MAX_RSSI_DBM));
    }

    /// Cells strictly below `threshold_dbm`, in row-major order.
    pub fn cells_below(&self, threshold_dbm: f64) -> Vec<(usize, usize)> {
        self.values
            .indexed_iter()
            .filter(|(_, value)| **value < threshold_dbm)
            .map(|(index, _)| index)
            .collect()
    }

    pub fn stats(&self) -> Option<GridStats> {
        GridStats::from_view(self.values.view())
    }
}

impl TryFrom<Vec<Vec<f64>>> for CoverageGrid {
    type Error = RaggedGridError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self, Self::Error> {
        CoverageGrid::from_rows(rows)
    }
}

impl From<CoverageGrid> for Vec<Vec<f64>> {
    fn from(grid: CoverageGrid) -> Self {
        grid.to_rows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_bounds_every_cell() {
        let mut grid = CoverageGrid::from_rows(vec![vec![-250.0, -65.0], vec![12.0, -30.5]]).unwrap();
        grid.clip();
        assert_eq!(grid.to_rows(), vec![vec![-100.0, -65.0], vec![-30.0, -30.5]]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = CoverageGrid::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert_eq!(err.row, 1);
        assert!(CoverageGrid::from_rows(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn cells_below_is_strict() {
        let grid = CoverageGrid::from_rows(vec![vec![-80.0, -80.5], vec![-90.0, -40.0]]).unwrap();
        assert_eq!(grid.cells_below(-80.0), vec![(0, 1), (1, 0)]);
    }
}

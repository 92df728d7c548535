use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

/// Summary figures printed under "Heatmap Statistics".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl GridStats {
    pub fn from_view(values: ArrayView2<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mean = values.mean()?;
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Some(Self { mean, min, max })
    }
}

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Raster formats whose pixel size can be read; pdf and dwg are refused.
pub const FLOOR_PLAN_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

#[derive(thiserror::Error, Debug)]
pub enum FloorPlanError {
    #[error("unsupported floor plan format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to decode floor plan {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Floor plan backdrop; only its pixel size feeds the estimator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorPlan {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl FloorPlan {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FloorPlanError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if !FLOOR_PLAN_EXTENSIONS.contains(&extension.as_str()) {
            let label = if extension.is_empty() {
                "<none>".to_string()
            } else {
                extension
            };
            return Err(FloorPlanError::UnsupportedFormat(label));
        }

        let (width, height) =
            image::image_dimensions(path).map_err(|source| FloorPlanError::Decode {
                path: path.to_path_buf(),
                source,
            })?;
        log::info!(
            "floor plan {} loaded ({}x{})",
            path.display(),
            width,
            height
        );

        Ok(Self {
            path: path.to_path_buf(),
            width,
            height,
        })
    }

    pub fn from_dimensions(width: u32, height: u32) -> Self {
        Self {
            path: PathBuf::new(),
            width,
            height,
        }
    }

    /// Grid shape `(rows, cols)` at `resolution` pixels per tile.
    pub fn grid_shape(&self, resolution: u32) -> (usize, usize) {
        if resolution == 0 {
            return (0, 0);
        }
        (
            (self.height / resolution) as usize,
            (self.width / resolution) as usize,
        )
    }
}

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::coverage::CoverageGrid;
use crate::model::observation::NetworkObservation;
use crate::model::settings::ProjectSettings;

/// Extension used for saved survey projects.
pub const PROJECT_EXTENSION: &str = "wmp";

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("failed to access project {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed project {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// JSON document written by "Save Project".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProjectFile {
    #[serde(default)]
    pub scan_data: Vec<NetworkObservation>,
    #[serde(default, with = "optional_grid")]
    pub heatmap_data: Option<CoverageGrid>,
    #[serde(default)]
    pub settings: ProjectSettings,
}

/// Appends the project extension when `path` has none.
pub fn project_path(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(PROJECT_EXTENSION)
    }
}

impl ProjectFile {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ProjectError> {
        let path = path.as_ref();
        let body = serde_json::to_string(self).map_err(|source| ProjectError::Format {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, body).map_err(|source| ProjectError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("project saved to {}", path.display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ProjectError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ProjectError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ProjectError::Format {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// An absent grid is stored as an empty list rather than `null`.
mod optional_grid {
    use super::CoverageGrid;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        grid: &Option<CoverageGrid>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match grid {
            Some(grid) => grid.serialize(serializer),
            None => Vec::<Vec<f64>>::new().serialize(serializer),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<CoverageGrid>, D::Error> {
        let grid = CoverageGrid::deserialize(deserializer)?;
        Ok(if grid.is_empty() { None } else { Some(grid) })
    }
}

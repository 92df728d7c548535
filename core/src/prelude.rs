use serde::{Deserialize, Serialize};

use crate::math::stats::GridStats;
use crate::model::{CoverageGrid, FloorPlan, NetworkObservation};

/// Default tile edge in floor-plan pixels.
pub const DEFAULT_RESOLUTION: u32 = 50;
/// Cells strictly below this estimate are dead zones.
pub const DEAD_ZONE_THRESHOLD_DBM: f64 = -80.0;

/// Shared configuration for each processing stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    pub resolution: u32,
    pub dead_zone_threshold_dbm: f64,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            dead_zone_threshold_dbm: DEAD_ZONE_THRESHOLD_DBM,
        }
    }
}

/// Input payload for a processing stage.
#[derive(Debug, Clone, Default)]
pub struct StageInput {
    pub observations: Vec<NetworkObservation>,
    pub floor_plan: Option<FloorPlan>,
    pub grid: Option<CoverageGrid>,
}

/// Output produced by each stage.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub grid: CoverageGrid,
    pub metadata: StageMetadata,
}

/// Metadata used for chaining stages and telemetry.
#[derive(Debug, Clone, Default)]
pub struct StageMetadata {
    pub stats: Option<GridStats>,
    pub dead_zones: Vec<(usize, usize)>,
    pub notes: Vec<String>,
}

/// Common error type for stage execution.
#[derive(thiserror::Error, Debug)]
pub enum StageError {
    #[error("please load a floor plan first")]
    MissingFloorPlan,
    #[error("no scan data available; run a scan first")]
    MissingScanData,
    #[error("generate heatmap first")]
    MissingGrid,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type StageResult<T> = Result<T, StageError>;

/// Trait describing the coverage processing stages.
pub trait ProcessingStage {
    fn initialize(&mut self, config: &StageConfig) -> StageResult<()>;
    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput>;
    fn cleanup(&mut self);
}

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use wifimapcore::math::stats::GridStats;
use wifimapcore::model::{Band, FloorPlan, NetworkObservation, ProjectSettings};
use wifimapcore::telemetry::MetricsSnapshot;

/// Everything the visualizer renders, served from `GET /payload`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SurveyModel {
    pub observations: Vec<NetworkObservation>,
    /// Row-major RSSI grid; empty until a heatmap has been generated.
    pub heatmap: Vec<Vec<f64>>,
    pub dead_zones: Vec<(usize, usize)>,
    pub stats: Option<GridStats>,
    pub settings: ProjectSettings,
    pub floor_plan: Option<FloorPlan>,
    pub band: Band,
    pub resolution: u32,
    pub scan_progress: u8,
    pub status: String,
    pub metrics: MetricsSnapshot,
}

/// Body returned by every action endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionReply {
    pub status: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl ActionReply {
    pub fn ok(message: impl Into<String>, detail: Option<serde_json::Value>) -> Self {
        Self {
            status: "ok".into(),
            message: message.into(),
            detail,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".into(),
            message: message.into(),
            detail: None,
        }
    }
}

/// Body of `POST /floor-plan`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorPlanRequest {
    pub path: PathBuf,
}

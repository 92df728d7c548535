use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use wifimapcore::analysis::SimulationRequest;
use wifimapcore::model::Band;
use wifimapcore::prelude::{StageConfig, DEAD_ZONE_THRESHOLD_DBM, DEFAULT_RESOLUTION};
use wifimapcore::scan::DEFAULT_SETTLE;

/// Resolution bounds offered for the heatmap, in pixels per tile.
pub const RESOLUTION_RANGE: std::ops::RangeInclusive<u32> = 10..=100;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SurveyConfig {
    pub resolution: u32,
    pub band: Band,
    pub settle_ms: u64,
    pub rescan_interval_secs: u64,
    pub dead_zone_threshold_dbm: f64,
    pub seed: Option<u64>,
    pub bridge_addr: SocketAddr,
    pub simulation: SimulationRequest,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            band: Band::TwoPointFourGhz,
            settle_ms: DEFAULT_SETTLE.as_millis() as u64,
            rescan_interval_secs: 5,
            dead_zone_threshold_dbm: DEAD_ZONE_THRESHOLD_DBM,
            seed: None,
            bridge_addr: SocketAddr::from(([127, 0, 0, 1], 9000)),
            simulation: SimulationRequest::default(),
        }
    }
}

impl SurveyConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading survey config {}", path_ref.display()))?;
        let config: SurveyConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing survey config {}", path_ref.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            RESOLUTION_RANGE.contains(&self.resolution),
            "resolution {} outside {}..={}",
            self.resolution,
            RESOLUTION_RANGE.start(),
            RESOLUTION_RANGE.end()
        );
        ensure!(
            self.dead_zone_threshold_dbm.is_finite(),
            "dead zone threshold must be finite"
        );
        ensure!(
            self.rescan_interval_secs > 0,
            "rescan interval must be at least one second"
        );
        Ok(())
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn rescan_interval(&self) -> Duration {
        Duration::from_secs(self.rescan_interval_secs)
    }

    pub fn to_stage_config(&self) -> StageConfig {
        StageConfig {
            resolution: self.resolution,
            dead_zone_threshold_dbm: self.dead_zone_threshold_dbm,
        }
    }
}

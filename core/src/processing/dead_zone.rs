use crate::model::coverage::MIN_RSSI_DBM;
use crate::prelude::{
    ProcessingStage, StageConfig, StageError, StageInput, StageMetadata, StageOutput, StageResult,
};
use crate::telemetry::log::LogManager;

/// Flags weak cells and paints them at the floor so they stand out on redraw.
pub struct DeadZoneStage {
    config: Option<StageConfig>,
    logger: LogManager,
}

impl DeadZoneStage {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::new("dead-zones"),
        }
    }
}

impl Default for DeadZoneStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for DeadZoneStage {
    fn initialize(&mut self, config: &StageConfig) -> StageResult<()> {
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| StageError::Internal("stage not initialized".into()))?;
        let mut grid = match input.grid {
            Some(grid) if !grid.is_empty() => grid,
            _ => return Err(StageError::MissingGrid),
        };

        let threshold = config.dead_zone_threshold_dbm;
        let dead_zones = grid.cells_below(threshold);
        let values = grid.values_mut();
        for &cell in &dead_zones {
            values[cell] = MIN_RSSI_DBM;
        }

        let note = if dead_zones.is_empty() {
            "no dead zones detected".to_string()
        } else {
            format!(
                "found {} areas with weak signal (< {} dBm)",
                dead_zones.len(),
                threshold
            )
        };
        self.logger.record(&note);

        Ok(StageOutput {
            metadata: StageMetadata {
                stats: grid.stats(),
                dead_zones,
                notes: vec![note],
            },
            grid,
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}

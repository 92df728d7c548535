use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::math::pathloss::{free_space_path_loss, MAX_DISTANCE_M, MIN_DISTANCE_M};
use crate::model::CoverageGrid;
use crate::prelude::{
    ProcessingStage, StageConfig, StageError, StageInput, StageMetadata, StageOutput, StageResult,
};
use crate::telemetry::log::LogManager;

/// Coverage estimator turning scan results into a clipped RSSI grid.
///
/// Each (observation, cell) pair draws its own access-point distance, so the
/// output carries no spatial meaning. Seed the stage for repeatable grids.
pub struct HeatmapStage {
    config: Option<StageConfig>,
    rng: StdRng,
    logger: LogManager,
}

impl HeatmapStage {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            config: None,
            rng,
            logger: LogManager::new("heatmap"),
        }
    }
}

impl Default for HeatmapStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for HeatmapStage {
    fn initialize(&mut self, config: &StageConfig) -> StageResult<()> {
        if config.resolution == 0 {
            return Err(StageError::InvalidInput(
                "resolution must be at least one pixel".into(),
            ));
        }
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| StageError::Internal("stage not initialized".into()))?;
        let floor_plan = input.floor_plan.as_ref().ok_or(StageError::MissingFloorPlan)?;
        if input.observations.is_empty() {
            return Err(StageError::MissingScanData);
        }

        let (rows, cols) = floor_plan.grid_shape(config.resolution);
        let mut grid = CoverageGrid::zeros(rows, cols);

        for observation in &input.observations {
            let frequency_mhz = observation.frequency.mhz();
            if !(frequency_mhz > 0.0) {
                return Err(StageError::InvalidInput(format!(
                    "{} reports non-positive frequency {}",
                    observation.ssid, observation.frequency
                )));
            }
            let rssi = f64::from(observation.rssi);
            for cell in grid.values_mut().iter_mut() {
                let distance = self.rng.gen_range(MIN_DISTANCE_M..=MAX_DISTANCE_M);
                *cell += rssi - free_space_path_loss(distance, frequency_mhz);
            }
        }
        grid.clip();

        let stats = grid.stats();
        let note = match stats {
            Some(stats) => format!(
                "{}x{} cells from {} networks, mean {:.1} dBm",
                rows,
                cols,
                input.observations.len(),
                stats.mean
            ),
            None => format!("{}x{} cells (floor plan smaller than one tile)", rows, cols),
        };
        self.logger.record(&note);

        Ok(StageOutput {
            grid,
            metadata: StageMetadata {
                stats,
                notes: vec![note],
                ..Default::default()
            },
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::coverage::{MAX_RSSI_DBM, MIN_RSSI_DBM};
    use crate::model::{FloorPlan, Frequency, NetworkObservation};

    fn observation(rssi: i32, mhz: f64) -> NetworkObservation {
        NetworkObservation::new(
            "lab",
            "00:00:00:00:00:01",
            6,
            rssi,
            "WPA2",
            Frequency::from_mhz(mhz),
            0,
        )
    }

    fn run(
        width: u32,
        height: u32,
        resolution: u32,
        observations: Vec<NetworkObservation>,
    ) -> StageResult<StageOutput> {
        let mut stage = HeatmapStage::with_seed(7);
        stage.initialize(&StageConfig {
            resolution,
            ..Default::default()
        })?;
        let output = stage.execute(StageInput {
            observations,
            floor_plan: Some(FloorPlan::from_dimensions(width, height)),
            grid: None,
        });
        stage.cleanup();
        output
    }

    #[test]
    fn heatmap_shape_follows_floor_plan() {
        let cases = [(800, 600, 50), (1023, 767, 10), (99, 250, 100), (40, 40, 50)];
        for (width, height, resolution) in cases {
            let output = run(width, height, resolution, vec![observation(-40, 2437.0)]).unwrap();
            assert_eq!(
                output.grid.shape(),
                ((height / resolution) as usize, (width / resolution) as usize)
            );
        }
    }

    #[test]
    fn heatmap_cells_stay_within_clip_range() {
        let observations = vec![
            observation(-20, 2412.0),
            observation(40, 1.0),
            observation(-95, 5825.0),
            observation(i32::MIN / 2, 0.001),
        ];
        let output = run(300, 200, 10, observations).unwrap();
        assert!(output
            .grid
            .values()
            .iter()
            .all(|&v| (MIN_RSSI_DBM..=MAX_RSSI_DBM).contains(&v)));
    }

    #[test]
    fn strong_low_frequency_signal_saturates_at_ceiling() {
        // 1 MHz contributes no frequency term and distance loss tops out near 34 dB.
        let output = run(100, 100, 50, vec![observation(10, 1.0)]).unwrap();
        assert!(output.grid.values().iter().all(|&v| v == MAX_RSSI_DBM));
    }

    #[test]
    fn single_network_cells_span_the_distance_bounds() {
        let output = run(400, 300, 20, vec![observation(20, 1000.0)]).unwrap();
        // 60 dB at 1 m, about 94 dB at 50 m.
        let strongest = 20.0 - free_space_path_loss(MIN_DISTANCE_M, 1000.0);
        let weakest = 20.0 - free_space_path_loss(MAX_DISTANCE_M, 1000.0);
        assert!((strongest - -40.0).abs() < 1e-9);
        assert!((weakest - -73.979).abs() < 1e-3);

        let values = output.grid.values();
        assert_eq!(values.len(), 300);
        assert!(values
            .iter()
            .all(|&v| v >= weakest - 1e-9 && v <= strongest + 1e-9));
        let first = values[[0, 0]];
        assert!(values.iter().any(|&v| v != first));
    }

    #[test]
    fn contributions_add_in_observation_major_draw_order() {
        let networks = [(20, 1000.0), (50, 100.0)];
        let output = run(
            60,
            40,
            10,
            networks.iter().map(|&(rssi, mhz)| observation(rssi, mhz)).collect(),
        )
        .unwrap();
        let cells = 4 * 6;

        let mut rng = StdRng::seed_from_u64(7);
        let mut expected = vec![0.0f64; cells];
        for &(rssi, mhz) in &networks {
            for cell in expected.iter_mut() {
                let distance = rng.gen_range(MIN_DISTANCE_M..=MAX_DISTANCE_M);
                *cell += f64::from(rssi) - free_space_path_loss(distance, mhz);
            }
        }
        let expected: Vec<f64> = expected
            .into_iter()
            .map(|v| v.clamp(MIN_RSSI_DBM, MAX_RSSI_DBM))
            .collect();
        let actual: Vec<f64> = output.grid.values().iter().copied().collect();
        assert_eq!(actual, expected);

        // Drawing both networks per cell before moving on gives a different grid.
        let mut rng = StdRng::seed_from_u64(7);
        let cell_major: Vec<f64> = (0..cells)
            .map(|_| {
                networks
                    .iter()
                    .map(|&(rssi, mhz)| {
                        let distance = rng.gen_range(MIN_DISTANCE_M..=MAX_DISTANCE_M);
                        f64::from(rssi) - free_space_path_loss(distance, mhz)
                    })
                    .sum::<f64>()
                    .clamp(MIN_RSSI_DBM, MAX_RSSI_DBM)
            })
            .collect();
        assert_ne!(actual, cell_major);
    }

    #[test]
    fn seeded_stage_is_reproducible() {
        let first = run(500, 500, 50, vec![observation(-30, 2437.0)]).unwrap();
        let second = run(500, 500, 50, vec![observation(-30, 2437.0)]).unwrap();
        assert_eq!(first.grid, second.grid);
    }

    #[test]
    fn missing_inputs_short_circuit() {
        let err = run(100, 100, 10, Vec::new()).unwrap_err();
        assert!(matches!(err, StageError::MissingScanData));

        let mut stage = HeatmapStage::with_seed(1);
        stage.initialize(&StageConfig::default()).unwrap();
        let err = stage
            .execute(StageInput {
                observations: vec![observation(-50, 2437.0)],
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, StageError::MissingFloorPlan));
    }

    #[test]
    fn zero_resolution_is_rejected() {
        let mut stage = HeatmapStage::with_seed(1);
        let err = stage
            .initialize(&StageConfig {
                resolution: 0,
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, StageError::InvalidInput(_)));
    }
}

use crate::gui_bridge::model::SurveyModel;
use crate::workflow::config::{SurveyConfig, RESOLUTION_RANGE};
use anyhow::{bail, Context};
use log::{info, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;
use wifimapcore::analysis::{
    check_interference, optimize_channels, simulate_network, ChannelRecommendation,
    InterferenceReport, SimulationRequest, SimulationResult,
};
use wifimapcore::export::{export_report, ReportData, ReportFormat};
use wifimapcore::model::{
    project_path, CoverageGrid, FloorPlan, Language, NetworkObservation, ProjectFile,
    ProjectSettings, ThemeChoice,
};
use wifimapcore::prelude::{ProcessingStage, StageError, StageInput};
use wifimapcore::processing::{DeadZoneStage, HeatmapStage};
use wifimapcore::scan::{ScanError, ScanReport, ScanSource, Scanner};
use wifimapcore::telemetry::MetricsRecorder;

/// Partial update of the project settings; absent fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsUpdate {
    pub theme: Option<ThemeChoice>,
    pub language: Option<Language>,
    pub wifi6: Option<bool>,
    pub wpa3: Option<bool>,
    pub offline: Option<bool>,
}

/// Heatmap overrides for a single run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapRequest {
    pub resolution: Option<u32>,
    pub seed: Option<u64>,
}

/// Owns the whole survey state: settings, last scan, floor plan and grid.
pub struct Survey {
    config: SurveyConfig,
    settings: ProjectSettings,
    source: Option<Box<dyn ScanSource>>,
    observations: Vec<NetworkObservation>,
    floor_plan: Option<FloorPlan>,
    grid: Option<CoverageGrid>,
    /// Tile size the current grid was generated at.
    grid_resolution: Option<u32>,
    dead_zones: Vec<(usize, usize)>,
    scan_progress: u8,
    status: String,
    rng: StdRng,
    metrics: MetricsRecorder,
}

impl Survey {
    pub fn new(config: SurveyConfig, source: Option<Box<dyn ScanSource>>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let status = match &source {
            Some(source) => format!("Ready ({} scanner)", source.name()),
            None => "No scan adapter available; offline data only".to_string(),
        };
        Self {
            config,
            settings: ProjectSettings::default(),
            source,
            observations: Vec::new(),
            floor_plan: None,
            grid: None,
            grid_resolution: None,
            dead_zones: Vec::new(),
            scan_progress: 0,
            status,
            rng,
            metrics: MetricsRecorder::new(),
        }
    }

    pub fn config(&self) -> &SurveyConfig {
        &self.config
    }

    pub fn settings(&self) -> &ProjectSettings {
        &self.settings
    }

    pub fn observations(&self) -> &[NetworkObservation] {
        &self.observations
    }

    pub fn grid(&self) -> Option<&CoverageGrid> {
        self.grid.as_ref()
    }

    pub fn floor_plan(&self) -> Option<&FloorPlan> {
        self.floor_plan.as_ref()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Periodic rescans only run with a live source outside offline mode.
    pub fn can_scan(&self) -> bool {
        self.source.is_some() && !self.settings.offline
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
        info!("{}", self.status);
    }

    /// Routes a user action's outcome into the status line and error counter.
    fn track<T>(&mut self, result: anyhow::Result<T>) -> anyhow::Result<T> {
        if let Err(err) = &result {
            self.metrics.record_error();
            self.status = format!("{:#}", err);
            warn!("{}", self.status);
        }
        result
    }

    /// Replaces the network table with a fresh scan of every interface.
    pub fn scan(&mut self) -> anyhow::Result<ScanReport> {
        let result = self.scan_inner();
        self.track(result)
    }

    fn scan_inner(&mut self) -> anyhow::Result<ScanReport> {
        if self.settings.offline {
            return Err(ScanError::Offline.into());
        }
        let scanner = Scanner::new(self.config.band, self.config.settle());
        let source = self.source.as_mut().ok_or_else(|| {
            ScanError::AdapterUnavailable(
                "no wireless adapter backend; enable offline mode".to_string(),
            )
        })?;

        self.scan_progress = 0;
        let mut progress = 0;
        let report = scanner.run(source.as_mut(), |pct| progress = pct);
        self.scan_progress = progress;
        let report = match report {
            Ok(report) => report,
            Err(err) => {
                self.scan_progress = 0;
                return Err(err).context("network scan failed");
            }
        };

        self.observations = report.observations.clone();
        self.metrics.record_scan();
        self.set_status(format!(
            "Network scan completed: {} networks in {}",
            self.observations.len(),
            self.config.band
        ));
        Ok(report)
    }

    /// Opens a raster floor plan and redraws the heatmap when scan data exists.
    pub fn load_floor_plan<P: AsRef<Path>>(&mut self, path: P) -> anyhow::Result<()> {
        let result = FloorPlan::open(path.as_ref()).context("failed to load floor plan");
        let plan = self.track(result)?;
        self.settings.floor_plan = Some(plan.path.clone());
        self.set_status(format!("Floor plan loaded: {}", plan.path.display()));
        self.floor_plan = Some(plan);
        self.grid = None;
        self.dead_zones.clear();

        if !self.observations.is_empty() {
            self.generate_heatmap(HeatmapRequest::default())?;
        }
        Ok(())
    }

    pub fn generate_heatmap(&mut self, request: HeatmapRequest) -> anyhow::Result<&CoverageGrid> {
        let result = self.generate_heatmap_inner(request);
        self.track(result)?;
        self.grid
            .as_ref()
            .context("heatmap stage returned no grid")
    }

    fn generate_heatmap_inner(&mut self, request: HeatmapRequest) -> anyhow::Result<()> {
        let mut stage_config = self.config.to_stage_config();
        if let Some(resolution) = request.resolution {
            if !RESOLUTION_RANGE.contains(&resolution) {
                bail!(
                    "resolution {} outside {}..={}",
                    resolution,
                    RESOLUTION_RANGE.start(),
                    RESOLUTION_RANGE.end()
                );
            }
            stage_config.resolution = resolution;
        }
        let seed = request.seed.unwrap_or_else(|| self.rng.gen());

        let mut stage = HeatmapStage::with_seed(seed);
        stage
            .initialize(&stage_config)
            .context("initializing heatmap stage")?;
        let output = stage
            .execute(StageInput {
                observations: self.observations.clone(),
                floor_plan: self.floor_plan.clone(),
                grid: None,
            })
            .context("generating heatmap")?;
        stage.cleanup();

        self.grid = Some(output.grid);
        self.grid_resolution = Some(stage_config.resolution);
        self.dead_zones.clear();
        self.metrics.record_heatmap();
        let note = output.metadata.notes.join("; ");
        self.set_status(format!("Heatmap generated: {}", note));
        Ok(())
    }

    /// Flags cells under the threshold and paints them at the clip floor.
    pub fn detect_dead_zones(&mut self) -> anyhow::Result<usize> {
        let result = self.detect_dead_zones_inner();
        self.track(result)
    }

    fn detect_dead_zones_inner(&mut self) -> anyhow::Result<usize> {
        let mut stage = DeadZoneStage::new();
        stage
            .initialize(&self.config.to_stage_config())
            .context("initializing dead zone stage")?;
        let output = stage
            .execute(StageInput {
                grid: self.grid.clone(),
                ..Default::default()
            })
            .context("detecting dead zones")?;
        stage.cleanup();

        let count = output.metadata.dead_zones.len();
        self.grid = Some(output.grid);
        self.dead_zones = output.metadata.dead_zones;
        self.set_status(output.metadata.notes.join("; "));
        Ok(count)
    }

    pub fn optimize_channels(&mut self) -> ChannelRecommendation {
        let recommendation = optimize_channels(self.config.band, &self.observations);
        self.set_status(format!(
            "Recommended channel: {} (Least congested)",
            recommendation.channel
        ));
        recommendation
    }

    pub fn check_interference(&mut self) -> InterferenceReport {
        let report = check_interference(&self.observations, &mut self.rng);
        self.set_status(report.to_string().replace('\n', " "));
        report
    }

    pub fn simulate(&mut self, request: SimulationRequest) -> anyhow::Result<SimulationResult> {
        let result: anyhow::Result<SimulationResult> = if self.floor_plan.is_none() {
            Err(StageError::MissingFloorPlan.into())
        } else {
            simulate_network(request, &mut self.rng).context("network simulation failed")
        };
        let result = self.track(result)?;
        self.set_status(format!(
            "Simulation: {} behind {} walls, {:.1} Mbps",
            result.request.ap_model, result.request.wall_material, result.throughput_mbps
        ));
        Ok(result)
    }

    pub fn update_settings(&mut self, update: SettingsUpdate) {
        if let Some(theme) = update.theme {
            self.settings.theme = theme;
        }
        if let Some(wifi6) = update.wifi6 {
            self.settings.wifi6 = wifi6;
        }
        if let Some(wpa3) = update.wpa3 {
            self.settings.wpa3 = wpa3;
        }
        if let Some(offline) = update.offline {
            self.settings.offline = offline;
        }
        match update.language {
            Some(language) => {
                self.settings.language = language;
                let catalog = language.translation_file();
                if Path::new(&catalog).exists() {
                    self.set_status(format!("Language set to {}", language));
                } else {
                    self.set_status(format!("Translation file {} not found", catalog));
                }
            }
            None => self.set_status("Settings updated"),
        }
    }

    pub fn export_report(&mut self, path: &Path) -> anyhow::Result<ReportFormat> {
        let data = ReportData::new(&self.observations, self.grid.as_ref());
        let result = export_report(path, &data, &mut self.rng)
            .with_context(|| format!("exporting report to {}", path.display()));
        let format = self.track(result)?;
        self.set_status(format!("Report exported to {}", path.display()));
        Ok(format)
    }

    pub fn to_project(&self) -> ProjectFile {
        ProjectFile {
            scan_data: self.observations.clone(),
            heatmap_data: self.grid.clone(),
            settings: self.settings.clone(),
        }
    }

    pub fn save_project(&mut self, path: &Path) -> anyhow::Result<()> {
        let path = project_path(path);
        let result = self
            .to_project()
            .save(&path)
            .context("failed to save project");
        self.track(result)?;
        self.set_status(format!("Project saved to {}", path.display()));
        Ok(())
    }

    /// Restores settings, scan data and grid. A floor plan that no longer opens
    /// is reported but does not fail the load.
    pub fn load_project(&mut self, path: &Path) -> anyhow::Result<()> {
        let result = ProjectFile::load(path).context("failed to load project");
        let project = self.track(result)?;

        self.observations = project.scan_data;
        self.grid = project.heatmap_data;
        self.grid_resolution = None;
        self.dead_zones.clear();
        self.settings = project.settings;
        self.floor_plan = None;
        if let Some(plan_path) = self.settings.floor_plan.clone() {
            match FloorPlan::open(&plan_path) {
                Ok(plan) => self.floor_plan = Some(plan),
                Err(err) => warn!("project floor plan {} unavailable: {}", plan_path.display(), err),
            }
        }
        self.set_status(format!("Project loaded from {}", path.display()));
        Ok(())
    }

    pub fn snapshot(&self) -> SurveyModel {
        SurveyModel {
            observations: self.observations.clone(),
            heatmap: self.grid.as_ref().map(CoverageGrid::to_rows).unwrap_or_default(),
            dead_zones: self.dead_zones.clone(),
            stats: self.grid.as_ref().and_then(CoverageGrid::stats),
            settings: self.settings.clone(),
            floor_plan: self.floor_plan.clone(),
            band: self.config.band,
            resolution: self
                .grid
                .as_ref()
                .and(self.grid_resolution)
                .unwrap_or(self.config.resolution),
            scan_progress: self.scan_progress,
            status: self.status.clone(),
            metrics: self.metrics.snapshot(),
        }
    }
}

use anyhow::Context;
use clap::{Parser, Subcommand};
use generator::synthetic::{GeneratorConfig, SyntheticSource};
use gui_bridge::bridge::{GuiBridge, SharedSurvey};
use log::warn;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use wifimapcore::analysis::{ApModel, SimulationRequest, WallMaterial};
use wifimapcore::model::{Band, Language, NetworkObservation, ThemeChoice};
use wifimapcore::scan::{FixtureSource, NetworkManagerSource, ScanSource};
use workflow::config::SurveyConfig;
use workflow::runner::{HeatmapRequest, SettingsUpdate, Survey};

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "WiFi site survey driver")]
struct Args {
    /// Load survey defaults from YAML
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Open a saved .wmp project before running the command
    #[arg(long, global = true)]
    project: Option<PathBuf>,
    /// Floor plan image (png, jpg or jpeg)
    #[arg(long, global = true)]
    floor_plan: Option<PathBuf>,
    /// Replay a recorded scan instead of querying the adapter
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,
    /// Scan a synthetic environment with this many access points
    #[arg(long, global = true)]
    synthetic: Option<usize>,
    #[arg(long, global = true)]
    band: Option<Band>,
    /// Disable scanning and work from project data only
    #[arg(long, global = true, default_value_t = false)]
    offline: bool,
    /// Save the session as a .wmp project on exit
    #[arg(long, global = true)]
    save: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Scan every wireless interface and print the network table
    Scan,
    /// Estimate the coverage grid over the floor plan
    Heatmap {
        #[arg(long)]
        resolution: Option<u32>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Flag grid cells below the dead zone threshold
    DeadZones,
    /// Recommend the least congested channel in the band
    Optimize,
    /// List strong neighbours and likely non-WiFi sources
    Interference,
    /// Estimate range and throughput for an access point model
    Simulate {
        #[arg(long)]
        ap_model: Option<ApModel>,
        #[arg(long)]
        wall: Option<WallMaterial>,
        #[arg(long)]
        devices: Option<u32>,
    },
    /// Write a CSV, PDF or KMZ report chosen by extension
    Export { path: PathBuf },
    /// Change project settings
    Settings {
        #[arg(long)]
        theme: Option<ThemeChoice>,
        #[arg(long)]
        language: Option<Language>,
        #[arg(long)]
        wifi6: Option<bool>,
        #[arg(long)]
        wpa3: Option<bool>,
    },
    /// Keep the HTTP bridge alive for the visualizer
    Serve,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SurveyConfig::load(path)?,
        None => SurveyConfig::default(),
    };
    if let Some(band) = args.band {
        config.band = band;
    }
    config.validate().context("invalid survey configuration")?;

    let source = select_source(&args, &config)?;
    let mut survey = Survey::new(config, source);

    if let Some(path) = &args.project {
        survey.load_project(path)?;
    }
    if args.offline {
        survey.update_settings(SettingsUpdate {
            offline: Some(true),
            ..Default::default()
        });
    }
    if let Some(path) = &args.floor_plan {
        survey.load_floor_plan(path)?;
    }

    match args.command.unwrap_or(Command::Scan) {
        Command::Scan => {
            survey.scan()?;
            print_networks(survey.observations());
        }
        Command::Heatmap { resolution, seed } => {
            ensure_scan(&mut survey)?;
            let (rows, cols) = survey
                .generate_heatmap(HeatmapRequest { resolution, seed })?
                .shape();
            println!("Heatmap {}x{} cells", rows, cols);
            print_grid_stats(&survey);
        }
        Command::DeadZones => {
            ensure_scan(&mut survey)?;
            if survey.grid().is_none() {
                survey.generate_heatmap(HeatmapRequest::default())?;
            }
            survey.detect_dead_zones()?;
            println!("{}", survey.status());
            for (row, col) in &survey.snapshot().dead_zones {
                println!("  cell ({}, {})", row, col);
            }
        }
        Command::Optimize => {
            ensure_scan(&mut survey)?;
            let recommendation = survey.optimize_channels();
            for (channel, count) in &recommendation.occupancy {
                println!("  channel {:>3}: {} networks", channel, count);
            }
            println!(
                "Recommended channel: {} (Least congested)",
                recommendation.channel
            );
        }
        Command::Interference => {
            ensure_scan(&mut survey)?;
            println!("{}", survey.check_interference());
        }
        Command::Simulate {
            ap_model,
            wall,
            devices,
        } => {
            let defaults = survey.config().simulation;
            let request = SimulationRequest {
                ap_model: ap_model.unwrap_or(defaults.ap_model),
                wall_material: wall.unwrap_or(defaults.wall_material),
                device_count: devices.unwrap_or(defaults.device_count),
            };
            println!("{}", survey.simulate(request)?);
        }
        Command::Export { path } => {
            ensure_scan(&mut survey)?;
            let format = survey.export_report(&path)?;
            println!("{:?} report written to {}", format, path.display());
        }
        Command::Settings {
            theme,
            language,
            wifi6,
            wpa3,
        } => {
            survey.update_settings(SettingsUpdate {
                theme,
                language,
                wifi6,
                wpa3,
                offline: None,
            });
            println!("{}", survey.status());
            println!("{}", serde_json::to_string_pretty(survey.settings())?);
        }
        Command::Serve => {
            let addr = survey.config().bridge_addr;
            let rescan = survey.config().rescan_interval();
            let shared: SharedSurvey = Arc::new(Mutex::new(survey));
            let bridge = GuiBridge::new(shared.clone());
            bridge.serve(addr, rescan)?;
            bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");

            let runtime = TokioBuilder::new_current_thread()
                .enable_all()
                .build()
                .context("creating runtime for signal handling")?;
            runtime.block_on(async {
                signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
                Ok::<(), anyhow::Error>(())
            })?;

            let mut survey = shared.lock().unwrap_or_else(PoisonError::into_inner);
            return save_if_requested(&mut survey, args.save.as_deref());
        }
    }

    save_if_requested(&mut survey, args.save.as_deref())
}

/// Picks the scan backend: fixture, then synthetic, then the system adapter.
fn select_source(
    args: &Args,
    config: &SurveyConfig,
) -> anyhow::Result<Option<Box<dyn ScanSource>>> {
    if let Some(path) = &args.fixture {
        let source = FixtureSource::load(path).context("loading scan fixture")?;
        return Ok(Some(Box::new(source)));
    }
    if let Some(networks) = args.synthetic {
        let source = SyntheticSource::new(GeneratorConfig {
            networks,
            band: config.band,
            seed: config.seed.unwrap_or_default(),
            ..Default::default()
        });
        return Ok(Some(Box::new(source)));
    }
    match NetworkManagerSource::detect() {
        Ok(source) => Ok(Some(Box::new(source))),
        Err(err) => {
            warn!("{}; continuing without live scans", err);
            Ok(None)
        }
    }
}

/// Analysis commands scan first unless a project already supplied networks.
fn ensure_scan(survey: &mut Survey) -> anyhow::Result<()> {
    if survey.observations().is_empty() && survey.can_scan() {
        survey.scan()?;
    }
    Ok(())
}

fn save_if_requested(survey: &mut Survey, path: Option<&Path>) -> anyhow::Result<()> {
    if let Some(path) = path {
        survey.save_project(path)?;
        println!("{}", survey.status());
    }
    Ok(())
}

fn print_networks(observations: &[NetworkObservation]) {
    println!(
        "{:<24} {:<17} {:>4} {:>5} {:<12} {:>10} {:>4}",
        "SSID", "BSSID", "CH", "RSSI", "SECURITY", "FREQUENCY", "SNR"
    );
    for obs in observations {
        println!(
            "{:<24} {:<17} {:>4} {:>5} {:<12} {:>10} {:>4}",
            obs.ssid,
            obs.bssid,
            obs.channel,
            obs.rssi,
            obs.security,
            obs.frequency.to_string(),
            obs.snr
        );
    }
    println!("{} networks", observations.len());
}

fn print_grid_stats(survey: &Survey) {
    match survey.grid().and_then(|grid| grid.stats()) {
        Some(stats) => println!(
            "Average RSSI: {:.1} dBm, min {:.1} dBm, max {:.1} dBm",
            stats.mean, stats.min, stats.max
        ),
        None => println!("Heatmap is empty; the floor plan is smaller than one tile"),
    }
}

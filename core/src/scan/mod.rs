//! Wireless scan sources and the scanner that turns their raw profiles into
//! network table rows.

pub mod fixture;
pub mod networkmanager;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use crate::model::observation::{derive_snr, OPEN_SECURITY};
use crate::model::{Band, Frequency, NetworkObservation};
use crate::telemetry::log::LogManager;

pub use fixture::FixtureSource;
pub use networkmanager::NetworkManagerSource;

/// Time given to an adapter between triggering a scan and reading results.
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(2);

#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("scanning disabled in offline mode")]
    Offline,
    #[error("WiFi scanning unavailable: {0}")]
    AdapterUnavailable(String),
    #[error("no wireless interfaces found")]
    NoInterfaces,
    #[error("scan on {interface} failed: {message}")]
    Interface { interface: String, message: String },
    #[error("failed to read scan fixture {path}: {source}")]
    FixtureIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed scan fixture {path}: {source}")]
    FixtureFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Raw access-point record as reported by an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanProfile {
    #[serde(default)]
    pub ssid: String,
    pub bssid: String,
    #[serde(default)]
    pub channel: Option<u32>,
    /// Signal strength in dBm.
    pub signal: i32,
    #[serde(default)]
    pub noise: Option<i32>,
    pub freq_hz: u64,
    #[serde(default)]
    pub auth: Option<String>,
}

impl ScanProfile {
    pub fn frequency(&self) -> Frequency {
        Frequency::from_hz(self.freq_hz)
    }

    pub fn to_observation(&self) -> NetworkObservation {
        NetworkObservation::new(
            &self.ssid,
            &self.bssid,
            self.channel.unwrap_or(0),
            self.signal,
            self.auth.as_deref().unwrap_or(OPEN_SECURITY),
            self.frequency(),
            derive_snr(self.signal, self.noise),
        )
    }
}

/// Adapter collaborator queried by the [`Scanner`].
pub trait ScanSource: Send {
    fn name(&self) -> &str;
    fn interfaces(&mut self) -> Result<Vec<String>, ScanError>;
    /// Starts a scan; results are read after the settle delay.
    fn trigger(&mut self, interface: &str) -> Result<(), ScanError>;
    fn results(&mut self, interface: &str) -> Result<Vec<ScanProfile>, ScanError>;
}

/// Outcome of one scan cycle across every interface.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub observations: Vec<NetworkObservation>,
    pub interfaces: usize,
    pub failures: Vec<String>,
}

pub struct Scanner {
    band: Band,
    settle: Duration,
    logger: LogManager,
}

impl Scanner {
    pub fn new(band: Band, settle: Duration) -> Self {
        Self {
            band,
            settle,
            logger: LogManager::new("scanner"),
        }
    }

    /// Scans every interface in turn, blocking for the settle delay on each.
    ///
    /// A failing interface is recorded and skipped. `on_progress` receives the
    /// completed percentage after each interface.
    pub fn run(
        &self,
        source: &mut dyn ScanSource,
        mut on_progress: impl FnMut(u8),
    ) -> Result<ScanReport, ScanError> {
        let interfaces = source.interfaces()?;
        if interfaces.is_empty() {
            return Err(ScanError::NoInterfaces);
        }

        let total = interfaces.len();
        let mut report = ScanReport {
            interfaces: total,
            ..Default::default()
        };

        for (index, interface) in interfaces.iter().enumerate() {
            match self.scan_interface(source, interface) {
                Ok(observations) => report.observations.extend(observations),
                Err(err) => {
                    self.logger
                        .warn(&format!("error scanning interface {}: {}", index, err));
                    report.failures.push(err.to_string());
                }
            }
            on_progress(((index + 1) * 100 / total) as u8);
        }

        self.logger.record(&format!(
            "{} networks in {} on {} via {}",
            report.observations.len(),
            self.band,
            total,
            source.name()
        ));
        Ok(report)
    }

    fn scan_interface(
        &self,
        source: &mut dyn ScanSource,
        interface: &str,
    ) -> Result<Vec<NetworkObservation>, ScanError> {
        source.trigger(interface)?;
        if !self.settle.is_zero() {
            thread::sleep(self.settle);
        }
        let profiles = source.results(interface)?;
        Ok(profiles
            .iter()
            .filter(|profile| self.band.contains(profile.frequency()))
            .map(ScanProfile::to_observation)
            .collect())
    }
}

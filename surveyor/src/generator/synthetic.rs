use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use wifimapcore::model::Band;
use wifimapcore::scan::{ScanError, ScanProfile, ScanSource};

const SECURITY_SUITES: [&str; 4] = ["WPA2", "WPA3", "WPA2 WPA3", "Open"];

/// Configuration for generating a synthetic radio environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub networks: usize,
    pub band: Band,
    pub seed: u64,
    pub noise_floor_dbm: i32,
    /// Fraction of access points that hide their SSID.
    pub hidden_ratio: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            networks: 8,
            band: Band::TwoPointFourGhz,
            seed: 0,
            noise_floor_dbm: -95,
            hidden_ratio: 0.1,
        }
    }
}

struct AccessPoint {
    ssid: String,
    bssid: String,
    channel: u32,
    base_signal: i32,
    auth: Option<String>,
}

/// Scan source that invents a stable set of access points and jitters their
/// signal on every scan.
pub struct SyntheticSource {
    config: GeneratorConfig,
    access_points: Vec<AccessPoint>,
    rng: StdRng,
}

impl SyntheticSource {
    pub fn new(config: GeneratorConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let access_points = (0..config.networks)
            .map(|index| {
                let hidden = rng.gen_bool(config.hidden_ratio.clamp(0.0, 1.0));
                let octets: Vec<String> = (0..6)
                    .map(|_| format!("{:02x}", rng.gen::<u8>()))
                    .collect();
                let channel = config
                    .band
                    .candidate_channels()
                    .choose(&mut rng)
                    .copied()
                    .unwrap_or(1);
                let auth = SECURITY_SUITES
                    .choose(&mut rng)
                    .filter(|suite| **suite != "Open")
                    .map(|suite| suite.to_string());
                AccessPoint {
                    ssid: if hidden {
                        String::new()
                    } else {
                        format!("synthetic-{:02}", index)
                    },
                    bssid: octets.join(":"),
                    channel,
                    base_signal: rng.gen_range(-88..=-38),
                    auth,
                }
            })
            .collect();

        Self {
            config,
            access_points,
            rng,
        }
    }
}

impl ScanSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn interfaces(&mut self) -> Result<Vec<String>, ScanError> {
        Ok(vec!["synthetic0".into()])
    }

    fn trigger(&mut self, _interface: &str) -> Result<(), ScanError> {
        Ok(())
    }

    fn results(&mut self, _interface: &str) -> Result<Vec<ScanProfile>, ScanError> {
        let band = self.config.band;
        let noise_floor = self.config.noise_floor_dbm;
        let rng = &mut self.rng;
        Ok(self
            .access_points
            .iter()
            .map(|ap| ScanProfile {
                ssid: ap.ssid.clone(),
                bssid: ap.bssid.clone(),
                channel: Some(ap.channel),
                signal: ap.base_signal + rng.gen_range(-3..=3),
                noise: Some(noise_floor + rng.gen_range(-2..=2)),
                freq_hz: (band.channel_frequency(ap.channel).mhz() * 1_000_000.0) as u64,
                auth: ap.auth.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wifimapcore::scan::Scanner;

    #[test]
    fn generator_builds_expected_network_count() {
        let mut source = SyntheticSource::new(GeneratorConfig {
            networks: 12,
            ..Default::default()
        });
        let report = Scanner::new(Band::TwoPointFourGhz, Duration::ZERO)
            .run(&mut source, |_| {})
            .unwrap();
        assert_eq!(report.observations.len(), 12);
        assert!(report
            .observations
            .iter()
            .all(|obs| [1, 6, 11].contains(&obs.channel) && obs.snr > 0));
    }

    #[test]
    fn generator_seed_fixes_the_environment() {
        let config = GeneratorConfig {
            networks: 4,
            band: Band::FiveGhz,
            seed: 13,
            ..Default::default()
        };
        let mut first = SyntheticSource::new(config.clone());
        let mut second = SyntheticSource::new(config);
        assert_eq!(
            first.results("synthetic0").unwrap(),
            second.results("synthetic0").unwrap()
        );
    }
}

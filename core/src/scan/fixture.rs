use std::fs;
use std::path::{Path, PathBuf};

use super::{ScanError, ScanProfile, ScanSource};

/// Replays a recorded scan from a JSON list of profiles on one virtual interface.
pub struct FixtureSource {
    path: PathBuf,
    profiles: Vec<ScanProfile>,
}

impl FixtureSource {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScanError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ScanError::FixtureIo {
            path: path.to_path_buf(),
            source,
        })?;
        let profiles =
            serde_json::from_str(&contents).map_err(|source| ScanError::FixtureFormat {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            profiles,
        })
    }

    pub fn from_profiles(profiles: Vec<ScanProfile>) -> Self {
        Self {
            path: PathBuf::from("<memory>"),
            profiles,
        }
    }
}

impl ScanSource for FixtureSource {
    fn name(&self) -> &str {
        "fixture"
    }

    fn interfaces(&mut self) -> Result<Vec<String>, ScanError> {
        Ok(vec![self.path.display().to_string()])
    }

    fn trigger(&mut self, _interface: &str) -> Result<(), ScanError> {
        Ok(())
    }

    fn results(&mut self, _interface: &str) -> Result<Vec<ScanProfile>, ScanError> {
        Ok(self.profiles.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Band;
    use crate::scan::Scanner;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    #[test]
    fn fixture_load_reads_profiles() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            br#"[{"ssid":"home","bssid":"00:11:22:33:44:55","channel":11,"signal":-47,"noise":-90,"freq_hz":2462000000,"auth":"WPA2"},
                 {"bssid":"00:11:22:33:44:56","signal":-81,"freq_hz":2412000000}]"#,
        )
        .unwrap();

        let mut source = FixtureSource::load(temp.path()).unwrap();
        let report = Scanner::new(Band::TwoPointFourGhz, Duration::ZERO)
            .run(&mut source, |_| {})
            .unwrap();
        assert_eq!(report.observations.len(), 2);
        assert_eq!(report.observations[0].snr, 43);
        assert_eq!(report.observations[1].channel, 0);
        assert_eq!(report.observations[1].ssid, "Hidden");
    }

    #[test]
    fn fixture_load_rejects_bad_json() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"{}").unwrap();
        assert!(matches!(
            FixtureSource::load(temp.path()),
            Err(ScanError::FixtureFormat { .. })
        ));
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::settings::ParseSettingError;

/// SSID shown when an access point does not broadcast one.
pub const HIDDEN_SSID: &str = "Hidden";
/// Security label used when the adapter reports no authentication suite.
pub const OPEN_SECURITY: &str = "Open";

/// Carrier frequency carried as text with a unit, e.g. `2437 MHz`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Frequency {
    mhz: f64,
}

impl Frequency {
    pub fn from_mhz(mhz: f64) -> Self {
        Self { mhz }
    }

    pub fn from_hz(hz: u64) -> Self {
        Self {
            mhz: hz as f64 / 1_000_000.0,
        }
    }

    pub fn mhz(&self) -> f64 {
        self.mhz
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} MHz", self.mhz)
    }
}

impl FromStr for Frequency {
    type Err = ParseSettingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let number = value
            .split_whitespace()
            .next()
            .ok_or_else(|| ParseSettingError::new("frequency", value))?;
        let mhz = number
            .parse::<f64>()
            .map_err(|_| ParseSettingError::new("frequency", value))?;
        Ok(Self { mhz })
    }
}

impl TryFrom<String> for Frequency {
    type Error = ParseSettingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Frequency> for String {
    fn from(value: Frequency) -> Self {
        value.to_string()
    }
}

/// Frequency band used to filter scan results and pick channel candidates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Band {
    #[default]
    #[serde(rename = "2.4 GHz")]
    TwoPointFourGhz,
    #[serde(rename = "5 GHz")]
    FiveGhz,
    #[serde(rename = "6 GHz")]
    SixGhz,
}

impl Band {
    pub const ALL: [Band; 3] = [Band::TwoPointFourGhz, Band::FiveGhz, Band::SixGhz];

    /// Inclusive frequency bounds in MHz. The 5 and 6 GHz ranges share 5900.
    pub fn range_mhz(&self) -> (f64, f64) {
        match self {
            Band::TwoPointFourGhz => (2400.0, 2500.0),
            Band::FiveGhz => (5000.0, 5900.0),
            Band::SixGhz => (5900.0, 7100.0),
        }
    }

    pub fn contains(&self, frequency: Frequency) -> bool {
        let (low, high) = self.range_mhz();
        (low..=high).contains(&frequency.mhz())
    }

    /// Channels considered by the optimizer, in tie-break order.
    pub fn candidate_channels(&self) -> &'static [u32] {
        match self {
            Band::TwoPointFourGhz => &[1, 6, 11],
            Band::FiveGhz => &[36, 40, 44, 48],
            Band::SixGhz => &[1, 5, 9, 13],
        }
    }

    /// Center frequency of `channel` within this band.
    pub fn channel_frequency(&self, channel: u32) -> Frequency {
        let mhz = match self {
            Band::TwoPointFourGhz if channel == 14 => 2484,
            Band::TwoPointFourGhz => 2407 + 5 * channel,
            Band::FiveGhz => 5000 + 5 * channel,
            Band::SixGhz => 5950 + 5 * channel,
        };
        Frequency::from_mhz(f64::from(mhz))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Band::TwoPointFourGhz => "2.4 GHz",
            Band::FiveGhz => "5 GHz",
            Band::SixGhz => "6 GHz",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Band {
    type Err = ParseSettingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace(' ', "");
        match normalized.trim_end_matches("ghz") {
            "2.4" | "2" => Ok(Band::TwoPointFourGhz),
            "5" => Ok(Band::FiveGhz),
            "6" => Ok(Band::SixGhz),
            _ => Err(ParseSettingError::new("band", value)),
        }
    }
}

/// One row of the network table, rebuilt on every scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkObservation {
    pub ssid: String,
    pub bssid: String,
    pub channel: u32,
    pub rssi: i32,
    pub security: String,
    pub frequency: Frequency,
    pub snr: i32,
}

impl NetworkObservation {
    pub fn new(
        ssid: &str,
        bssid: &str,
        channel: u32,
        rssi: i32,
        security: &str,
        frequency: Frequency,
        snr: i32,
    ) -> Self {
        let ssid = if ssid.is_empty() { HIDDEN_SSID } else { ssid };
        Self {
            ssid: ssid.to_string(),
            bssid: bssid.to_string(),
            channel,
            rssi,
            security: security.to_string(),
            frequency,
            snr,
        }
    }
}

/// SNR is only meaningful when the adapter reports a nonzero noise floor.
pub fn derive_snr(signal: i32, noise: Option<i32>) -> i32 {
    match noise {
        Some(noise) if noise != 0 => signal - noise,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_parses_unit_text() {
        assert_eq!("2437 MHz".parse::<Frequency>().unwrap().mhz(), 2437.0);
        assert_eq!("5180.0 MHz".parse::<Frequency>().unwrap().mhz(), 5180.0);
        assert!("MHz".parse::<Frequency>().is_err());
        assert_eq!(Frequency::from_hz(2_412_000_000).to_string(), "2412 MHz");
    }

    #[test]
    fn band_bounds_are_inclusive() {
        assert!(Band::TwoPointFourGhz.contains(Frequency::from_mhz(2400.0)));
        assert!(Band::TwoPointFourGhz.contains(Frequency::from_mhz(2500.0)));
        assert!(!Band::TwoPointFourGhz.contains(Frequency::from_mhz(5180.0)));
        assert!(Band::FiveGhz.contains(Frequency::from_mhz(5900.0)));
        assert!(Band::SixGhz.contains(Frequency::from_mhz(5900.0)));
        assert_eq!("5 GHz".parse::<Band>().unwrap(), Band::FiveGhz);
        assert_eq!("2.4".parse::<Band>().unwrap(), Band::TwoPointFourGhz);
    }

    #[test]
    fn candidate_channels_map_into_their_band() {
        for band in Band::ALL {
            for &channel in band.candidate_channels() {
                assert!(band.contains(band.channel_frequency(channel)));
            }
        }
        assert_eq!(Band::TwoPointFourGhz.channel_frequency(6).mhz(), 2437.0);
        assert_eq!(Band::FiveGhz.channel_frequency(36).mhz(), 5180.0);
    }

    #[test]
    fn empty_ssid_becomes_hidden() {
        let obs = NetworkObservation::new(
            "",
            "aa:bb:cc:dd:ee:ff",
            6,
            -60,
            OPEN_SECURITY,
            Frequency::from_mhz(2437.0),
            0,
        );
        assert_eq!(obs.ssid, HIDDEN_SSID);
    }

    #[test]
    fn snr_requires_nonzero_noise() {
        assert_eq!(derive_snr(-55, Some(-95)), 40);
        assert_eq!(derive_snr(-55, Some(0)), 0);
        assert_eq!(derive_snr(-55, None), 0);
    }
}

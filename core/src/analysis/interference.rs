use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::NetworkObservation;

/// Networks louder than this are reported as co-channel interferers.
pub const STRONG_SIGNAL_DBM: i32 = -50;
/// Chance that a simulated non-WiFi source is reported.
pub const NON_WIFI_PROBABILITY: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NonWifiSource {
    Microwave,
    Bluetooth,
    CordlessPhone,
}

impl NonWifiSource {
    pub const ALL: [NonWifiSource; 3] = [
        NonWifiSource::Microwave,
        NonWifiSource::Bluetooth,
        NonWifiSource::CordlessPhone,
    ];
}

impl fmt::Display for NonWifiSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NonWifiSource::Microwave => "Microwave",
            NonWifiSource::Bluetooth => "Bluetooth",
            NonWifiSource::CordlessPhone => "Cordless Phone",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterferenceSource {
    Wifi { ssid: String, rssi: i32 },
    NonWifi(NonWifiSource),
}

impl fmt::Display for InterferenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterferenceSource::Wifi { ssid, rssi } => {
                write!(f, "WiFi: {} (RSSI: {} dBm)", ssid, rssi)
            }
            InterferenceSource::NonWifi(source) => write!(f, "{}", source),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterferenceReport {
    pub sources: Vec<InterferenceSource>,
}

impl InterferenceReport {
    pub fn is_clear(&self) -> bool {
        self.sources.is_empty()
    }
}

impl fmt::Display for InterferenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clear() {
            return f.write_str("No significant interference detected");
        }
        let listed: Vec<String> = self.sources.iter().map(ToString::to_string).collect();
        write!(f, "Potential interference sources:\n{}", listed.join(", "))
    }
}

/// Non-WiFi detection is simulated, so the caller supplies the randomness.
pub fn check_interference<R: Rng + ?Sized>(
    observations: &[NetworkObservation],
    rng: &mut R,
) -> InterferenceReport {
    let mut sources: Vec<InterferenceSource> = observations
        .iter()
        .filter(|observation| observation.rssi > STRONG_SIGNAL_DBM)
        .map(|observation| InterferenceSource::Wifi {
            ssid: observation.ssid.clone(),
            rssi: observation.rssi,
        })
        .collect();

    if rng.gen::<f64>() > 1.0 - NON_WIFI_PROBABILITY {
        if let Some(source) = NonWifiSource::ALL.choose(rng) {
            sources.push(InterferenceSource::NonWifi(*source));
        }
    }

    InterferenceReport { sources }
}

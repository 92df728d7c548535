use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::settings::ParseSettingError;

pub const MIN_DEVICES: u32 = 1;
pub const MAX_DEVICES: u32 = 200;
pub const DEFAULT_DEVICES: u32 = 10;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SimulationError {
    #[error("device count {0} outside 1..=200")]
    DeviceCount(u32),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ApModel {
    #[default]
    #[serde(rename = "Generic AP")]
    Generic,
    #[serde(rename = "TP-Link AX6000")]
    TpLinkAx6000,
    #[serde(rename = "Netgear Orbi")]
    NetgearOrbi,
    #[serde(rename = "Cisco Meraki")]
    CiscoMeraki,
}

impl ApModel {
    pub const ALL: [ApModel; 4] = [
        ApModel::Generic,
        ApModel::TpLinkAx6000,
        ApModel::NetgearOrbi,
        ApModel::CiscoMeraki,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ApModel::Generic => "Generic AP",
            ApModel::TpLinkAx6000 => "TP-Link AX6000",
            ApModel::NetgearOrbi => "Netgear Orbi",
            ApModel::CiscoMeraki => "Cisco Meraki",
        }
    }

    /// Aggregate throughput in Mbps shared by up to ten devices.
    pub fn base_throughput_mbps(&self) -> f64 {
        match self {
            ApModel::Generic => 300.0,
            ApModel::TpLinkAx6000 => 6000.0,
            ApModel::NetgearOrbi => 4000.0,
            ApModel::CiscoMeraki => 1300.0,
        }
    }

    pub fn capacity(&self) -> u32 {
        match self {
            ApModel::Generic => 20,
            ApModel::TpLinkAx6000 => 100,
            ApModel::NetgearOrbi => 80,
            ApModel::CiscoMeraki => 50,
        }
    }

    pub fn throughput_mbps(&self, device_count: u32) -> f64 {
        self.base_throughput_mbps() / (f64::from(device_count) / 10.0).max(1.0)
    }
}

impl fmt::Display for ApModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ApModel {
    type Err = ParseSettingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = squash(value);
        ApModel::ALL
            .into_iter()
            .find(|model| {
                let label = squash(model.label());
                label == wanted || label.trim_end_matches("ap") == wanted
            })
            .ok_or_else(|| ParseSettingError::new("access point model", value))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum WallMaterial {
    #[default]
    Concrete,
    Brick,
    Drywall,
    Glass,
}

impl WallMaterial {
    pub const ALL: [WallMaterial; 4] = [
        WallMaterial::Concrete,
        WallMaterial::Brick,
        WallMaterial::Drywall,
        WallMaterial::Glass,
    ];

    pub fn attenuation_db_per_m(&self) -> u32 {
        match self {
            WallMaterial::Concrete => 15,
            WallMaterial::Brick => 12,
            WallMaterial::Drywall => 8,
            WallMaterial::Glass => 5,
        }
    }
}

impl fmt::Display for WallMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for WallMaterial {
    type Err = ParseSettingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        WallMaterial::ALL
            .into_iter()
            .find(|material| material.to_string().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ParseSettingError::new("wall material", value))
    }
}

fn squash(value: &str) -> String {
    value
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimulationRequest {
    pub ap_model: ApModel,
    pub wall_material: WallMaterial,
    pub device_count: u32,
}

impl Default for SimulationRequest {
    fn default() -> Self {
        Self {
            ap_model: ApModel::default(),
            wall_material: WallMaterial::default(),
            device_count: DEFAULT_DEVICES,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SimulationResult {
    pub request: SimulationRequest,
    pub attenuation_db_per_m: u32,
    pub max_range_m: f64,
    pub throughput_mbps: f64,
    pub latency_ms: f64,
    pub capacity: u32,
}

pub fn simulate_network<R: Rng + ?Sized>(
    request: SimulationRequest,
    rng: &mut R,
) -> Result<SimulationResult, SimulationError> {
    if !(MIN_DEVICES..=MAX_DEVICES).contains(&request.device_count) {
        return Err(SimulationError::DeviceCount(request.device_count));
    }
    let attenuation = request.wall_material.attenuation_db_per_m();

    Ok(SimulationResult {
        request,
        attenuation_db_per_m: attenuation,
        max_range_m: 100.0 / f64::from(attenuation),
        throughput_mbps: request.ap_model.throughput_mbps(request.device_count),
        latency_ms: rng.gen_range(1.0..5.0),
        capacity: request.ap_model.capacity(),
    })
}

impl fmt::Display for SimulationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Network Simulation Results")?;
        writeln!(f, "==========================")?;
        writeln!(f, "Access Point: {}", self.request.ap_model)?;
        writeln!(f, "Wall Material: {}", self.request.wall_material)?;
        writeln!(f, "Device Count: {}", self.request.device_count)?;
        writeln!(f, "Attenuation: {} dB/m", self.attenuation_db_per_m)?;
        writeln!(f)?;
        writeln!(f, "Estimated Performance:")?;
        writeln!(f, "- Max Range: {:.1} meters", self.max_range_m)?;
        writeln!(f, "- Max Throughput: {:.1} Mbps", self.throughput_mbps)?;
        writeln!(f, "- Latency: {:.2} ms", self.latency_ms)?;
        write!(f, "- Capacity: {} devices", self.capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn throughput_scales_past_ten_devices() {
        assert_eq!(ApModel::TpLinkAx6000.throughput_mbps(5), 6000.0);
        assert_eq!(ApModel::TpLinkAx6000.throughput_mbps(10), 6000.0);
        assert_eq!(ApModel::TpLinkAx6000.throughput_mbps(40), 1500.0);
        assert_eq!(ApModel::Generic.throughput_mbps(200), 15.0);
    }

    #[test]
    fn simulation_uses_material_table() {
        let mut rng = StdRng::seed_from_u64(3);
        let result = simulate_network(
            SimulationRequest {
                ap_model: ApModel::CiscoMeraki,
                wall_material: WallMaterial::Drywall,
                device_count: 25,
            },
            &mut rng,
        )
        .unwrap();

        assert_eq!(result.attenuation_db_per_m, 8);
        assert_eq!(result.max_range_m, 12.5);
        assert_eq!(result.throughput_mbps, 520.0);
        assert_eq!(result.capacity, 50);
        assert!((1.0..5.0).contains(&result.latency_ms));
        let text = result.to_string();
        assert!(text.contains("Access Point: Cisco Meraki"));
        assert!(text.contains("- Max Range: 12.5 meters"));
    }

    #[test]
    fn device_count_is_bounded() {
        let mut rng = StdRng::seed_from_u64(0);
        let request = SimulationRequest {
            device_count: 0,
            ..Default::default()
        };
        assert_eq!(
            simulate_network(request, &mut rng),
            Err(SimulationError::DeviceCount(0))
        );
        let request = SimulationRequest {
            device_count: 201,
            ..Default::default()
        };
        assert!(simulate_network(request, &mut rng).is_err());
    }

    #[test]
    fn names_parse_loosely() {
        assert_eq!("tp-link ax6000".parse::<ApModel>().unwrap(), ApModel::TpLinkAx6000);
        assert_eq!("generic".parse::<ApModel>().unwrap(), ApModel::Generic);
        assert_eq!("GLASS".parse::<WallMaterial>().unwrap(), WallMaterial::Glass);
        assert!("plywood".parse::<WallMaterial>().is_err());
    }
}

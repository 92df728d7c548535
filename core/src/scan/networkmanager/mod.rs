//! Live scan source talking to NetworkManager over the system D-Bus.

mod proxy;

use std::collections::{BTreeMap, HashMap};
use zbus::blocking::Connection;
use zbus::zvariant::OwnedObjectPath;

use super::{ScanError, ScanProfile, ScanSource};
use crate::telemetry::log::LogManager;
use proxy::{
    NMAccessPointProxyBlocking, NMDeviceProxyBlocking, NMWirelessProxyBlocking,
    NetworkManagerProxyBlocking,
};

const DEVICE_TYPE_WIFI: u32 = 2;

const AP_FLAGS_PRIVACY: u32 = 0x1;
const KEY_MGMT_PSK: u32 = 0x100;
const KEY_MGMT_802_1X: u32 = 0x200;
const KEY_MGMT_SAE: u32 = 0x400;
const KEY_MGMT_OWE: u32 = 0x800;

fn unavailable(err: zbus::Error) -> ScanError {
    ScanError::AdapterUnavailable(format!("NetworkManager: {}", err))
}

fn interface_error(interface: &str, err: zbus::Error) -> ScanError {
    ScanError::Interface {
        interface: interface.to_string(),
        message: err.to_string(),
    }
}

/// Access-point properties as NetworkManager exposes them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct AccessPointInfo {
    pub ssid: Vec<u8>,
    pub bssid: String,
    pub strength: u8,
    pub frequency_mhz: u32,
    pub flags: u32,
    pub wpa_flags: u32,
    pub rsn_flags: u32,
}

impl AccessPointInfo {
    pub fn to_profile(&self) -> ScanProfile {
        ScanProfile {
            ssid: String::from_utf8_lossy(&self.ssid).into_owned(),
            bssid: self.bssid.clone(),
            channel: channel_for(self.frequency_mhz),
            signal: strength_to_dbm(self.strength),
            noise: None,
            freq_hz: u64::from(self.frequency_mhz) * 1_000_000,
            auth: security_label(self.flags, self.wpa_flags, self.rsn_flags),
        }
    }
}

/// NetworkManager reports signal quality in percent.
pub(crate) fn strength_to_dbm(strength: u8) -> i32 {
    i32::from(strength.min(100)) / 2 - 100
}

pub(crate) fn channel_for(mhz: u32) -> Option<u32> {
    match mhz {
        2484 => Some(14),
        2412..=2472 => Some((mhz - 2407) / 5),
        5160..=5885 => Some((mhz - 5000) / 5),
        5955..=7115 => Some((mhz - 5950) / 5),
        _ => None,
    }
}

/// Suite names in the order `nmcli` prints them; `None` for an open network.
pub(crate) fn security_label(flags: u32, wpa_flags: u32, rsn_flags: u32) -> Option<String> {
    let mut suites = Vec::new();
    if wpa_flags != 0 {
        suites.push("WPA1");
    }
    if rsn_flags & (KEY_MGMT_PSK | KEY_MGMT_802_1X) != 0 {
        suites.push("WPA2");
    }
    if rsn_flags & KEY_MGMT_SAE != 0 {
        suites.push("WPA3");
    }
    if rsn_flags & KEY_MGMT_OWE != 0 {
        suites.push("OWE");
    }
    if (wpa_flags | rsn_flags) & KEY_MGMT_802_1X != 0 {
        suites.push("802.1X");
    }
    if suites.is_empty() && flags & AP_FLAGS_PRIVACY != 0 {
        suites.push("WEP");
    }
    if suites.is_empty() {
        None
    } else {
        Some(suites.join(" "))
    }
}

/// Wi-Fi devices managed by NetworkManager, scanned through `RequestScan`
/// and read back through `GetAccessPoints`.
pub struct NetworkManagerSource {
    connection: Connection,
    devices: BTreeMap<String, OwnedObjectPath>,
    logger: LogManager,
}

impl NetworkManagerSource {
    /// Connects to the system bus and lists devices once, so a host without
    /// NetworkManager degrades to offline use.
    pub fn detect() -> Result<Self, ScanError> {
        let connection = Connection::system().map_err(unavailable)?;
        let mut source = Self {
            connection,
            devices: BTreeMap::new(),
            logger: LogManager::new("networkmanager"),
        };
        source.refresh_devices()?;
        Ok(source)
    }

    fn refresh_devices(&mut self) -> Result<(), ScanError> {
        let manager = NetworkManagerProxyBlocking::new(&self.connection).map_err(unavailable)?;
        let paths = manager.get_devices().map_err(unavailable)?;

        self.devices.clear();
        for path in paths {
            match self.wifi_interface(path.clone()) {
                Ok(Some(name)) => {
                    self.devices.insert(name, path);
                }
                Ok(None) => {}
                // Devices may disappear between listing and reading them.
                Err(err) => self
                    .logger
                    .warn(&format!("skipping device {}: {}", path.as_str(), err)),
            }
        }
        Ok(())
    }

    fn wifi_interface(&self, path: OwnedObjectPath) -> zbus::Result<Option<String>> {
        let device = NMDeviceProxyBlocking::builder(&self.connection)
            .path(path)?
            .build()?;
        if device.device_type()? != DEVICE_TYPE_WIFI {
            return Ok(None);
        }
        device.interface().map(Some)
    }

    fn device_path(&self, interface: &str) -> Result<OwnedObjectPath, ScanError> {
        self.devices
            .get(interface)
            .cloned()
            .ok_or_else(|| ScanError::Interface {
                interface: interface.to_string(),
                message: "not a NetworkManager Wi-Fi device".into(),
            })
    }

    fn request_scan(&self, device: OwnedObjectPath) -> zbus::Result<()> {
        let wireless = NMWirelessProxyBlocking::builder(&self.connection)
            .path(device)?
            .build()?;
        wireless.request_scan(HashMap::new())
    }

    fn access_points(&self, device: OwnedObjectPath) -> zbus::Result<Vec<ScanProfile>> {
        let wireless = NMWirelessProxyBlocking::builder(&self.connection)
            .path(device)?
            .build()?;
        let mut profiles = Vec::new();
        for path in wireless.get_access_points()? {
            match self.access_point(path.clone()) {
                Ok(info) => profiles.push(info.to_profile()),
                Err(err) => self
                    .logger
                    .warn(&format!("access point {} vanished: {}", path.as_str(), err)),
            }
        }
        Ok(profiles)
    }

    fn access_point(&self, path: OwnedObjectPath) -> zbus::Result<AccessPointInfo> {
        let ap = NMAccessPointProxyBlocking::builder(&self.connection)
            .path(path)?
            .build()?;
        Ok(AccessPointInfo {
            ssid: ap.ssid()?,
            bssid: ap.hw_address()?,
            strength: ap.strength()?,
            frequency_mhz: ap.frequency()?,
            flags: ap.flags()?,
            wpa_flags: ap.wpa_flags()?,
            rsn_flags: ap.rsn_flags()?,
        })
    }
}

impl ScanSource for NetworkManagerSource {
    fn name(&self) -> &str {
        "networkmanager"
    }

    fn interfaces(&mut self) -> Result<Vec<String>, ScanError> {
        self.refresh_devices()?;
        Ok(self.devices.keys().cloned().collect())
    }

    fn trigger(&mut self, interface: &str) -> Result<(), ScanError> {
        let device = self.device_path(interface)?;
        // NetworkManager refuses back-to-back rescans; cached results are still usable.
        if let Err(err) = self.request_scan(device) {
            self.logger
                .warn(&format!("rescan on {} refused: {}", interface, err));
        }
        Ok(())
    }

    fn results(&mut self, interface: &str) -> Result<Vec<ScanProfile>, ScanError> {
        let device = self.device_path(interface)?;
        self.access_points(device)
            .map_err(|err| interface_error(interface, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strength_maps_to_dbm() {
        assert_eq!(strength_to_dbm(80), -60);
        assert_eq!(strength_to_dbm(0), -100);
        assert_eq!(strength_to_dbm(100), -50);
        assert_eq!(strength_to_dbm(35), -83);
        assert_eq!(strength_to_dbm(255), -50);
    }

    #[test]
    fn channels_follow_band_plans() {
        assert_eq!(channel_for(2412), Some(1));
        assert_eq!(channel_for(2437), Some(6));
        assert_eq!(channel_for(2484), Some(14));
        assert_eq!(channel_for(5180), Some(36));
        assert_eq!(channel_for(5825), Some(165));
        assert_eq!(channel_for(5955), Some(1));
        assert_eq!(channel_for(6115), Some(33));
        assert_eq!(channel_for(900), None);
    }

    #[test]
    fn security_flags_become_suite_names() {
        assert_eq!(security_label(0, 0, 0), None);
        assert_eq!(security_label(AP_FLAGS_PRIVACY, 0, 0).as_deref(), Some("WEP"));
        assert_eq!(
            security_label(AP_FLAGS_PRIVACY, 0, KEY_MGMT_PSK).as_deref(),
            Some("WPA2")
        );
        assert_eq!(
            security_label(AP_FLAGS_PRIVACY, 0, KEY_MGMT_PSK | KEY_MGMT_SAE).as_deref(),
            Some("WPA2 WPA3")
        );
        assert_eq!(
            security_label(AP_FLAGS_PRIVACY, KEY_MGMT_PSK, KEY_MGMT_PSK).as_deref(),
            Some("WPA1 WPA2")
        );
        assert_eq!(
            security_label(AP_FLAGS_PRIVACY, 0, KEY_MGMT_802_1X).as_deref(),
            Some("WPA2 802.1X")
        );
        assert_eq!(security_label(0, 0, KEY_MGMT_OWE).as_deref(), Some("OWE"));
    }

    #[test]
    fn access_point_becomes_profile() {
        let info = AccessPointInfo {
            ssid: b"cafe".to_vec(),
            bssid: "AA:BB:CC:DD:EE:FF".into(),
            strength: 80,
            frequency_mhz: 2437,
            flags: AP_FLAGS_PRIVACY,
            wpa_flags: 0,
            rsn_flags: KEY_MGMT_PSK | KEY_MGMT_SAE,
        };
        let profile = info.to_profile();
        assert_eq!(profile.ssid, "cafe");
        assert_eq!(profile.channel, Some(6));
        assert_eq!(profile.signal, -60);
        assert_eq!(profile.freq_hz, 2_437_000_000);
        assert_eq!(profile.auth.as_deref(), Some("WPA2 WPA3"));

        let hidden = AccessPointInfo {
            bssid: "11:22:33:44:55:66".into(),
            strength: 35,
            frequency_mhz: 5180,
            ..Default::default()
        }
        .to_profile();
        let observation = hidden.to_observation();
        assert_eq!(observation.ssid, "Hidden");
        assert_eq!(observation.security, "Open");
        assert_eq!(observation.channel, 36);
    }

    #[test]
    fn non_utf8_ssid_is_replaced_lossily() {
        let info = AccessPointInfo {
            ssid: vec![b'n', 0xff, b't'],
            ..Default::default()
        };
        assert_eq!(info.to_profile().ssid, "n\u{fffd}t");
    }

    #[test]
    fn unreachable_bus_is_adapter_unavailable() {
        std::env::set_var(
            "DBUS_SYSTEM_BUS_ADDRESS",
            "unix:path=/nonexistent/wifimap/system_bus_socket",
        );
        let err = NetworkManagerSource::detect().err().unwrap();
        assert!(matches!(
            err,
            ScanError::AdapterUnavailable(message) if message.starts_with("NetworkManager")
        ));
    }
}

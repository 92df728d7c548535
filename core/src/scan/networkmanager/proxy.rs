//! D-Bus proxies for the NetworkManager objects a scan walks through.

use std::collections::HashMap;
use zbus::zvariant::{OwnedObjectPath, Value};
use zbus::{proxy, Result};

#[proxy(
    interface = "org.freedesktop.NetworkManager",
    default_service = "org.freedesktop.NetworkManager",
    default_path = "/org/freedesktop/NetworkManager"
)]
pub trait NetworkManager {
    /// Object paths of every network device, wired or not.
    fn get_devices(&self) -> Result<Vec<OwnedObjectPath>>;
}

#[proxy(
    interface = "org.freedesktop.NetworkManager.Device",
    default_service = "org.freedesktop.NetworkManager"
)]
pub trait NMDevice {
    /// Kernel interface name, e.g. `wlp2s0`.
    #[zbus(property)]
    fn interface(&self) -> Result<String>;

    /// `NM_DEVICE_TYPE_*`; 2 is Wi-Fi.
    #[zbus(property)]
    fn device_type(&self) -> Result<u32>;
}

#[proxy(
    interface = "org.freedesktop.NetworkManager.Device.Wireless",
    default_service = "org.freedesktop.NetworkManager"
)]
pub trait NMWireless {
    /// Asks the device to rescan; fails while a recent scan is still fresh.
    fn request_scan(&self, options: HashMap<&str, Value<'_>>) -> Result<()>;

    /// Access points currently visible to the device.
    fn get_access_points(&self) -> Result<Vec<OwnedObjectPath>>;
}

#[proxy(
    interface = "org.freedesktop.NetworkManager.AccessPoint",
    default_service = "org.freedesktop.NetworkManager"
)]
pub trait NMAccessPoint {
    /// Raw SSID bytes, not necessarily UTF-8.
    #[zbus(property)]
    fn ssid(&self) -> Result<Vec<u8>>;

    /// Signal quality in percent.
    #[zbus(property)]
    fn strength(&self) -> Result<u8>;

    #[zbus(property)]
    fn hw_address(&self) -> Result<String>;

    /// Bit 0 is privacy (WEP).
    #[zbus(property)]
    fn flags(&self) -> Result<u32>;

    #[zbus(property)]
    fn wpa_flags(&self) -> Result<u32>;

    #[zbus(property)]
    fn rsn_flags(&self) -> Result<u32>;

    /// MHz.
    #[zbus(property)]
    fn frequency(&self) -> Result<u32>;
}

use std::io::Write;

use super::ExportError;
use crate::model::NetworkObservation;

/// Column order of the network table export.
pub const CSV_HEADER: [&str; 7] = [
    "SSID",
    "BSSID",
    "Channel",
    "RSSI",
    "Security",
    "Frequency",
    "SNR",
];

pub fn write_csv<W: Write>(
    writer: W,
    observations: &[NetworkObservation],
) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER)?;
    for network in observations {
        csv.write_record([
            network.ssid.clone(),
            network.bssid.clone(),
            network.channel.to_string(),
            network.rssi.to_string(),
            network.security.clone(),
            network.frequency.to_string(),
            network.snr.to_string(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

use rand::Rng;
use std::io::{Seek, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::ExportError;
use crate::model::NetworkObservation;

/// Name of the KML entry inside the archive.
pub const KML_ENTRY: &str = "doc.kml";

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Builds the KML document. Placemark coordinates are random, not geolocated.
pub fn build_kml<R: Rng + ?Sized>(observations: &[NetworkObservation], rng: &mut R) -> String {
    let mut kml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <kml xmlns=\"http://www.opengis.net/kml/2.2\">\n<Document>\n",
    );
    for network in observations {
        let longitude: f64 = rng.gen_range(-180.0..=180.0);
        let latitude: f64 = rng.gen_range(-90.0..=90.0);
        let description = format!(
            "RSSI: {} dBm\nChannel: {}\nSNR: {} dB",
            network.rssi, network.channel, network.snr
        );
        kml.push_str(&format!(
            "<Placemark>\n<name>{}</name>\n<description>{}</description>\n\
             <Point><coordinates>{},{},0</coordinates></Point>\n</Placemark>\n",
            xml_escape(&network.ssid),
            xml_escape(&description),
            longitude,
            latitude
        ));
    }
    kml.push_str("</Document>\n</kml>\n");
    kml
}

pub fn write_kmz<W: Write + Seek, R: Rng + ?Sized>(
    writer: W,
    observations: &[NetworkObservation],
    rng: &mut R,
) -> Result<(), ExportError> {
    let mut archive = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    archive.start_file(KML_ENTRY, options)?;
    archive.write_all(build_kml(observations, rng).as_bytes())?;
    archive.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Frequency;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::{Cursor, Read};

    fn networks() -> Vec<NetworkObservation> {
        vec![
            NetworkObservation::new("R&D <lab>", "01", 6, -55, "WPA2", Frequency::from_mhz(2437.0), 35),
            NetworkObservation::new("guest", "02", 1, -77, "Open", Frequency::from_mhz(2412.0), 0),
        ]
    }

    #[test]
    fn kml_has_escaped_placemark_per_network() {
        let mut rng = StdRng::seed_from_u64(11);
        let kml = build_kml(&networks(), &mut rng);
        assert_eq!(kml.matches("<Placemark>").count(), 2);
        assert!(kml.contains("<name>R&amp;D &lt;lab&gt;</name>"));
        assert!(kml.contains("RSSI: -77 dBm\nChannel: 1\nSNR: 0 dB"));
    }

    #[test]
    fn placemark_coordinates_stay_on_the_globe() {
        let mut rng = StdRng::seed_from_u64(2);
        let kml = build_kml(&networks(), &mut rng);
        for block in kml.split("<coordinates>").skip(1) {
            let coords = &block[..block.find("</coordinates>").unwrap()];
            let parts: Vec<f64> = coords.split(',').map(|p| p.parse().unwrap()).collect();
            assert!((-180.0..=180.0).contains(&parts[0]));
            assert!((-90.0..=90.0).contains(&parts[1]));
        }
    }

    #[test]
    fn kmz_archive_wraps_doc_kml() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut cursor = Cursor::new(Vec::new());
        write_kmz(&mut cursor, &networks(), &mut rng).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap();
        assert_eq!(archive.len(), 1);
        let mut kml = String::new();
        archive.by_name(KML_ENTRY).unwrap().read_to_string(&mut kml).unwrap();
        assert!(kml.contains("<name>guest</name>"));
    }
}

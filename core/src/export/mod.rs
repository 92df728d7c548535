//! Report writers for the survey: CSV table, text PDF and KMZ placemarks.

pub mod kmz;
pub mod pdf;
pub mod table;

use rand::Rng;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::math::stats::GridStats;
use crate::model::{CoverageGrid, NetworkObservation};

pub use kmz::write_kmz;
pub use pdf::write_pdf;
pub use table::{write_csv, CSV_HEADER};

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("unsupported report format: {0} (expected .pdf, .csv or .kmz)")]
    UnsupportedFormat(String),
    #[error("report i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv encoding failure: {0}")]
    Csv(#[from] csv::Error),
    #[error("kmz archive failure: {0}")]
    Zip(#[from] zip::result::ZipError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Pdf,
    Csv,
    Kmz,
}

impl ReportFormat {
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "pdf" => Ok(ReportFormat::Pdf),
            "csv" => Ok(ReportFormat::Csv),
            "kmz" => Ok(ReportFormat::Kmz),
            _ => Err(ExportError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Everything a report needs from the current survey.
pub struct ReportData<'a> {
    pub observations: &'a [NetworkObservation],
    pub grid: Option<&'a CoverageGrid>,
    pub generated_at: String,
}

impl<'a> ReportData<'a> {
    pub fn new(observations: &'a [NetworkObservation], grid: Option<&'a CoverageGrid>) -> Self {
        Self {
            observations,
            grid,
            generated_at: chrono::Local::now()
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
        }
    }

    pub fn grid_stats(&self) -> Option<GridStats> {
        self.grid.and_then(CoverageGrid::stats)
    }
}

/// Writes the report in the format implied by the file extension.
pub fn export_report<R: Rng + ?Sized>(
    path: &Path,
    data: &ReportData<'_>,
    rng: &mut R,
) -> Result<ReportFormat, ExportError> {
    let format = ReportFormat::from_path(path)?;
    let file = File::create(path)?;
    match format {
        ReportFormat::Csv => write_csv(file, data.observations)?,
        ReportFormat::Pdf => write_pdf(BufWriter::new(file), data)?,
        ReportFormat::Kmz => write_kmz(file, data.observations, rng)?,
    }
    log::info!("report exported to {}", path.display());
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Frequency;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn observations() -> Vec<NetworkObservation> {
        vec![NetworkObservation::new(
            "atrium",
            "10:20:30:40:50:60",
            11,
            -58,
            "WPA2",
            Frequency::from_mhz(2462.0),
            31,
        )]
    }

    #[test]
    fn extension_selects_format() {
        assert_eq!(ReportFormat::from_path(Path::new("a.PDF")).unwrap(), ReportFormat::Pdf);
        assert_eq!(ReportFormat::from_path(Path::new("a.csv")).unwrap(), ReportFormat::Csv);
        assert_eq!(ReportFormat::from_path(Path::new("a.kmz")).unwrap(), ReportFormat::Kmz);
        assert!(matches!(
            ReportFormat::from_path(Path::new("a.txt")),
            Err(ExportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn export_report_writes_each_format() {
        let dir = tempfile::tempdir().unwrap();
        let observations = observations();
        let data = ReportData::new(&observations, None);
        let mut rng = StdRng::seed_from_u64(5);

        for name in ["survey.csv", "survey.pdf", "survey.kmz"] {
            let path = dir.path().join(name);
            export_report(&path, &data, &mut rng).unwrap();
            assert!(std::fs::metadata(&path).unwrap().len() > 0);
        }
        assert!(export_report(&dir.path().join("survey.doc"), &data, &mut rng).is_err());
        assert!(!dir.path().join("survey.doc").exists());
    }
}

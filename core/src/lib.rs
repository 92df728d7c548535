//! Core survey model and coverage estimation for the WiFi mapping toolkit.
//!
//! Scan sources feed a flat list of network observations. The processing
//! stages turn that list and a floor plan into a clipped RSSI grid, and the
//! export writers render both as CSV, PDF or KMZ reports.

pub mod analysis;
pub mod export;
pub mod math;
pub mod model;
pub mod prelude;
pub mod processing;
pub mod scan;
pub mod telemetry;

pub use prelude::{ProcessingStage, StageInput, StageOutput};

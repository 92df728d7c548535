pub mod dead_zone;
pub mod heatmap;

pub use dead_zone::DeadZoneStage;
pub use heatmap::HeatmapStage;

pub mod coverage;
pub mod floor_plan;
pub mod observation;
pub mod project;
pub mod settings;

pub use coverage::CoverageGrid;
pub use floor_plan::{FloorPlan, FloorPlanError};
pub use observation::{Band, Frequency, NetworkObservation};
pub use project::{project_path, ProjectError, ProjectFile};
pub use settings::{Language, ParseSettingError, ProjectSettings, TextDirection, ThemeChoice};

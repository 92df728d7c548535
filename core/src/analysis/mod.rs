pub mod channels;
pub mod interference;
pub mod simulation;

pub use channels::{optimize_channels, ChannelRecommendation};
pub use interference::{check_interference, InterferenceReport, InterferenceSource};
pub use simulation::{
    simulate_network, ApModel, SimulationError, SimulationRequest, SimulationResult, WallMaterial,
};

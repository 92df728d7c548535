pub mod pathloss;
pub mod stats;

pub use pathloss::free_space_path_loss;
pub use stats::GridStats;

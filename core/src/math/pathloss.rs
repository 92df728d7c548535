/// Shortest simulated access-point distance in meters.
pub const MIN_DISTANCE_M: f64 = 1.0;
/// Longest simulated access-point distance in meters.
pub const MAX_DISTANCE_M: f64 = 50.0;

/// Log-distance free-space loss without the reference constant.
///
/// `20·log10(d) + 20·log10(f)` with `d` in meters and `f` in MHz. Absolute
/// values are not calibrated; only differences between cells are meaningful.
pub fn free_space_path_loss(distance_m: f64, frequency_mhz: f64) -> f64 {
    20.0 * distance_m.log10() + 20.0 * frequency_mhz.log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_distance_leaves_frequency_term() {
        let loss = free_space_path_loss(1.0, 1000.0);
        assert!((loss - 60.0).abs() < 1e-9);
    }

    #[test]
    fn loss_grows_six_db_per_doubling() {
        let near = free_space_path_loss(10.0, 2437.0);
        let far = free_space_path_loss(20.0, 2437.0);
        assert!((far - near - 6.0206).abs() < 1e-3);
    }
}

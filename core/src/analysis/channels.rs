use serde::{Deserialize, Serialize};

use crate::model::{Band, NetworkObservation};

/// Least-congested channel among the band's candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRecommendation {
    pub band: Band,
    pub channel: u32,
    /// Occupancy per candidate, in candidate order.
    pub occupancy: Vec<(u32, usize)>,
}

pub fn optimize_channels(band: Band, observations: &[NetworkObservation]) -> ChannelRecommendation {
    let occupancy: Vec<(u32, usize)> = band
        .candidate_channels()
        .iter()
        .map(|&channel| {
            let count = observations
                .iter()
                .filter(|observation| observation.channel == channel)
                .count();
            (channel, count)
        })
        .collect();

    // Strict comparison keeps the first candidate on ties.
    let mut best = occupancy[0];
    for &(channel, count) in &occupancy[1..] {
        if count < best.1 {
            best = (channel, count);
        }
    }

    ChannelRecommendation {
        band,
        channel: best.0,
        occupancy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Frequency;

    fn on_channel(channel: u32) -> NetworkObservation {
        NetworkObservation::new(
            "net",
            "00:00:00:00:00:00",
            channel,
            -60,
            "WPA2",
            Frequency::from_mhz(2437.0),
            0,
        )
    }

    #[test]
    fn busiest_channel_is_avoided() {
        let observations: Vec<_> = [1, 1, 1, 6, 11].into_iter().map(on_channel).collect();
        let recommendation = optimize_channels(Band::TwoPointFourGhz, &observations);
        assert_eq!(recommendation.channel, 6);
        assert_eq!(recommendation.occupancy, vec![(1, 3), (6, 1), (11, 1)]);
    }

    #[test]
    fn empty_scan_picks_first_candidate() {
        assert_eq!(optimize_channels(Band::FiveGhz, &[]).channel, 36);
        assert_eq!(optimize_channels(Band::SixGhz, &[]).channel, 1);
    }

    #[test]
    fn channels_outside_candidates_are_ignored() {
        let observations: Vec<_> = [36, 40, 44, 149, 149].into_iter().map(on_channel).collect();
        assert_eq!(optimize_channels(Band::FiveGhz, &observations).channel, 48);
    }
}

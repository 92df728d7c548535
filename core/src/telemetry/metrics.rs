use serde::{Deserialize, Serialize};
use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

/// Point-in-time counters published with each survey snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub scans: usize,
    pub heatmaps: usize,
    pub errors: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_scan(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.scans += 1;
        }
    }

    pub fn record_heatmap(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.heatmaps += 1;
        }
    }

    pub fn record_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.errors += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_counts_each_event() {
        let metrics = MetricsRecorder::new();
        metrics.record_scan();
        metrics.record_scan();
        metrics.record_heatmap();
        metrics.record_error();
        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                scans: 2,
                heatmaps: 1,
                errors: 1
            }
        );
    }
}

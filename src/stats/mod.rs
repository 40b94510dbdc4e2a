use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

/// Point-in-time view of the session statistics, shipped to the display
/// layer after every change.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub drowsiness_count: u64,
    pub readings: u64,
    /// Mean confidence as a percentage with one decimal, `None` until the
    /// first qualifying reading (rendered as a dash).
    pub average_confidence_pct: Option<f64>,
}

struct StatsState {
    confidence_sum: f64,
    readings: u64,
    drowsiness_count: u64,
}

/// Running statistics for one monitoring session: mean confidence over
/// qualifying readings and the count of drowsiness events.
pub struct SessionStats {
    inner: Arc<Mutex<StatsState>>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StatsState {
                confidence_sum: 0.0,
                readings: 0,
                drowsiness_count: 0,
            })),
        }
    }

    /// Record one polled confidence reading. Only observations taken while
    /// the detector was actually detecting, with a positive confidence,
    /// enter the average; everything else is polling noise.
    pub async fn record_reading(&self, is_detecting: bool, confidence: f64) {
        if !is_detecting || confidence <= 0.0 {
            return;
        }

        let mut state = self.inner.lock().await;
        state.confidence_sum += confidence;
        state.readings += 1;
    }

    /// Count one alert-worthy observation. The backend's binary "Drowsy"
    /// label is the threshold; no independent thresholding happens here.
    pub async fn register_drowsiness_event(&self) {
        let mut state = self.inner.lock().await;
        state.drowsiness_count += 1;
    }

    /// Mean confidence as a fraction in [0, 1], `None` with no readings.
    pub async fn average(&self) -> Option<f64> {
        let state = self.inner.lock().await;
        if state.readings == 0 {
            None
        } else {
            Some(state.confidence_sum / state.readings as f64)
        }
    }

    pub async fn drowsiness_count(&self) -> u64 {
        self.inner.lock().await.drowsiness_count
    }

    pub async fn snapshot(&self) -> StatsSnapshot {
        let state = self.inner.lock().await;
        let average = if state.readings == 0 {
            None
        } else {
            Some(round_percent(state.confidence_sum / state.readings as f64))
        };

        StatsSnapshot {
            drowsiness_count: state.drowsiness_count,
            readings: state.readings,
            average_confidence_pct: average,
        }
    }

    /// Each transition into Running starts a fresh metric set.
    pub async fn reset(&self) {
        let mut state = self.inner.lock().await;
        state.confidence_sum = 0.0;
        state.readings = 0;
        state.drowsiness_count = 0;
    }
}

impl Clone for SessionStats {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Fraction -> percentage with one decimal, rounding half away from zero at
/// the formatting boundary (0.915 -> 91.5, 0.9249 -> 92.5 stays 92.5).
pub fn round_percent(fraction: f64) -> f64 {
    (fraction * 1000.0).round() / 10.0
}

/// Display form of a percentage, e.g. `92.0%`.
pub fn format_percent(fraction: f64) -> String {
    format!("{:.1}%", round_percent(fraction))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn average_ignores_non_qualifying_readings() {
        let stats = SessionStats::new();

        stats.record_reading(true, 0.8).await;
        stats.record_reading(false, 0.99).await; // not detecting
        stats.record_reading(true, 0.0).await; // zero confidence
        stats.record_reading(true, 0.6).await;

        let snapshot = stats.snapshot().await;
        assert_eq!(snapshot.readings, 2);
        assert_eq!(snapshot.average_confidence_pct, Some(70.0));
    }

    #[tokio::test]
    async fn average_is_none_until_first_reading() {
        let stats = SessionStats::new();
        assert_eq!(stats.average().await, None);
        assert_eq!(stats.snapshot().await.average_confidence_pct, None);
    }

    #[tokio::test]
    async fn drowsiness_count_is_monotone_until_reset() {
        let stats = SessionStats::new();
        stats.register_drowsiness_event().await;
        stats.register_drowsiness_event().await;
        assert_eq!(stats.drowsiness_count().await, 2);

        stats.reset().await;
        assert_eq!(stats.drowsiness_count().await, 0);
        assert_eq!(stats.average().await, None);
    }

    #[test]
    fn percent_rounds_half_away_from_zero() {
        assert_eq!(format_percent(0.92), "92.0%");
        // 0.8125 is exactly representable; the tie at 81.25 rounds up.
        assert_eq!(format_percent(0.8125), "81.3%");
        assert_eq!(format_percent(0.99999), "100.0%");
        assert_eq!(round_percent(0.77), 77.0);
    }
}

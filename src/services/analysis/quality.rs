//! Data quality monitoring over a trailing window of recent rows.

use crate::dataset::SensorFrame;
use crate::services::analysis::stats;
use serde::Serialize;

pub const DEFAULT_LOOKBACK_WINDOW: usize = 500;

const MISSING_RATE_WARNING_THRESHOLD: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensorStatus {
    Healthy,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorHealthRecord {
    pub sensor: String,
    pub status: SensorStatus,
    pub details: String,
    /// Most recent reading in the window; NaN (serialized as null) when the
    /// sensor has never reported.
    pub current_value: f64,
}

/// Inspects the most recent `lookback_window` rows (by position, not time)
/// of every sensor column. The zero-variance check runs before the
/// missing-rate check: a flatlined sensor is CRITICAL even if it is also
/// sparsely reported.
pub fn check_sensor_health(frame: &SensorFrame, lookback_window: usize) -> Vec<SensorHealthRecord> {
    let mut report = Vec::with_capacity(frame.sensors.len());
    for column in &frame.sensors {
        let window_start = column.values.len().saturating_sub(lookback_window.max(1));
        let window = &column.values[window_start..];

        let flatline = stats::std_sample(window) == Some(0.0);
        let (status, details) = if flatline {
            (SensorStatus::Critical, "Flatline (Zero Variance)")
        } else if stats::missing_fraction(window) > MISSING_RATE_WARNING_THRESHOLD {
            (SensorStatus::Warning, "High Missing Data Rate")
        } else {
            (SensorStatus::Healthy, "Normal operation")
        };

        report.push(SensorHealthRecord {
            sensor: column.name.clone(),
            status,
            details: details.to_string(),
            current_value: window.last().copied().unwrap_or(f64::NAN),
        });
    }
    report
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQualityMetrics {
    /// Percentage of sensor cells holding a real reading.
    pub quality_score: f64,
    pub total_sensors: usize,
    pub rows: usize,
}

/// High-level completeness summary across all sensor cells in the frame.
pub fn data_quality_metrics(frame: &SensorFrame) -> DataQualityMetrics {
    let rows = frame
        .sensors
        .first()
        .map(|c| c.values.len())
        .unwrap_or_default();
    let total_cells = rows * frame.sensors.len();
    let missing_cells: usize = frame
        .sensors
        .iter()
        .map(|c| c.values.iter().filter(|v| v.is_nan()).count())
        .sum();
    let quality_score = if total_cells == 0 {
        0.0
    } else {
        100.0 * (1.0 - missing_cells as f64 / total_cells as f64)
    };
    DataQualityMetrics {
        quality_score,
        total_sensors: frame.sensors.len(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::SensorColumn;

    fn frame(columns: Vec<(&str, Vec<f64>)>) -> SensorFrame {
        SensorFrame {
            timestamps: vec![],
            status: vec![],
            sensors: columns
                .into_iter()
                .map(|(name, values)| SensorColumn {
                    name: name.to_string(),
                    values,
                })
                .collect(),
        }
    }

    #[test]
    fn flatline_sensor_is_critical_and_monotonic_sensor_is_healthy() {
        let f = frame(vec![
            ("sensor_00", vec![10.0, 10.0, 10.0, 10.0, 10.0]),
            ("sensor_01", vec![1.0, 2.0, 3.0, 4.0, 5.0]),
        ]);
        let report = check_sensor_health(&f, 5);
        assert_eq!(report[0].status, SensorStatus::Critical);
        assert!(report[0].details.contains("Zero Variance"));
        assert_eq!(report[1].status, SensorStatus::Healthy);
        assert_eq!(report[1].current_value, 5.0);
    }

    #[test]
    fn flatline_takes_precedence_over_missing_rate() {
        // Half the window is missing, but the reported values never move:
        // zero variance wins and the sensor is CRITICAL, not WARNING.
        let f = frame(vec![(
            "sensor_00",
            vec![7.0, f64::NAN, 7.0, f64::NAN, 7.0, f64::NAN],
        )]);
        let report = check_sensor_health(&f, 6);
        assert_eq!(report[0].status, SensorStatus::Critical);
    }

    #[test]
    fn high_missing_rate_without_flatline_is_a_warning() {
        let f = frame(vec![(
            "sensor_00",
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, f64::NAN, f64::NAN],
        )]);
        let report = check_sensor_health(&f, 10);
        assert_eq!(report[0].status, SensorStatus::Warning);
        assert!(report[0].details.contains("Missing"));
    }

    #[test]
    fn lookback_window_only_sees_recent_rows() {
        // Early variation followed by 5 identical readings: with a window
        // of 5 the sensor is currently flatlined.
        let f = frame(vec![(
            "sensor_00",
            vec![1.0, 9.0, 3.0, 10.0, 10.0, 10.0, 10.0, 10.0],
        )]);
        let report = check_sensor_health(&f, 5);
        assert_eq!(report[0].status, SensorStatus::Critical);
    }

    #[test]
    fn quality_score_counts_missing_cells() {
        let f = frame(vec![
            ("sensor_00", vec![1.0, f64::NAN, 3.0, 4.0]),
            ("sensor_01", vec![1.0, 2.0, f64::NAN, f64::NAN]),
        ]);
        let metrics = data_quality_metrics(&f);
        assert_eq!(metrics.total_sensors, 2);
        assert_eq!(metrics.rows, 4);
        assert!((metrics.quality_score - 62.5).abs() < 1e-12);
    }

    #[test]
    fn empty_frame_scores_zero_quality() {
        let metrics = data_quality_metrics(&frame(vec![]));
        assert_eq!(metrics.quality_score, 0.0);
    }
}

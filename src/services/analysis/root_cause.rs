//! Root-cause attribution for a single failure event.
//!
//! Each sensor's event-window mean is compared against its NORMAL-operation
//! baseline and expressed as an unsigned z-shift. Sensors that cannot be
//! scored are reported with an explicit skip reason rather than silently
//! vanishing, so a degenerate baseline is distinguishable from a bug.

use crate::dataset::SensorFrame;
use crate::services::analysis::events::MachineEvent;
use crate::services::analysis::stats;
use serde::Serialize;

pub const DEFAULT_TOP_N: usize = 3;

const BASELINE_STATUS: &str = "NORMAL";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorDeviation {
    pub sensor: String,
    /// Unsigned shift of the event-window mean from the baseline mean, in
    /// baseline standard deviations.
    pub deviation_score: f64,
    pub event_mean: f64,
    pub baseline_mean: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Baseline standard deviation is exactly zero; the shift is undefined.
    ZeroVariance,
    /// Not enough finite samples in the baseline or event window.
    NoFiniteSamples,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSensor {
    pub sensor: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RootCauseAnalysis {
    /// Top contributors, descending by deviation score. May be shorter than
    /// the requested top-N when sensors were skipped.
    pub ranked: Vec<SensorDeviation>,
    pub skipped: Vec<SkippedSensor>,
}

/// Ranks sensors by how far their event-window mean moved from the NORMAL
/// baseline. An empty baseline or an event window containing no rows is a
/// degenerate-but-valid input: the result is simply empty.
pub fn analyze_root_cause(
    frame: &SensorFrame,
    event: &MachineEvent,
    top_n: usize,
) -> RootCauseAnalysis {
    if frame.is_empty() {
        return RootCauseAnalysis::default();
    }

    let baseline_rows: Vec<usize> = frame
        .status
        .iter()
        .enumerate()
        .filter(|(_, s)| s.as_str() == BASELINE_STATUS)
        .map(|(i, _)| i)
        .collect();
    if baseline_rows.is_empty() {
        return RootCauseAnalysis::default();
    }

    // Timestamps are sorted ascending, so the inclusive event window is a
    // contiguous index range.
    let window_start = frame.timestamps.partition_point(|ts| *ts < event.start);
    let window_end = frame.timestamps.partition_point(|ts| *ts <= event.end);
    if window_start >= window_end {
        return RootCauseAnalysis::default();
    }

    let mut ranked = Vec::new();
    let mut skipped = Vec::new();

    for column in &frame.sensors {
        let baseline: Vec<f64> = baseline_rows.iter().map(|&i| column.values[i]).collect();
        let window = &column.values[window_start..window_end];

        let (Some(baseline_mean), Some(baseline_std)) =
            (stats::mean(&baseline), stats::std_sample(&baseline))
        else {
            skipped.push(SkippedSensor {
                sensor: column.name.clone(),
                reason: SkipReason::NoFiniteSamples,
            });
            continue;
        };
        if baseline_std == 0.0 {
            skipped.push(SkippedSensor {
                sensor: column.name.clone(),
                reason: SkipReason::ZeroVariance,
            });
            continue;
        }
        let Some(event_mean) = stats::mean(window) else {
            skipped.push(SkippedSensor {
                sensor: column.name.clone(),
                reason: SkipReason::NoFiniteSamples,
            });
            continue;
        };

        ranked.push(SensorDeviation {
            sensor: column.name.clone(),
            deviation_score: (event_mean - baseline_mean).abs() / baseline_std,
            event_mean,
            baseline_mean,
        });
    }

    ranked.sort_by(|a, b| b.deviation_score.total_cmp(&a.deviation_score));
    ranked.truncate(top_n);

    RootCauseAnalysis { ranked, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::SensorColumn;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, minute, 0).unwrap()
    }

    fn event(start_minute: u32, end_minute: u32) -> MachineEvent {
        MachineEvent {
            start: ts(start_minute),
            end: ts(end_minute),
            duration_mins: (end_minute - start_minute) as f64,
            status: "BROKEN".to_string(),
            max_anomaly_score: 0.0,
        }
    }

    fn frame(columns: Vec<(&str, Vec<f64>)>, status: &[&str]) -> SensorFrame {
        SensorFrame {
            timestamps: (0..status.len() as u32).map(ts).collect(),
            status: status.iter().map(|s| s.to_string()).collect(),
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
    fn empty_dataset_returns_empty_analysis() {
        let result = analyze_root_cause(&SensorFrame::default(), &event(0, 1), DEFAULT_TOP_N);
        assert!(result.ranked.is_empty());
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn missing_baseline_returns_empty_analysis() {
        let f = frame(
            vec![("sensor_00", vec![1.0, 2.0, 3.0])],
            &["BROKEN", "BROKEN", "BROKEN"],
        );
        let result = analyze_root_cause(&f, &event(0, 2), DEFAULT_TOP_N);
        assert!(result.ranked.is_empty());
    }

    #[test]
    fn shifted_sensor_outranks_steady_sensor() {
        // sensor_00 jumps during the event rows; sensor_01 barely moves.
        let f = frame(
            vec![
                ("sensor_00", vec![1.0, 2.0, 1.0, 2.0, 50.0, 52.0]),
                ("sensor_01", vec![10.0, 11.0, 10.0, 11.0, 10.5, 11.5]),
            ],
            &["NORMAL", "NORMAL", "NORMAL", "NORMAL", "BROKEN", "BROKEN"],
        );
        let result = analyze_root_cause(&f, &event(4, 5), DEFAULT_TOP_N);
        assert_eq!(result.ranked.len(), 2);
        assert_eq!(result.ranked[0].sensor, "sensor_00");
        assert!(result.ranked[0].deviation_score > result.ranked[1].deviation_score);
        for entry in &result.ranked {
            assert!(entry.deviation_score >= 0.0);
        }
    }

    #[test]
    fn zero_variance_baseline_is_skipped_with_reason() {
        let f = frame(
            vec![
                ("sensor_00", vec![5.0, 5.0, 5.0, 9.0]),
                ("sensor_01", vec![1.0, 2.0, 3.0, 9.0]),
            ],
            &["NORMAL", "NORMAL", "NORMAL", "BROKEN"],
        );
        let result = analyze_root_cause(&f, &event(3, 3), DEFAULT_TOP_N);
        assert_eq!(result.ranked.len(), 1);
        assert_eq!(result.ranked[0].sensor, "sensor_01");
        assert_eq!(
            result.skipped,
            vec![SkippedSensor {
                sensor: "sensor_00".to_string(),
                reason: SkipReason::ZeroVariance,
            }]
        );
    }

    #[test]
    fn top_n_truncates_the_ranking() {
        let f = frame(
            vec![
                ("sensor_00", vec![1.0, 2.0, 9.0]),
                ("sensor_01", vec![1.0, 2.0, 20.0]),
                ("sensor_02", vec![1.0, 2.0, 50.0]),
            ],
            &["NORMAL", "NORMAL", "BROKEN"],
        );
        let result = analyze_root_cause(&f, &event(2, 2), 1);
        assert_eq!(result.ranked.len(), 1);
        assert_eq!(result.ranked[0].sensor, "sensor_02");
    }
}

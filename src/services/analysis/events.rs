//! Event extraction from the machine-status stream.
//!
//! A single forward scan over the sorted rows: every status change starts a
//! new group, and groups whose status is in the failure set become events.
//! Two failure runs separated by even one row of another status stay
//! separate events; runs are never merged across gaps.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A maximal contiguous run of rows sharing one failure status. Immutable
/// once produced; downstream calculators only read it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineEvent {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_mins: f64,
    pub status: String,
    pub max_anomaly_score: f64,
}

/// Extracts failure events from parallel (timestamp, status, score) columns.
/// Input must be sorted ascending by timestamp. `anomaly_score` may be
/// empty when the frame has not been enriched; scores then report 0.
/// Returns events newest-first by start time. Empty input yields an empty
/// list.
pub fn extract_events(
    timestamps: &[DateTime<Utc>],
    status: &[String],
    anomaly_score: &[f64],
    failure_statuses: &[String],
) -> Vec<MachineEvent> {
    let n = timestamps.len().min(status.len());
    let mut events = Vec::new();
    let mut group_start = 0_usize;

    let flush = |events: &mut Vec<MachineEvent>, start_idx: usize, end_idx: usize| {
        let group_status = &status[start_idx];
        if !failure_statuses.iter().any(|s| s == group_status) {
            return;
        }
        let start = timestamps[start_idx];
        let end = timestamps[end_idx];
        let mut max_score = 0.0_f64;
        for i in start_idx..=end_idx {
            let score = anomaly_score.get(i).copied().unwrap_or(0.0);
            if score.is_finite() && score > max_score {
                max_score = score;
            }
        }
        events.push(MachineEvent {
            start,
            end,
            duration_mins: (end - start).num_seconds() as f64 / 60.0,
            status: group_status.clone(),
            max_anomaly_score: max_score,
        });
    };

    for i in 1..n {
        if status[i] != status[i - 1] {
            flush(&mut events, group_start, i - 1);
            group_start = i;
        }
    }
    if n > 0 {
        flush(&mut events, group_start, n - 1);
    }

    // Newest first for display; the scan itself emits oldest first.
    events.reverse();
    events
}

//! Reliability statistics derived from the extracted event list.

use crate::error::{AnalysisError, AnalysisResult};
use crate::services::analysis::events::MachineEvent;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReliabilityMetrics {
    pub mtbf_hours: f64,
    pub mttr_minutes: f64,
    pub num_failures: usize,
    pub total_downtime_hours: f64,
}

/// MTBF/MTTR over the failure subset of `events`. A machine with no
/// failures is a valid steady state: MTBF reports +infinity and MTTR zero.
///
/// `total_duration_hours` is the span of the observed dataset, supplied by
/// the caller rather than derived from events. If recorded downtime exceeds
/// that window the inputs are inconsistent and the call fails instead of
/// producing a negative MTBF.
pub fn calculate_reliability(
    events: &[MachineEvent],
    total_duration_hours: f64,
    failure_statuses: &[String],
) -> AnalysisResult<ReliabilityMetrics> {
    let failures: Vec<&MachineEvent> = events
        .iter()
        .filter(|e| failure_statuses.iter().any(|s| s == &e.status))
        .collect();
    let num_failures = failures.len();

    if num_failures == 0 {
        return Ok(ReliabilityMetrics {
            mtbf_hours: f64::INFINITY,
            mttr_minutes: 0.0,
            num_failures: 0,
            total_downtime_hours: 0.0,
        });
    }

    let total_downtime_hours: f64 = failures.iter().map(|e| e.duration_mins).sum::<f64>() / 60.0;
    if total_downtime_hours > total_duration_hours {
        return Err(AnalysisError::downtime_exceeds_window(
            total_downtime_hours,
            total_duration_hours,
        ));
    }

    let total_uptime_hours = total_duration_hours - total_downtime_hours;
    Ok(ReliabilityMetrics {
        mtbf_hours: total_uptime_hours / num_failures as f64,
        mttr_minutes: (total_downtime_hours / num_failures as f64) * 60.0,
        num_failures,
        total_downtime_hours,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemHealthMetrics {
    pub uptime_pct: f64,
    pub total_failures: usize,
    pub recovery_events: usize,
}

/// Row-level health summary straight off the status column: share of rows
/// spent outside BROKEN/RECOVERING plus the raw counts of each.
pub fn system_health_metrics(status: &[String]) -> SystemHealthMetrics {
    let total = status.len();
    let broken = status.iter().filter(|s| s.as_str() == "BROKEN").count();
    let recovering = status.iter().filter(|s| s.as_str() == "RECOVERING").count();
    let uptime_pct = if total == 0 {
        0.0
    } else {
        ((total - broken - recovering) as f64 / total as f64) * 100.0
    };
    SystemHealthMetrics {
        uptime_pct,
        total_failures: broken,
        recovery_events: recovering,
    }
}

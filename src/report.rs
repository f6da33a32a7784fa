//! Assembly of the full insights report consumed by the presentation layer.
//! The core computes records; it never renders anything.

use crate::config::AppConfig;
use crate::error::AnalysisResult;
use crate::services::analysis::events::MachineEvent;
use crate::services::analysis::quality::{DataQualityMetrics, SensorHealthRecord};
use crate::services::analysis::reliability::{ReliabilityMetrics, SystemHealthMetrics};
use crate::services::analysis::root_cause::RootCauseAnalysis;
use crate::services::analysis::{impact, quality, reliability, root_cause, stats, EnrichedFrame};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct EventReport {
    #[serde(flatten)]
    pub event: MachineEvent,
    pub cost: f64,
}

/// Pairwise Pearson correlations between sensor columns. `matrix[i][j]`
/// correlates `sensors[i]` with `sensors[j]`; cells that cannot be computed
/// (a flatlined sensor) are null.
#[derive(Debug, Clone, Serialize)]
pub struct SensorCorrelations {
    pub sensors: Vec<String>,
    pub matrix: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InsightsReport {
    pub system_health: SystemHealthMetrics,
    pub reliability: ReliabilityMetrics,
    pub total_financial_risk: f64,
    pub cost_per_minute: f64,
    /// Newest-first failure events with their individual cost impact.
    pub events: Vec<EventReport>,
    pub sensor_health: Vec<SensorHealthRecord>,
    pub data_quality: DataQualityMetrics,
    pub sensor_correlations: SensorCorrelations,
    /// Rows whose anomaly score sits more than the configured number of
    /// standard deviations above the mean score.
    pub high_anomaly_rows: usize,
    /// Root-cause ranking for the most recent event, when one exists.
    pub root_cause: Option<RootCauseAnalysis>,
}

fn sensor_correlations(frame: &crate::dataset::SensorFrame) -> SensorCorrelations {
    let columns: Vec<&[f64]> = frame.sensors.iter().map(|c| c.values.as_slice()).collect();
    SensorCorrelations {
        sensors: frame.sensor_names(),
        matrix: stats::correlation_matrix(&columns),
    }
}

fn count_high_anomaly_rows(anomaly_score: &[f64], threshold_std: f64) -> usize {
    let (Some(mu), Some(sigma)) = (
        crate::services::analysis::stats::mean(anomaly_score),
        crate::services::analysis::stats::std_population(anomaly_score),
    ) else {
        return 0;
    };
    let cutoff = mu + threshold_std * sigma;
    anomaly_score
        .iter()
        .filter(|s| s.is_finite() && **s > cutoff)
        .count()
}

/// Runs every calculator over an already-enriched frame. Pure and
/// deterministic; callers re-run it freely against a cached frame.
pub fn build_report(
    enriched: &EnrichedFrame,
    config: &AppConfig,
    top_n: usize,
) -> AnalysisResult<InsightsReport> {
    let events = enriched.extract_events(&config.failure_statuses);
    let reliability = reliability::calculate_reliability(
        &events,
        enriched.frame.span_hours(),
        &config.failure_statuses,
    )?;
    let total_financial_risk = impact::estimate_financial_risk(&events, config.cost_per_minute);
    let root_cause = events
        .first()
        .map(|event| root_cause::analyze_root_cause(&enriched.frame, event, top_n));

    Ok(InsightsReport {
        system_health: reliability::system_health_metrics(&enriched.frame.status),
        reliability,
        total_financial_risk,
        cost_per_minute: config.cost_per_minute,
        events: events
            .into_iter()
            .map(|event| EventReport {
                cost: impact::event_cost(&event, config.cost_per_minute),
                event,
            })
            .collect(),
        sensor_health: quality::check_sensor_health(&enriched.frame, config.lookback_window),
        data_quality: quality::data_quality_metrics(&enriched.frame),
        sensor_correlations: sensor_correlations(&enriched.frame),
        high_anomaly_rows: count_high_anomaly_rows(
            &enriched.anomaly_score,
            config.anomaly_threshold_std,
        ),
        root_cause,
    })
}

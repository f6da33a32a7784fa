//! Analytical core: scaling/projection, event extraction, reliability,
//! root-cause attribution, data quality and financial impact.
//!
//! Everything here is synchronous, deterministic batch computation over an
//! in-memory frame. The enriched frame is produced once per dataset version
//! by [`enrich`] and treated as immutable by every consumer.

pub mod cache;
pub mod events;
pub mod impact;
pub mod pca;
pub mod quality;
pub mod reliability;
pub mod root_cause;
pub mod stats;

use crate::dataset::SensorFrame;
use crate::error::AnalysisResult;

/// A sensor frame plus the derived health coordinates and anomaly score.
#[derive(Debug, Clone)]
pub struct EnrichedFrame {
    pub frame: SensorFrame,
    pub pca_1: Vec<f64>,
    pub pca_2: Vec<f64>,
    pub anomaly_score: Vec<f64>,
}

impl EnrichedFrame {
    pub fn len(&self) -> usize {
        self.frame.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }

    pub fn fingerprint(&self) -> u64 {
        self.frame.fingerprint()
    }

    /// Extracts failure events from this frame's status and score columns.
    pub fn extract_events(&self, failure_statuses: &[String]) -> Vec<events::MachineEvent> {
        events::extract_events(
            &self.frame.timestamps,
            &self.frame.status,
            &self.anomaly_score,
            failure_statuses,
        )
    }
}

/// The explicit batch recomputation step: fit the scaler and projection on
/// the full frame and append the derived columns. There is no incremental
/// path; call this once per dataset version and cache the result.
///
/// The frame must be gap-filled with dead columns dropped; a remaining
/// zero-variance or missing sensor column fails the whole enrichment.
pub fn enrich(frame: SensorFrame) -> AnalysisResult<EnrichedFrame> {
    let model = pca::fit(&frame)?;
    let projection = pca::transform(&model, &frame);
    Ok(EnrichedFrame {
        frame,
        pca_1: projection.pca_1,
        pca_2: projection.pca_2,
        anomaly_score: projection.anomaly_score,
    })
}

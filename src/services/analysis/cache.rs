//! Explicit cache for enriched frames, keyed by dataset fingerprint.
//!
//! Enrichment is the expensive step, so repeated analytical queries against
//! the same dataset version reuse one enriched frame. Invalidation is
//! explicit; there is no hidden memoization.

use crate::dataset::SensorFrame;
use crate::error::AnalysisResult;
use crate::services::analysis::{enrich, EnrichedFrame};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct EnrichedCache {
    entries: HashMap<u64, Arc<EnrichedFrame>>,
}

impl EnrichedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, fingerprint: u64) -> Option<Arc<EnrichedFrame>> {
        self.entries.get(&fingerprint).cloned()
    }

    /// Returns the cached enrichment for this frame's content, running the
    /// batch fit only on a miss. Two frames with identical content share
    /// one entry regardless of how they were loaded.
    pub fn get_or_enrich(&mut self, frame: SensorFrame) -> AnalysisResult<Arc<EnrichedFrame>> {
        let fingerprint = frame.fingerprint();
        if let Some(existing) = self.entries.get(&fingerprint) {
            return Ok(existing.clone());
        }
        tracing::debug!(fingerprint, "enriched cache miss; running batch fit");
        let enriched = Arc::new(enrich(frame)?);
        self.entries.insert(fingerprint, enriched.clone());
        Ok(enriched)
    }

    pub fn invalidate(&mut self, fingerprint: u64) -> bool {
        self.entries.remove(&fingerprint).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

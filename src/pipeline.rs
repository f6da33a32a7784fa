//! The offline ETL pipeline: raw sensor CSV in, enriched Parquet out.

use crate::dataset::SensorFrame;
use crate::lake;
use crate::services::analysis::{enrich, EnrichedFrame};
use anyhow::{Context, Result};
use std::path::PathBuf;

pub struct EtlPipeline {
    input_path: PathBuf,
    output_path: PathBuf,
}

impl EtlPipeline {
    pub fn new(input_path: PathBuf, output_path: PathBuf) -> Self {
        Self {
            input_path,
            output_path,
        }
    }

    /// Loads, cleans and enriches the raw dataset, persists it, and hands
    /// the enriched frame back for immediate analysis.
    pub fn run(&self) -> Result<EnrichedFrame> {
        tracing::info!(path = %self.input_path.display(), "loading raw sensor data");
        let mut frame = SensorFrame::from_csv_path(&self.input_path)
            .with_context(|| format!("failed to load {}", self.input_path.display()))?;
        tracing::info!(
            rows = frame.len(),
            sensors = frame.sensors.len(),
            "initial dataset shape"
        );

        frame.fill_gaps();
        frame.drop_empty_sensor_columns();

        tracing::info!(sensors = frame.sensors.len(), "running scaler + PCA fit");
        let enriched = enrich(frame).context("enrichment failed")?;

        lake::write_enriched(&enriched, &self.output_path)?;
        tracing::info!("pipeline finished");
        Ok(enriched)
    }
}

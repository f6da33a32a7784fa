use crate::services::analysis::root_cause::DEFAULT_TOP_N;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "sensorflow-core",
    version,
    about = "Industrial sensor telemetry reliability analytics"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the ETL pipeline: raw sensor CSV -> enriched Parquet dataset.
    Etl {
        /// Raw sensor CSV (timestamp, machine_status, sensor_* columns).
        #[arg(long, default_value = "sensor.csv")]
        input: PathBuf,
        /// Enriched Parquet output path.
        #[arg(long, default_value = "processed_data.parquet")]
        output: PathBuf,
    },
    /// Build the full insights report from an enriched dataset and print it
    /// as JSON on stdout.
    Report {
        /// Enriched Parquet dataset written by `etl`.
        #[arg(long, default_value = "processed_data.parquet")]
        data: PathBuf,
        /// Override the configured downtime cost rate ($/minute).
        #[arg(long)]
        cost_per_minute: Option<f64>,
        /// Number of sensors in the root-cause ranking.
        #[arg(long, default_value_t = DEFAULT_TOP_N)]
        top_n: usize,
        /// Override the configured sensor-health lookback window (rows).
        #[arg(long)]
        lookback_window: Option<usize>,
    },
}

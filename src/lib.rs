//! Offline analytics for industrial sensor telemetry: a 2D health-space
//! projection with a scalar anomaly score, failure event extraction,
//! MTBF/MTTR reliability statistics, root-cause attribution against a
//! learned baseline, data quality monitoring, and downtime cost estimation.
//!
//! The crate consumes a tabular dataset (timestamp, machine status and
//! sensor columns) and produces plain serializable records; loading UIs and
//! dashboards are external collaborators.

pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod lake;
pub mod pipeline;
pub mod report;
pub mod services;

use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_CONFIG_PATH: &str = "config.json";

pub(crate) fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("SENSORFLOW_CONFIG_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

fn default_cost_per_minute() -> f64 {
    500.0
}

fn default_anomaly_threshold_std() -> f64 {
    2.0
}

fn default_lookback_window() -> usize {
    crate::services::analysis::quality::DEFAULT_LOOKBACK_WINDOW
}

fn default_failure_statuses() -> Vec<String> {
    vec!["BROKEN".to_string(), "RECOVERING".to_string()]
}

/// Business and ETL tuning knobs. Every field has a default so a missing or
/// partial config file never blocks the pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_cost_per_minute")]
    pub cost_per_minute: f64,
    #[serde(default = "default_anomaly_threshold_std")]
    pub anomaly_threshold_std: f64,
    #[serde(default = "default_lookback_window")]
    pub lookback_window: usize,
    #[serde(default = "default_failure_statuses")]
    pub failure_statuses: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cost_per_minute: default_cost_per_minute(),
            anomaly_threshold_std: default_anomaly_threshold_std(),
            lookback_window: default_lookback_window(),
            failure_statuses: default_failure_statuses(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from the resolved config path. Any read or parse
    /// failure falls back to defaults with a warning; the analysis core must
    /// stay usable on a bare checkout.
    pub fn load() -> Self {
        let path = config_path();
        if !path.exists() {
            return Self::default();
        }
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; using defaults"
                );
                return Self::default();
            }
        };
        match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to parse config; using defaults"
                );
                Self::default()
            }
        }
    }

    pub fn is_failure_status(&self, status: &str) -> bool {
        self.failure_statuses.iter().any(|s| s == status)
    }
}

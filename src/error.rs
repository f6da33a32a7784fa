use std::fmt::{self, Display};

/// Structured error for input-shape problems that abort analysis of a
/// dataset. Degenerate-but-valid data (no failures, empty baselines) is
/// never reported through this type; those cases produce sentinel results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisError {
    pub code: String,
    pub message: String,
}

impl AnalysisError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn no_sensor_columns() -> Self {
        Self::new(
            "no_sensor_columns",
            "dataset contains no sensor columns to analyze",
        )
    }

    pub fn zero_variance_column(name: &str) -> Self {
        Self::new(
            "zero_variance_column",
            format!("sensor column '{name}' has zero variance; exclude it before scaling"),
        )
    }

    pub fn missing_column(name: &str) -> Self {
        Self::new(
            "missing_column",
            format!("required column '{name}' is missing from the dataset"),
        )
    }

    pub fn downtime_exceeds_window(downtime_hours: f64, window_hours: f64) -> Self {
        Self::new(
            "downtime_exceeds_window",
            format!(
                "total downtime ({downtime_hours:.2}h) exceeds the observed window ({window_hours:.2}h)"
            ),
        )
    }
}

impl Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for AnalysisError {}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

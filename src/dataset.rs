use crate::error::AnalysisError;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::path::Path;
use xxhash_rust::xxh3::Xxh3;

pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const STATUS_COLUMN: &str = "machine_status";

/// Header substring that marks a numeric sensor column.
pub const SENSOR_COLUMN_MARKER: &str = "sensor";

/// Day-first formats are tried before ISO ones: source exports write
/// `25/03/2024 14:00` style timestamps.
const TIMESTAMP_FORMATS: [&str; 7] = [
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

#[derive(Debug, Clone)]
pub struct SensorColumn {
    pub name: String,
    /// Missing readings are encoded as NaN until gap filling runs.
    pub values: Vec<f64>,
}

/// In-memory columnar dataset: one timestamp and machine-status entry per
/// row plus N named sensor columns of equal length.
#[derive(Debug, Clone, Default)]
pub struct SensorFrame {
    pub timestamps: Vec<DateTime<Utc>>,
    pub status: Vec<String>,
    pub sensors: Vec<SensorColumn>,
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
        }
    }
    None
}

fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

fn parse_reading(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

impl SensorFrame {
    /// Loads a raw sensor CSV. Headers are normalized to lowercase with
    /// underscores; unnamed index columns (`Unnamed: 0` exports) are
    /// stripped; rows with unparseable timestamps are dropped; the frame is
    /// sorted ascending by timestamp before it is returned.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("failed to open {}", path.display()))?;

        let headers: Vec<String> = reader
            .headers()
            .context("failed to read CSV header row")?
            .iter()
            .map(normalize_header)
            .collect();

        let timestamp_idx = headers
            .iter()
            .position(|h| h == TIMESTAMP_COLUMN)
            .ok_or_else(|| AnalysisError::missing_column(TIMESTAMP_COLUMN))?;
        let status_idx = headers
            .iter()
            .position(|h| h == STATUS_COLUMN)
            .ok_or_else(|| AnalysisError::missing_column(STATUS_COLUMN))?;

        let sensor_indices: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.contains(SENSOR_COLUMN_MARKER) && !h.contains("unnamed"))
            .map(|(idx, h)| (idx, h.clone()))
            .collect();

        let mut frame = SensorFrame {
            timestamps: Vec::new(),
            status: Vec::new(),
            sensors: sensor_indices
                .iter()
                .map(|(_, name)| SensorColumn {
                    name: name.clone(),
                    values: Vec::new(),
                })
                .collect(),
        };

        let mut dropped_rows = 0_u64;
        for record in reader.records() {
            let record = record.context("failed to read CSV record")?;
            let Some(ts) = record.get(timestamp_idx).and_then(parse_timestamp) else {
                dropped_rows += 1;
                continue;
            };
            frame.timestamps.push(ts);
            frame
                .status
                .push(record.get(status_idx).unwrap_or("").trim().to_string());
            for (column, (idx, _)) in frame.sensors.iter_mut().zip(sensor_indices.iter()) {
                column
                    .values
                    .push(record.get(*idx).map(parse_reading).unwrap_or(f64::NAN));
            }
        }

        if dropped_rows > 0 {
            tracing::warn!(dropped_rows, "dropped rows with unparseable timestamps");
        }

        frame.sort_ascending_by_timestamp();
        Ok(frame)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn sensor_names(&self) -> Vec<String> {
        self.sensors.iter().map(|c| c.name.clone()).collect()
    }

    pub fn sensor(&self, name: &str) -> Option<&SensorColumn> {
        self.sensors.iter().find(|c| c.name == name)
    }

    /// Span of the dataset in hours, first to last timestamp. Zero when the
    /// frame has fewer than two rows.
    pub fn span_hours(&self) -> f64 {
        match (self.timestamps.first(), self.timestamps.last()) {
            (Some(first), Some(last)) => (*last - *first).num_seconds() as f64 / 3600.0,
            _ => 0.0,
        }
    }

    /// Stable sort of all columns by ascending timestamp. Event extraction
    /// and window slicing are undefined on unsorted data, so every ingest
    /// path runs this.
    pub fn sort_ascending_by_timestamp(&mut self) {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by_key(|&i| self.timestamps[i]);
        if order.iter().enumerate().all(|(pos, &i)| pos == i) {
            return;
        }
        self.timestamps = order.iter().map(|&i| self.timestamps[i]).collect();
        self.status = order.iter().map(|&i| self.status[i].clone()).collect();
        for column in &mut self.sensors {
            column.values = order.iter().map(|&i| column.values[i]).collect();
        }
    }

    /// Forward-fill then backward-fill NaN gaps in every sensor column.
    /// Sensors hold their last reading across short dropouts; leading gaps
    /// take the first real reading.
    pub fn fill_gaps(&mut self) {
        for column in &mut self.sensors {
            let mut last = f64::NAN;
            for value in column.values.iter_mut() {
                if value.is_nan() {
                    *value = last;
                } else {
                    last = *value;
                }
            }
            let mut next = f64::NAN;
            for value in column.values.iter_mut().rev() {
                if value.is_nan() {
                    *value = next;
                } else {
                    next = *value;
                }
            }
        }
    }

    /// Drops sensor columns that are entirely NaN (dead sensors that gap
    /// filling could not recover). Returns the dropped column names.
    pub fn drop_empty_sensor_columns(&mut self) -> Vec<String> {
        let mut dropped = Vec::new();
        self.sensors.retain(|column| {
            let all_nan = column.values.iter().all(|v| v.is_nan());
            if all_nan {
                dropped.push(column.name.clone());
            }
            !all_nan
        });
        if !dropped.is_empty() {
            tracing::warn!(columns = ?dropped, "dropped fully-empty sensor columns");
        }
        dropped
    }

    /// Content fingerprint used as the cache key for derived artifacts.
    /// Covers timestamps, statuses, sensor names and readings, so any edit
    /// to the dataset produces a different identity.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Xxh3::new();
        for ts in &self.timestamps {
            hasher.update(&ts.timestamp_micros().to_le_bytes());
        }
        for status in &self.status {
            hasher.update(status.as_bytes());
            hasher.update(&[0]);
        }
        for column in &self.sensors {
            hasher.update(column.name.as_bytes());
            hasher.update(&[0]);
            for value in &column.values {
                hasher.update(&value.to_bits().to_le_bytes());
            }
        }
        hasher.digest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn frame_from_csv(contents: &str) -> SensorFrame {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        SensorFrame::from_csv_path(file.path()).unwrap()
    }

    #[test]
    fn day_first_timestamps_win_over_month_first() {
        let ts = parse_timestamp("02/03/2024 10:30").unwrap();
        assert_eq!(ts.to_string(), "2024-03-02 10:30:00 UTC");
    }

    #[test]
    fn iso_timestamps_parse_too() {
        assert!(parse_timestamp("2024-03-02 10:30:00").is_some());
        assert!(parse_timestamp("2024-03-02T10:30:00").is_some());
        assert!(parse_timestamp("not a date").is_none());
    }

    #[test]
    fn csv_ingest_strips_unnamed_columns_and_sorts() {
        let frame = frame_from_csv(
            "Unnamed: 0,timestamp,sensor_00,machine_status\n\
             1,2024-01-01 02:00:00,2.0,NORMAL\n\
             0,2024-01-01 01:00:00,1.0,NORMAL\n",
        );
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.sensor_names(), vec!["sensor_00"]);
        assert_eq!(frame.sensors[0].values, vec![1.0, 2.0]);
        assert!(frame.timestamps[0] < frame.timestamps[1]);
    }

    #[test]
    fn missing_required_columns_carry_a_branchable_code() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"timestamp,sensor_00\n2024-01-01 01:00:00,1.0\n")
            .unwrap();
        let err = SensorFrame::from_csv_path(file.path()).unwrap_err();
        let analysis = err.downcast_ref::<AnalysisError>().unwrap();
        assert_eq!(analysis.code, "missing_column");
        assert!(analysis.message.contains(STATUS_COLUMN));
    }

    #[test]
    fn rows_with_bad_timestamps_are_dropped_not_fatal() {
        let frame = frame_from_csv(
            "timestamp,sensor_00,machine_status\n\
             garbage,1.0,NORMAL\n\
             2024-01-01 01:00:00,2.0,NORMAL\n",
        );
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.sensors[0].values, vec![2.0]);
    }

    #[test]
    fn fill_gaps_runs_forward_then_backward() {
        let mut frame = SensorFrame {
            timestamps: vec![],
            status: vec![],
            sensors: vec![SensorColumn {
                name: "sensor_00".to_string(),
                values: vec![f64::NAN, 1.0, f64::NAN, f64::NAN, 4.0, f64::NAN],
            }],
        };
        frame.fill_gaps();
        assert_eq!(frame.sensors[0].values, vec![1.0, 1.0, 1.0, 1.0, 4.0, 4.0]);
    }

    #[test]
    fn fully_empty_sensor_columns_are_dropped() {
        let mut frame = SensorFrame {
            timestamps: vec![],
            status: vec![],
            sensors: vec![
                SensorColumn {
                    name: "sensor_00".to_string(),
                    values: vec![f64::NAN, f64::NAN],
                },
                SensorColumn {
                    name: "sensor_01".to_string(),
                    values: vec![1.0, f64::NAN],
                },
            ],
        };
        let dropped = frame.drop_empty_sensor_columns();
        assert_eq!(dropped, vec!["sensor_00"]);
        assert_eq!(frame.sensor_names(), vec!["sensor_01"]);
    }

    #[test]
    fn fingerprint_changes_when_a_reading_changes() {
        let frame = frame_from_csv(
            "timestamp,sensor_00,machine_status\n\
             2024-01-01 01:00:00,1.0,NORMAL\n",
        );
        let mut edited = frame.clone();
        edited.sensors[0].values[0] = 2.0;
        assert_ne!(frame.fingerprint(), edited.fingerprint());
    }
}

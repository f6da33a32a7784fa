//! On-disk persistence for the enriched dataset.
//!
//! The enriched frame is written as a single Parquet file so downstream
//! sessions can reload it without refitting. Writes stage through a CSV
//! file that DuckDB copies into Parquet; reads go through `read_parquet`
//! with an `ORDER BY timestamp` so the core always sees ascending rows
//! regardless of on-disk order.

use crate::dataset::{SensorColumn, SensorFrame, STATUS_COLUMN, TIMESTAMP_COLUMN};
use crate::services::analysis::EnrichedFrame;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::Connection;
use std::path::Path;

pub const PCA_1_COLUMN: &str = "PCA_1";
pub const PCA_2_COLUMN: &str = "PCA_2";
pub const ANOMALY_SCORE_COLUMN: &str = "anomaly_score";

// Microsecond precision: ingest accepts fractional-second timestamps and
// the round trip must not truncate them.
const STAGING_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

fn escape_single_quotes(input: &str) -> String {
    input.replace('\'', "''")
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn open_connection() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    let _ = conn.execute("PRAGMA threads=2", []);
    let _ = conn.execute("PRAGMA enable_progress_bar=false", []);
    Ok(conn)
}

fn format_value(value: f64) -> String {
    if value.is_finite() {
        format!("{value}")
    } else {
        // NULL in the staging CSV; comes back as NaN on read.
        String::new()
    }
}

/// Writes the enriched frame to `path` as Parquet. Schema: `timestamp`
/// (TIMESTAMP), `machine_status` (VARCHAR), every sensor column plus
/// `PCA_1`, `PCA_2`, `anomaly_score` (DOUBLE).
pub fn write_enriched(enriched: &EnrichedFrame, path: &Path) -> Result<()> {
    let staging_path = path.with_extension("staging.csv");

    let mut header: Vec<String> = vec![TIMESTAMP_COLUMN.to_string(), STATUS_COLUMN.to_string()];
    header.extend(enriched.frame.sensor_names());
    header.push(PCA_1_COLUMN.to_string());
    header.push(PCA_2_COLUMN.to_string());
    header.push(ANOMALY_SCORE_COLUMN.to_string());

    {
        let mut writer = csv::Writer::from_path(&staging_path)
            .with_context(|| format!("failed to create {}", staging_path.display()))?;
        writer.write_record(&header)?;
        for row in 0..enriched.len() {
            let mut record: Vec<String> = Vec::with_capacity(header.len());
            record.push(
                enriched.frame.timestamps[row]
                    .format(STAGING_TIMESTAMP_FORMAT)
                    .to_string(),
            );
            record.push(enriched.frame.status[row].clone());
            for column in &enriched.frame.sensors {
                record.push(format_value(column.values[row]));
            }
            record.push(format_value(enriched.pca_1[row]));
            record.push(format_value(enriched.pca_2[row]));
            record.push(format_value(enriched.anomaly_score[row]));
            writer.write_record(&record)?;
        }
        writer.flush()?;
    }

    let columns_spec = header
        .iter()
        .map(|name| {
            let kind = if name == TIMESTAMP_COLUMN {
                "TIMESTAMP"
            } else if name == STATUS_COLUMN {
                "VARCHAR"
            } else {
                "DOUBLE"
            };
            format!("'{}': '{}'", escape_single_quotes(name), kind)
        })
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!(
        "COPY (SELECT * FROM read_csv('{staging}', header=true, columns={{{columns_spec}}})) \
         TO '{target}' (FORMAT PARQUET)",
        staging = escape_single_quotes(&staging_path.display().to_string()),
        target = escape_single_quotes(&path.display().to_string()),
    );

    let conn = open_connection()?;
    let copy_result = conn
        .execute(&sql, [])
        .with_context(|| format!("failed to write {}", path.display()));
    let _ = std::fs::remove_file(&staging_path);
    copy_result?;

    tracing::info!(
        path = %path.display(),
        rows = enriched.len(),
        sensors = enriched.frame.sensors.len(),
        "wrote enriched dataset"
    );
    Ok(())
}

/// Loads an enriched frame previously written by [`write_enriched`]. Rows
/// come back sorted ascending by timestamp; NULL readings come back as NaN.
pub fn read_enriched(path: &Path) -> Result<EnrichedFrame> {
    anyhow::ensure!(path.exists(), "enriched dataset not found: {}", path.display());
    let conn = open_connection()?;
    let path_sql = escape_single_quotes(&path.display().to_string());

    let mut columns: Vec<String> = Vec::new();
    {
        let mut stmt = conn.prepare(&format!(
            "DESCRIBE SELECT * FROM read_parquet('{path_sql}')"
        ))?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let name: String = row.get(0)?;
            columns.push(name);
        }
    }

    for required in [
        TIMESTAMP_COLUMN,
        STATUS_COLUMN,
        PCA_1_COLUMN,
        PCA_2_COLUMN,
        ANOMALY_SCORE_COLUMN,
    ] {
        anyhow::ensure!(
            columns.iter().any(|c| c == required),
            "enriched dataset is missing the '{required}' column"
        );
    }

    let sensor_names: Vec<String> = columns
        .iter()
        .filter(|c| c.contains(crate::dataset::SENSOR_COLUMN_MARKER))
        .cloned()
        .collect();

    let mut select_list: Vec<String> = vec![
        quote_identifier(TIMESTAMP_COLUMN),
        quote_identifier(STATUS_COLUMN),
    ];
    select_list.extend(sensor_names.iter().map(|n| quote_identifier(n)));
    select_list.push(quote_identifier(PCA_1_COLUMN));
    select_list.push(quote_identifier(PCA_2_COLUMN));
    select_list.push(quote_identifier(ANOMALY_SCORE_COLUMN));

    let sql = format!(
        "SELECT {} FROM read_parquet('{path_sql}') ORDER BY {}",
        select_list.join(", "),
        quote_identifier(TIMESTAMP_COLUMN),
    );

    let mut frame = SensorFrame {
        timestamps: Vec::new(),
        status: Vec::new(),
        sensors: sensor_names
            .iter()
            .map(|name| SensorColumn {
                name: name.clone(),
                values: Vec::new(),
            })
            .collect(),
    };
    let mut pca_1 = Vec::new();
    let mut pca_2 = Vec::new();
    let mut anomaly_score = Vec::new();

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let n_sensors = sensor_names.len();
    while let Some(row) = rows.next()? {
        let ts: NaiveDateTime = row.get(0)?;
        frame
            .timestamps
            .push(DateTime::<Utc>::from_naive_utc_and_offset(ts, Utc));
        frame.status.push(row.get::<_, Option<String>>(1)?.unwrap_or_default());
        for (offset, column) in frame.sensors.iter_mut().enumerate() {
            let value: Option<f64> = row.get(2 + offset)?;
            column.values.push(value.unwrap_or(f64::NAN));
        }
        pca_1.push(row.get::<_, Option<f64>>(2 + n_sensors)?.unwrap_or(f64::NAN));
        pca_2.push(row.get::<_, Option<f64>>(3 + n_sensors)?.unwrap_or(f64::NAN));
        anomaly_score.push(row.get::<_, Option<f64>>(4 + n_sensors)?.unwrap_or(f64::NAN));
    }

    tracing::info!(
        path = %path.display(),
        rows = frame.len(),
        sensors = n_sensors,
        "loaded enriched dataset"
    );

    Ok(EnrichedFrame {
        frame,
        pca_1,
        pca_2,
        anomaly_score,
    })
}

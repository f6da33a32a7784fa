//! Feature scaling and 2-component PCA over the sensor columns.
//!
//! The fit is a batch operation over the full dataset: standardize every
//! column to zero mean / unit variance (population statistics), then
//! eigendecompose the covariance matrix of the standardized data with a
//! cyclic Jacobi sweep. No randomness anywhere, so refitting unchanged
//! input reproduces the projection bit-for-bit.

use crate::dataset::SensorFrame;
use crate::error::{AnalysisError, AnalysisResult};
use crate::services::analysis::stats;

const JACOBI_MAX_SWEEPS: usize = 100;
const JACOBI_OFF_DIAGONAL_EPS: f64 = 1e-18;

/// Fitted scaler + projection. Valid only for the exact column set and row
/// set it was fit on; any dataset change requires a full refit.
#[derive(Debug, Clone)]
pub struct PcaModel {
    pub columns: Vec<String>,
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
    /// Unit-length principal directions, ordered by descending explained
    /// variance. Sign-fixed so the largest-magnitude loading is positive.
    pub components: [Vec<f64>; 2],
    pub explained_variance: [f64; 2],
}

/// Per-row projection output.
#[derive(Debug, Clone)]
pub struct Projection {
    pub pca_1: Vec<f64>,
    pub pca_2: Vec<f64>,
    pub anomaly_score: Vec<f64>,
}

/// Fits the scaler and 2-component projection on the full frame. The frame
/// must already be gap-filled; zero-variance columns are an input-shape
/// error the caller has to resolve by excluding them.
pub fn fit(frame: &SensorFrame) -> AnalysisResult<PcaModel> {
    if frame.sensors.is_empty() {
        return Err(AnalysisError::no_sensor_columns());
    }
    if frame.sensors.len() < 2 {
        return Err(AnalysisError::new(
            "insufficient_sensor_columns",
            "at least two sensor columns are required for a 2-component projection",
        ));
    }

    let mut means = Vec::with_capacity(frame.sensors.len());
    let mut stds = Vec::with_capacity(frame.sensors.len());
    for column in &frame.sensors {
        let mu = stats::mean(&column.values)
            .ok_or_else(|| AnalysisError::zero_variance_column(&column.name))?;
        let sigma = stats::std_population(&column.values)
            .ok_or_else(|| AnalysisError::zero_variance_column(&column.name))?;
        if sigma == 0.0 {
            return Err(AnalysisError::zero_variance_column(&column.name));
        }
        means.push(mu);
        stds.push(sigma);
    }

    let n_rows = frame.sensors[0].values.len();
    let n_cols = frame.sensors.len();
    let divisor = if n_rows > 1 { (n_rows - 1) as f64 } else { 1.0 };

    // Covariance of the standardized columns. Tens of sensors at most, so
    // the dense d x d matrix is cheap next to the row scan.
    let mut cov = vec![vec![0.0_f64; n_cols]; n_cols];
    for row in 0..n_rows {
        for i in 0..n_cols {
            let zi = (frame.sensors[i].values[row] - means[i]) / stds[i];
            for j in i..n_cols {
                let zj = (frame.sensors[j].values[row] - means[j]) / stds[j];
                cov[i][j] += zi * zj;
            }
        }
    }
    for i in 0..n_cols {
        for j in i..n_cols {
            cov[i][j] /= divisor;
            cov[j][i] = cov[i][j];
        }
    }

    let (eigenvalues, eigenvectors) = jacobi_eigen(cov);
    let mut order: Vec<usize> = (0..n_cols).collect();
    order.sort_by(|&a, &b| eigenvalues[b].total_cmp(&eigenvalues[a]));

    let mut components: [Vec<f64>; 2] = [Vec::new(), Vec::new()];
    let mut explained = [0.0_f64; 2];
    for (slot, &col) in order.iter().take(2).enumerate() {
        let mut direction: Vec<f64> = (0..n_cols).map(|row| eigenvectors[row][col]).collect();
        fix_sign(&mut direction);
        components[slot] = direction;
        explained[slot] = eigenvalues[col];
    }

    Ok(PcaModel {
        columns: frame.sensor_names(),
        means,
        stds,
        components,
        explained_variance: explained,
    })
}

/// Projects every row of the frame through the fitted model. Panics are
/// avoided by construction: the model is only ever applied to the frame it
/// was fit on (same columns, same order).
pub fn transform(model: &PcaModel, frame: &SensorFrame) -> Projection {
    let n_rows = frame
        .sensors
        .first()
        .map(|c| c.values.len())
        .unwrap_or_default();
    let n_cols = model.columns.len();
    let mut pca_1 = Vec::with_capacity(n_rows);
    let mut pca_2 = Vec::with_capacity(n_rows);
    let mut anomaly_score = Vec::with_capacity(n_rows);

    for row in 0..n_rows {
        let mut c1 = 0.0;
        let mut c2 = 0.0;
        for i in 0..n_cols {
            let z = (frame.sensors[i].values[row] - model.means[i]) / model.stds[i];
            c1 += z * model.components[0][i];
            c2 += z * model.components[1][i];
        }
        pca_1.push(c1);
        pca_2.push(c2);
        anomaly_score.push((c1 * c1 + c2 * c2).sqrt());
    }

    Projection {
        pca_1,
        pca_2,
        anomaly_score,
    }
}

/// Flips the direction so its largest-magnitude entry is positive. Keeps
/// refits stable: eigenvectors are only defined up to sign.
fn fix_sign(direction: &mut [f64]) {
    let mut max_abs = 0.0;
    let mut max_value = 0.0;
    for &v in direction.iter() {
        if v.abs() > max_abs {
            max_abs = v.abs();
            max_value = v;
        }
    }
    if max_value < 0.0 {
        for v in direction.iter_mut() {
            *v = -*v;
        }
    }
}

/// Cyclic Jacobi eigendecomposition of a symmetric matrix. Returns the
/// eigenvalues and the matrix of eigenvectors (column `k` pairs with
/// eigenvalue `k`).
fn jacobi_eigen(mut a: Vec<Vec<f64>>) -> (Vec<f64>, Vec<Vec<f64>>) {
    let d = a.len();
    let mut v = vec![vec![0.0_f64; d]; d];
    for (i, row) in v.iter_mut().enumerate() {
        row[i] = 1.0;
    }

    for _sweep in 0..JACOBI_MAX_SWEEPS {
        let mut off = 0.0;
        for p in 0..d {
            for q in (p + 1)..d {
                off += a[p][q] * a[p][q];
            }
        }
        if off < JACOBI_OFF_DIAGONAL_EPS {
            break;
        }

        for p in 0..(d - 1) {
            for q in (p + 1)..d {
                if a[p][q].abs() < 1e-300 {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = if theta == 0.0 {
                    1.0
                } else {
                    let sign = if theta > 0.0 { 1.0 } else { -1.0 };
                    sign / (theta.abs() + (theta * theta + 1.0).sqrt())
                };
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..d {
                    let akp = a[k][p];
                    let akq = a[k][q];
                    a[k][p] = c * akp - s * akq;
                    a[k][q] = s * akp + c * akq;
                }
                for k in 0..d {
                    let apk = a[p][k];
                    let aqk = a[q][k];
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for row in v.iter_mut() {
                    let vp = row[p];
                    let vq = row[q];
                    row[p] = c * vp - s * vq;
                    row[q] = s * vp + c * vq;
                }
            }
        }
    }

    let eigenvalues = (0..d).map(|i| a[i][i]).collect();
    (eigenvalues, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::SensorColumn;

    fn frame(columns: Vec<(&str, Vec<f64>)>) -> SensorFrame {
        SensorFrame {
            timestamps: vec![],
            status: vec![],
            sensors: columns
                .into_iter()
                .map(|(name, values)| SensorColumn {
                    name: name.to_string(),
                    values,
                })
                .collect(),
        }
    }

    #[test]
    fn fit_rejects_empty_and_degenerate_inputs() {
        let empty = frame(vec![]);
        assert_eq!(fit(&empty).unwrap_err().code, "no_sensor_columns");

        let flat = frame(vec![
            ("sensor_00", vec![5.0, 5.0, 5.0]),
            ("sensor_01", vec![1.0, 2.0, 3.0]),
        ]);
        let err = fit(&flat).unwrap_err();
        assert_eq!(err.code, "zero_variance_column");
        assert!(err.message.contains("sensor_00"));
    }

    #[test]
    fn first_component_captures_the_dominant_direction() {
        // Two perfectly correlated sensors plus an independent weak one:
        // the first component must load the correlated pair equally.
        let f = frame(vec![
            ("sensor_00", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
            ("sensor_01", vec![2.0, 4.0, 6.0, 8.0, 10.0, 12.0]),
            ("sensor_02", vec![0.3, -0.1, 0.2, -0.3, 0.1, -0.2]),
        ]);
        let model = fit(&f).unwrap();
        assert!(model.explained_variance[0] >= model.explained_variance[1]);
        let loading_0 = model.components[0][0];
        let loading_1 = model.components[0][1];
        assert!((loading_0 - loading_1).abs() < 1e-6);
        assert!(loading_0 > 0.5);
    }

    #[test]
    fn components_are_unit_length_and_orthogonal() {
        let f = frame(vec![
            ("sensor_00", vec![1.0, 3.0, 2.0, 5.0, 4.0]),
            ("sensor_01", vec![2.0, 1.0, 4.0, 3.0, 5.0]),
            ("sensor_02", vec![5.0, 4.0, 1.0, 2.0, 3.0]),
        ]);
        let model = fit(&f).unwrap();
        for component in &model.components {
            let norm: f64 = component.iter().map(|v| v * v).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-9);
        }
        let dot: f64 = model.components[0]
            .iter()
            .zip(model.components[1].iter())
            .map(|(a, b)| a * b)
            .sum();
        assert!(dot.abs() < 1e-9);
    }

    #[test]
    fn refitting_unchanged_input_is_bit_identical() {
        let f = frame(vec![
            ("sensor_00", vec![1.0, 3.0, 2.0, 5.0, 4.0]),
            ("sensor_01", vec![2.0, 1.0, 4.0, 3.0, 5.0]),
        ]);
        let first = fit(&f).unwrap();
        let second = fit(&f).unwrap();
        let p1 = transform(&first, &f);
        let p2 = transform(&second, &f);
        assert_eq!(p1.pca_1, p2.pca_1);
        assert_eq!(p1.pca_2, p2.pca_2);
        assert_eq!(p1.anomaly_score, p2.anomaly_score);
    }

    #[test]
    fn anomaly_score_is_the_norm_of_the_health_coordinate() {
        let f = frame(vec![
            ("sensor_00", vec![1.0, 3.0, 2.0, 5.0, 4.0]),
            ("sensor_01", vec![2.0, 1.0, 4.0, 3.0, 5.0]),
        ]);
        let model = fit(&f).unwrap();
        let projection = transform(&model, &f);
        for i in 0..f.sensors[0].values.len() {
            let expected =
                (projection.pca_1[i].powi(2) + projection.pca_2[i].powi(2)).sqrt();
            assert!((projection.anomaly_score[i] - expected).abs() < 1e-12);
            assert!(projection.anomaly_score[i] >= 0.0);
        }
    }
}

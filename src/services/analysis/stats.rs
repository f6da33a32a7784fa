//! Scalar statistics primitives shared by the analysis modules.
//!
//! All helpers skip non-finite values; a column full of NaN yields `None`
//! rather than propagating NaN into downstream scores.

/// Mean over finite values. `None` when no finite value is present.
pub fn mean(values: &[f64]) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0_u64;
    for &v in values {
        if !v.is_finite() {
            continue;
        }
        sum += v;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(sum / count as f64)
}

/// Population standard deviation (ddof = 0), the convention the scaler fits
/// with.
pub fn std_population(values: &[f64]) -> Option<f64> {
    std_with_ddof(values, 0)
}

/// Sample standard deviation (ddof = 1), the convention baseline deviation
/// scoring uses. A single finite sample yields `None`.
pub fn std_sample(values: &[f64]) -> Option<f64> {
    std_with_ddof(values, 1)
}

fn std_with_ddof(values: &[f64], ddof: u64) -> Option<f64> {
    let mu = mean(values)?;
    let mut sum_sq = 0.0;
    let mut count = 0_u64;
    for &v in values {
        if !v.is_finite() {
            continue;
        }
        let d = v - mu;
        sum_sq += d * d;
        count += 1;
    }
    if count <= ddof {
        return None;
    }
    Some((sum_sq / (count - ddof) as f64).sqrt())
}

/// Fraction of entries that are missing (NaN). Empty input counts as fully
/// missing.
pub fn missing_fraction(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 1.0;
    }
    let missing = values.iter().filter(|v| v.is_nan()).count();
    missing as f64 / values.len() as f64
}

/// Pearson correlation over two aligned columns, via streaming moments.
/// Pairs with a non-finite value on either side are skipped.
pub fn pearson_from_aligned(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mut n = 0_u64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_x2 = 0.0;
    let mut sum_y2 = 0.0;
    let mut sum_xy = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        if !xi.is_finite() || !yi.is_finite() {
            continue;
        }
        n += 1;
        sum_x += xi;
        sum_y += yi;
        sum_x2 += xi * xi;
        sum_y2 += yi * yi;
        sum_xy += xi * yi;
    }
    if n < 2 {
        return None;
    }
    let n_f = n as f64;
    let denom_x = n_f * sum_x2 - sum_x * sum_x;
    let denom_y = n_f * sum_y2 - sum_y * sum_y;
    let denom = (denom_x * denom_y).sqrt();
    if denom <= 0.0 || !denom.is_finite() {
        return None;
    }
    let r = (n_f * sum_xy - sum_x * sum_y) / denom;
    Some(r.clamp(-1.0, 1.0))
}

/// Full symmetric correlation matrix over aligned columns. Cells that
/// cannot be computed (zero variance, too little overlap) are `None`; the
/// diagonal is always `Some(1.0)`.
pub fn correlation_matrix(columns: &[&[f64]]) -> Vec<Vec<Option<f64>>> {
    let n = columns.len();
    let mut out = vec![vec![None; n]; n];
    for i in 0..n {
        out[i][i] = Some(1.0);
        for j in (i + 1)..n {
            let r = pearson_from_aligned(columns[i], columns[j]);
            out[i][j] = r;
            out[j][i] = r;
        }
    }
    out
}

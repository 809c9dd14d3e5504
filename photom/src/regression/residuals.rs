//! Studentized residuals of one signal regressed on another, column by column.

use crate::error::{Error, Result};
use crate::matrix::Matrix;

/// Fewest jointly valid samples a column needs for a defined MSE.
pub const MIN_VALID_SAMPLES: usize = 3;

/// Externally studentized residuals of `y` regressed on `x`, per column.
///
/// Positions where either input is NaN stay NaN. Returns `None` when both
/// inputs are absent (no remainder block).
pub fn studentized_residuals(x: Option<&Matrix>, y: Option<&Matrix>) -> Result<Option<Matrix>> {
    residuals_with(x, y, external_from_internal)
}

/// Internally studentized residuals, same conventions as [`studentized_residuals`].
pub fn internally_studentized_residuals(
    x: Option<&Matrix>,
    y: Option<&Matrix>,
) -> Result<Option<Matrix>> {
    residuals_with(x, y, |r_int, _| r_int)
}

/// Leave-one-out correction of an internally studentized residual.
///
/// NaN when `n - 2 - r_int²` is not positive.
pub fn external_from_internal(r_int: f64, n: usize) -> f64 {
    let n = n as f64;
    let denom = n - 2.0 - r_int * r_int;
    if denom <= 0.0 {
        tracing::debug!(r_int, n, "Externally studentized residual undefined");
        return f64::NAN;
    }
    r_int * ((n - 3.0) / denom).sqrt()
}

fn residuals_with(
    x: Option<&Matrix>,
    y: Option<&Matrix>,
    finish: impl Fn(f64, usize) -> f64,
) -> Result<Option<Matrix>> {
    let (x, y) = match (x, y) {
        (None, None) => return Ok(None),
        (Some(x), Some(y)) => (x, y),
        (Some(m), None) | (None, Some(m)) => {
            return Err(Error::ShapeMismatch {
                context: "regression inputs",
                expected: m.shape(),
                actual: (0, 0),
            });
        }
    };
    if x.shape() != y.shape() {
        return Err(Error::ShapeMismatch {
            context: "regression inputs",
            expected: x.shape(),
            actual: y.shape(),
        });
    }

    let mut out = Matrix::filled(y.rows(), y.cols(), f64::NAN);
    for col in 0..x.cols() {
        let fit = ColumnFit::new(x.column(col), y.column(col), col)?;
        let target = out.column_mut(col);
        for (&row, &r_int) in fit.valid.iter().zip(&fit.internal) {
            target[row] = finish(r_int, fit.valid.len());
        }
    }
    Ok(Some(out))
}

/// OLS fit of one column over its jointly valid samples.
struct ColumnFit {
    valid: Vec<usize>,
    internal: Vec<f64>,
}

impl ColumnFit {
    fn new(x: &[f64], y: &[f64], column: usize) -> Result<Self> {
        let valid: Vec<usize> = (0..x.len())
            .filter(|&i| !x[i].is_nan() && !y[i].is_nan())
            .collect();
        let n = valid.len();
        if n < MIN_VALID_SAMPLES {
            return Err(Error::DegenerateRegression { column, valid: n });
        }

        let nf = n as f64;
        let mean_x = valid.iter().map(|&i| x[i]).sum::<f64>() / nf;
        let mean_y = valid.iter().map(|&i| y[i]).sum::<f64>() / nf;
        let sxx: f64 = valid.iter().map(|&i| (x[i] - mean_x) * (x[i] - mean_x)).sum();

        // Constant predictor: nothing to regress, every residual is zero.
        if sxx == 0.0 {
            return Ok(Self {
                internal: vec![0.0; n],
                valid,
            });
        }

        let sxy: f64 = valid.iter().map(|&i| (x[i] - mean_x) * (y[i] - mean_y)).sum();
        let beta1 = sxy / sxx;
        let beta0 = mean_y - beta1 * mean_x;

        let residuals: Vec<f64> = valid.iter().map(|&i| y[i] - (beta0 + beta1 * x[i])).collect();
        let mse = residuals.iter().map(|e| e * e).sum::<f64>() / (nf - 2.0);

        let internal = valid
            .iter()
            .zip(&residuals)
            .map(|(&i, &e)| {
                let leverage = (x[i] - mean_x) * (x[i] - mean_x) / sxx + 1.0 / nf;
                let se = (mse * (1.0 - leverage)).sqrt();
                if se == 0.0 { 0.0 } else { e / se }
            })
            .collect();

        Ok(Self { valid, internal })
    }
}

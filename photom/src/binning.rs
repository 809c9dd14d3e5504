//! Trial binning and its inverse.
//!
//! A bin concatenates `bin_size` adjacent trial columns into one long column.
//! Trials that do not fill a whole bin form a separate remainder matrix. Only
//! reshaping happens, so `debin(bin(m, b), b)` reproduces `m` exactly.

use crate::error::{Error, Result};
use crate::matrix::Matrix;

/// Binned trials plus the leftover trials, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Binned {
    /// `(bin_size * trial_len, num_bins)`
    pub binned: Matrix,
    /// `(rem_cols * trial_len, 1)`, absent when trials divide evenly.
    pub remainder: Option<Matrix>,
}

impl Binned {
    pub fn debin(self, bin_size: usize) -> Result<Matrix> {
        debin(self.binned, self.remainder, bin_size)
    }
}

fn check_bin_size(bin_size: usize) -> Result<()> {
    if bin_size == 0 {
        return Err(Error::InvalidParameter {
            name: "bin_size",
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(())
}

/// Groups the trial columns of `(trial_len, num_trials)` into bins.
pub fn bin(matrix: Matrix, bin_size: usize) -> Result<Binned> {
    check_bin_size(bin_size)?;
    let (trial_len, num_trials) = matrix.shape();
    let num_bins = num_trials / bin_size;
    let rem_cols = num_trials % bin_size;

    let (lead, trail) = matrix.split_columns(num_bins * bin_size);
    let binned = lead.reshape(bin_size * trial_len, num_bins)?;
    let remainder = if rem_cols == 0 {
        None
    } else {
        Some(trail.reshape(rem_cols * trial_len, 1)?)
    };

    Ok(Binned { binned, remainder })
}

/// A single trial as an unbinned `(len, 1)` matrix.
///
/// Binning one trial is a no-op; pair with `debin(.., 1)`.
pub fn bin_signal(signal: &[f64]) -> Binned {
    Binned {
        binned: Matrix::column_vector(signal.to_vec()),
        remainder: None,
    }
}

/// Restores `(trial_len, num_trials)` from a binned matrix and optional remainder.
pub fn debin(binned: Matrix, remainder: Option<Matrix>, bin_size: usize) -> Result<Matrix> {
    check_bin_size(bin_size)?;
    let (bin_len, num_bins) = binned.shape();
    if bin_len % bin_size != 0 {
        return Err(Error::ShapeMismatch {
            context: "debin",
            expected: (bin_len - bin_len % bin_size, num_bins),
            actual: binned.shape(),
        });
    }
    let trial_len = bin_len / bin_size;
    let trials = binned.reshape(trial_len, bin_size * num_bins)?;

    let Some(remainder) = remainder else {
        return Ok(trials);
    };
    let rem_len = remainder.rows() * remainder.cols();
    if trial_len == 0 || rem_len % trial_len != 0 {
        return Err(Error::ShapeMismatch {
            context: "debin remainder",
            expected: (trial_len, rem_len / trial_len.max(1)),
            actual: remainder.shape(),
        });
    }
    let remainder = remainder.reshape(trial_len, rem_len / trial_len)?;
    trials.hcat(&remainder)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trials(trial_len: usize, num_trials: usize) -> Matrix {
        let data = (0..trial_len * num_trials).map(|v| v as f64 * 0.5 - 3.0).collect();
        Matrix::from_column_major(trial_len, num_trials, data).unwrap()
    }

    #[test]
    fn ten_trials_bin_three() {
        let trial_len = 4;
        let out = bin(trials(trial_len, 10), 3).unwrap();
        assert_eq!(out.binned.shape(), (3 * trial_len, 3));
        let remainder = out.remainder.as_ref().unwrap();
        assert_eq!(remainder.shape(), (trial_len, 1));
        // the remainder is the last trial
        assert_eq!(remainder.data(), trials(trial_len, 10).column(9));
    }

    #[test]
    fn bin_concatenates_adjacent_trials() {
        let m = trials(2, 4);
        let out = bin(m.clone(), 2).unwrap();
        assert!(out.remainder.is_none());
        let expected: Vec<f64> = [m.column(2), m.column(3)].concat();
        assert_eq!(out.binned.column(1), expected.as_slice());
    }

    #[test]
    fn round_trip_is_exact() {
        for (trial_len, num_trials) in [(1, 1), (4, 10), (5, 3), (3, 7), (6, 0)] {
            for bin_size in 1..=num_trials.max(1) + 1 {
                let m = trials(trial_len, num_trials);
                let restored = bin(m.clone(), bin_size).unwrap().debin(bin_size).unwrap();
                assert_eq!(restored, m, "trial_len={trial_len} trials={num_trials} b={bin_size}");
            }
        }
    }

    #[test]
    fn fewer_trials_than_bin_size_is_all_remainder() {
        let out = bin(trials(3, 2), 5).unwrap();
        assert_eq!(out.binned.shape(), (15, 0));
        assert_eq!(out.remainder.unwrap().shape(), (6, 1));
    }

    #[test]
    fn single_trial_signal_is_not_binned() {
        let out = bin_signal(&[1.0, 2.0, 3.0]);
        assert_eq!(out.binned.shape(), (3, 1));
        assert!(out.remainder.is_none());
        assert_eq!(out.debin(1).unwrap().data(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn zero_bin_size_is_rejected() {
        assert!(bin(trials(2, 2), 0).is_err());
        assert!(debin(trials(2, 2), None, 0).is_err());
    }

    #[test]
    fn debin_rejects_indivisible_bin_length() {
        assert!(matches!(
            debin(trials(5, 2), None, 2),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}

//! Raw trace reorganization: background subtraction, channel de-interleaving
//! and trial reshaping.

use crate::error::{Error, Result};
use crate::label::{LabelLayout, SignalMap};
use crate::matrix::Matrix;

/// Subtracts trace 0 (background) from every other trace.
///
/// Returns `traces.len() - 1` traces; an empty input yields an empty output.
pub fn subtract_background(traces: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    let Some((background, signals)) = traces.split_first() else {
        return Ok(Vec::new());
    };
    signals
        .iter()
        .enumerate()
        .map(|(i, trace)| {
            if trace.len() != background.len() {
                return Err(Error::TraceLengthMismatch {
                    index: i + 1,
                    expected: background.len(),
                    actual: trace.len(),
                });
            }
            Ok(trace.iter().zip(background).map(|(s, b)| s - b).collect())
        })
        .collect()
}

/// Stride de-interleaves each trace into `channels` traces.
///
/// Output order is trace-major: for each input, channels `0..channels`.
pub fn split_channels(traces: &[Vec<f64>], channels: usize) -> Result<Vec<Vec<f64>>> {
    if channels == 0 {
        return Err(Error::InvalidParameter {
            name: "channel_count",
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(traces
        .iter()
        .flat_map(|trace| {
            (0..channels).map(move |k| trace.iter().skip(k).step_by(channels).copied().collect())
        })
        .collect())
}

/// Inverse of [`split_channels`] for one trace: merges channel traces back
/// into a single interleaved sequence.
///
/// Channels must have non-increasing lengths that differ by at most one.
pub fn interleave_channels(channels: &[Vec<f64>]) -> Result<Vec<f64>> {
    let Some(first) = channels.first() else {
        return Ok(Vec::new());
    };
    for (k, channel) in channels.iter().enumerate().skip(1) {
        if channel.len() > first.len() || channel.len() + 1 < first.len() {
            return Err(Error::TraceLengthMismatch {
                index: k,
                expected: first.len(),
                actual: channel.len(),
            });
        }
    }
    let total: usize = channels.iter().map(Vec::len).sum();
    let count = channels.len();
    Ok((0..total).map(|i| channels[i % count][i / count]).collect())
}

/// Reshapes a trace column-major into `(samples_per_trial, trials)`,
/// dropping trailing samples that do not complete a trial.
pub fn reshape_trials(trace: &[f64], samples_per_trial: usize) -> Result<Matrix> {
    if samples_per_trial == 0 {
        return Err(Error::InvalidParameter {
            name: "samples_per_trial",
            reason: "must be at least 1".to_string(),
        });
    }
    let trials = trace.len() / samples_per_trial;
    let kept = trials * samples_per_trial;
    if kept < trace.len() {
        tracing::debug!(
            dropped = trace.len() - kept,
            samples_per_trial,
            "Dropping incomplete trailing trial"
        );
    }
    Matrix::from_column_major(samples_per_trial, trials, trace[..kept].to_vec())
}

/// Background-subtracts, channel-splits, trial-reshapes and labels one run.
///
/// `raw` holds one trace per region in the order used to build `layout`,
/// background first.
pub fn organize_run(raw: &[Vec<f64>], layout: &LabelLayout, samples_per_trial: usize) -> Result<SignalMap> {
    if raw.len() != layout.regions().len() + 1 {
        return Err(Error::ShapeMismatch {
            context: "raw traces per region",
            expected: (layout.regions().len() + 1, 1),
            actual: (raw.len(), 1),
        });
    }
    let signals = subtract_background(raw)?;
    let split = split_channels(&signals, layout.channel_count())?;
    let matrices = split
        .iter()
        .map(|trace| reshape_trials(trace, samples_per_trial))
        .collect::<Result<Vec<_>>>()?;
    SignalMap::from_layout(layout, matrices)
}

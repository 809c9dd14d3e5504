//! Two-stage residual regression of one run.
//!
//! Stage 1 regresses the correction-fiber signal out of every region, per
//! channel. Stage 2 regresses each region's channel-0 stage-1 result out of
//! its other channels. Both stages bin trials first, regress the binned and
//! remainder blocks separately, then debin.

pub mod residuals;


use hashbrown::HashMap;
use serde::Serialize;
use strum_macros::Display;

use crate::binning::{Binned, bin, debin};
use crate::error::{Error, Result};
use crate::label::{CORRECTION_LABEL, LabelStyle, SignalKey, SignalMap};
use crate::matrix::Matrix;

pub use residuals::{internally_studentized_residuals, studentized_residuals};

/// Channel every other channel is regressed against in stage 2.
pub const REFERENCE_CHANNEL: usize = 0;

/// Regression stage a pair failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum RegressionStage {
    #[strum(to_string = "correction fiber removal")]
    CorrsigRemoval,
    #[strum(to_string = "reference channel removal")]
    ChannelReference,
}

/// A region/channel pair left out of the regression output.
#[derive(Debug, Clone, Serialize)]
pub struct PairFailure {
    #[serde(skip)]
    pub key: SignalKey,
    /// `<region>_ch<n>`.
    pub signal: String,
    pub stage: RegressionStage,
    pub message: String,
}

impl PairFailure {
    fn new(key: SignalKey, stage: RegressionStage, source: Error) -> Self {
        let err = Error::Regression {
            key: key.clone(),
            source: Box::new(source),
        };
        tracing::error!(signal = %key, %stage, error = %err, "Pair regression failed");
        Self {
            signal: key.residual_label(),
            key,
            stage,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegressionOutput {
    /// Stage 1 diagnostics: correction fiber removed, keyed `<region>_ch<n>`.
    pub corrsig_removed: SignalMap,
    /// Stage 2 result, keyed `<region>_ch<n>` for every non-reference channel.
    pub residuals: SignalMap,
    /// Pairs missing from the maps above, in the order they failed.
    pub failures: Vec<PairFailure>,
}

/// Runs both regression stages over a labeled run.
///
/// A pair whose regression fails is recorded in
/// [`RegressionOutput::failures`] and left out of the maps; other pairs are
/// unaffected. A failed stage-1 channel-0 result fails stage 2 for every
/// other channel of that region. A missing correction-fiber or region signal
/// is an error for the whole run.
pub fn regress_run(signals: &SignalMap, bin_size: usize) -> Result<RegressionOutput> {
    let channels = signals.channels();
    let regions: Vec<&str> = signals
        .regions()
        .into_iter()
        .filter(|r| *r != CORRECTION_LABEL)
        .collect();

    let mut controls: HashMap<usize, Binned> = HashMap::with_capacity(channels.len());
    for &channel in &channels {
        let key = SignalKey::new(CORRECTION_LABEL, channel);
        let control = signals
            .get(&key)
            .ok_or_else(|| Error::MissingControl(key.signal_label()))?;
        controls.insert(channel, bin(control.clone(), bin_size)?);
    }

    let mut failures = Vec::new();
    let mut corrsig_removed = SignalMap::new(LabelStyle::Residual);
    let mut stage1: HashMap<SignalKey, Binned> = HashMap::new();
    for region in &regions {
        for &channel in &channels {
            let key = SignalKey::new(*region, channel);
            let target = signals
                .get(&key)
                .ok_or_else(|| Error::MissingSignal(key.signal_label()))?;
            match regress_pair(&controls[&channel], target.clone(), bin_size) {
                Ok(residual) => {
                    corrsig_removed.insert(key.clone(), residual.clone().debin(bin_size)?);
                    stage1.insert(key, residual);
                }
                Err(err) => failures.push(PairFailure::new(key, RegressionStage::CorrsigRemoval, err)),
            }
        }
    }

    let mut residuals = SignalMap::new(LabelStyle::Residual);
    for region in &regions {
        let control_key = SignalKey::new(*region, REFERENCE_CHANNEL);
        let control = stage1.get(&control_key);
        for &channel in channels.iter().filter(|&&c| c != REFERENCE_CHANNEL) {
            let key = SignalKey::new(*region, channel);
            // already recorded in stage 1
            let Some(target) = stage1.get(&key) else {
                continue;
            };
            let result = match control {
                Some(control) => regress_binned(control, target),
                None => Err(Error::MissingControl(control_key.residual_label())),
            };
            match result {
                Ok(residual) => residuals.insert(key, residual.debin(bin_size)?),
                Err(err) => failures.push(PairFailure::new(key, RegressionStage::ChannelReference, err)),
            }
        }
    }

    tracing::debug!(
        regions = regions.len(),
        channels = channels.len(),
        bin_size,
        failed_pairs = failures.len(),
        "Regression finished"
    );

    Ok(RegressionOutput {
        corrsig_removed,
        residuals,
        failures,
    })
}

/// Bins `target` and regresses it on an already binned control.
fn regress_pair(control: &Binned, target: Matrix, bin_size: usize) -> Result<Binned> {
    regress_binned(control, &bin(target, bin_size)?)
}

/// Residuals of the binned and remainder blocks, each against its control block.
fn regress_binned(control: &Binned, target: &Binned) -> Result<Binned> {
    let binned = studentized_residuals(Some(&control.binned), Some(&target.binned))?
        .ok_or(Error::ShapeMismatch {
            context: "binned regression",
            expected: control.binned.shape(),
            actual: (0, 0),
        })?;
    let remainder = studentized_residuals(control.remainder.as_ref(), target.remainder.as_ref())?;
    Ok(Binned { binned, remainder })
}

/// Bins, regresses and debins a single control/target pair.
pub fn regress_signal(control: &Matrix, target: &Matrix, bin_size: usize) -> Result<Matrix> {
    let control = bin(control.clone(), bin_size)?;
    let residual = regress_pair(&control, target.clone(), bin_size)?;
    debin(residual.binned, residual.remainder, bin_size)
}

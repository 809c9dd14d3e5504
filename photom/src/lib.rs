//! Fiber-photometry trace extraction and confound regression.
//!
//! Frames of a run are sampled under circular region masks into one raw
//! trace per region. Raw traces are background-subtracted, de-interleaved
//! into excitation channels and reshaped into trial matrices. A two-stage
//! regression then removes the correction-fiber signal and the channel-0
//! signal, leaving externally studentized residuals per region and channel.
//!
//! ```no_run
//! use photom::{Pipeline, PipelineConfig, Region, RunInput};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = PipelineConfig::load("photom.yaml".as_ref())?;
//! let regions = vec![
//!     Region::new("Background", [10.0, 10.0, 40.0, 40.0]),
//!     Region::new("Corrsig", [100.0, 100.0, 140.0, 140.0]),
//!     Region::new("NAc", [200.0, 200.0, 240.0, 240.0]),
//! ];
//! let pipeline = Pipeline::new(config, &regions)?;
//! let run = RunInput::discover("data/Mouse 1 Run 1", None)?;
//! let output = pipeline.process(&[run]);
//! # Ok(())
//! # }
//! ```

pub mod binning;
pub mod config;
pub mod edits;
pub mod error;
pub mod extract;
pub mod frame;
pub mod frames;
pub mod inspection;
pub mod label;
pub mod mask;
pub mod matrix;
pub mod pipeline;
pub mod progress;
pub mod regression;
pub mod reshape;

#[cfg(test)]
pub(crate) mod testing;

pub use binning::{Binned, bin, bin_signal, debin};
pub use config::PipelineConfig;
pub use error::{Error, FrameLoadError, Result};
pub use extract::{ExtractionStrategy, Executor, TraceExtractor, resolve_executor};
pub use frame::{Frame, FrameDecoder, TiffDecoder};
pub use frames::{FrameIndex, frame_paths};
pub use inspection::{InspectionConfig, TraceIssue, inspect_traces};
pub use label::{CORRECTION_LABEL, LabelLayout, SignalKey, SignalMap};
pub use mask::{Circle, Mask, Region, circle_mask};
pub use matrix::Matrix;
pub use pipeline::{Pipeline, PipelineOutput, RunFailure, RunInput, RunOutput};
pub use progress::{Progress, ProgressCallback, Stage};
pub use regression::{PairFailure, RegressionOutput, RegressionStage, regress_run, studentized_residuals};

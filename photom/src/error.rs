//! Error types for trace extraction and regression.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::label::SignalKey;

/// Structural errors: wrong shapes, invalid parameters, degenerate regression input.
///
/// Per-frame load failures are not represented here; the extractor recovers from
/// those locally (see [`FrameLoadError`]).
#[derive(Debug, Error)]
pub enum Error {
    #[error("Trace {index} has {actual} samples, expected {expected} to match the background trace")]
    TraceLengthMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        context: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Regression column {column} has {valid} valid samples, at least 3 are required")]
    DegenerateRegression { column: usize, valid: usize },

    #[error("Control signal '{0}' is missing")]
    MissingControl(String),

    #[error("Signal '{0}' is missing")]
    MissingSignal(String),

    #[error("Regression of '{key}' failed: {source}")]
    Regression {
        key: SignalKey,
        #[source]
        source: Box<Error>,
    },

    #[error("At least {required} regions are required, got {actual}")]
    TooFewRegions { required: usize, actual: usize },

    #[error("Failed to read directory '{path}': {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure to turn one frame file into a pixel grid.
#[derive(Debug, Error)]
pub enum FrameLoadError {
    #[error("Failed to read frame '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to decode frame '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: tiff::TiffError,
    },

    #[error("Unsupported sample format in '{path}': {format}")]
    UnsupportedSampleFormat { path: PathBuf, format: String },

    #[error("Frame '{path}' is {actual:?} pixels, masks expect {expected:?}")]
    DimensionMismatch {
        path: PathBuf,
        expected: (usize, usize),
        actual: (usize, usize),
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regression_error_names_the_pair() {
        let err = Error::Regression {
            key: SignalKey::new("RegionA", 1),
            source: Box::new(Error::DegenerateRegression {
                column: 2,
                valid: 1,
            }),
        };
        let msg = err.to_string();
        assert!(msg.contains("RegionA_ch1"));
        assert!(msg.contains("column 2"));
    }

    #[test]
    fn regression_error_exposes_source() {
        use std::error::Error as StdError;

        let err = Error::Regression {
            key: SignalKey::new("RegionA", 0),
            source: Box::new(Error::MissingSignal("sig_RegionA_ch0".to_string())),
        };
        assert!(err.source().is_some());
    }

    #[test]
    fn dimension_mismatch_message() {
        let err = FrameLoadError::DimensionMismatch {
            path: PathBuf::from("/runs/a/img_3.tif"),
            expected: (424, 424),
            actual: (512, 512),
        };
        let msg = err.to_string();
        assert!(msg.contains("img_3.tif"));
        assert!(msg.contains("424"));
        assert!(msg.contains("512"));
    }
}

//! Frame decoding.

use std::fs::File;
use std::path::Path;

use common::Buffer2;
use tiff::decoder::{Decoder, DecodingResult, Limits};

use crate::error::FrameLoadError;

/// Grayscale intensity grid, row-major.
pub type Frame = Buffer2<f64>;

/// Turns one image file into a [`Frame`].
pub trait FrameDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<Frame, FrameLoadError>;
}

/// Default decoder for `.tif` frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiffDecoder;

impl FrameDecoder for TiffDecoder {
    fn decode(&self, path: &Path) -> Result<Frame, FrameLoadError> {
        load_tiff(path)
    }
}

/// Loads a TIFF as one intensity per pixel.
///
/// Integer and float samples up to 32 bits convert to `f64` exactly.
/// Multi-sample pixels (gray+alpha, RGB) are averaged.
pub fn load_tiff(path: &Path) -> Result<Frame, FrameLoadError> {
    let decode_err = |source| FrameLoadError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(|source| FrameLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut decoder = Decoder::new(file)
        .map_err(decode_err)?
        .with_limits(Limits::unlimited());
    let (width, height) = decoder.dimensions().map_err(decode_err)?;
    let (width, height) = (width as usize, height as usize);

    let samples: Vec<f64> = match decoder.read_image().map_err(decode_err)? {
        DecodingResult::U8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F64(buf) => buf,
        other => {
            return Err(FrameLoadError::UnsupportedSampleFormat {
                path: path.to_path_buf(),
                format: sample_format_name(&other).to_string(),
            });
        }
    };

    let pixel_count = width * height;
    if pixel_count == 0 || samples.len() % pixel_count != 0 {
        return Err(FrameLoadError::UnsupportedSampleFormat {
            path: path.to_path_buf(),
            format: format!("{} samples for {width}x{height} pixels", samples.len()),
        });
    }

    let per_pixel = samples.len() / pixel_count;
    let pixels = if per_pixel == 1 {
        samples
    } else {
        samples
            .chunks_exact(per_pixel)
            .map(|px| px.iter().sum::<f64>() / per_pixel as f64)
            .collect()
    };

    Ok(Buffer2::new(width, height, pixels))
}

fn sample_format_name(result: &DecodingResult) -> &'static str {
    match result {
        DecodingResult::U8(_) => "u8",
        DecodingResult::U16(_) => "u16",
        DecodingResult::U32(_) => "u32",
        DecodingResult::U64(_) => "u64",
        DecodingResult::F32(_) => "f32",
        DecodingResult::F64(_) => "f64",
        DecodingResult::I8(_) => "i8",
        DecodingResult::I16(_) => "i16",
        DecodingResult::I32(_) => "i32",
        DecodingResult::I64(_) => "i64",
        _ => "unknown",
    }
}

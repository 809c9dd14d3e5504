//! Frame discovery and numeric ordering.

use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

use common::file_utils::tiff_files;

use crate::error::{Error, Result};

/// Frame number recovered from a file name.
///
/// Holds the decimal digits without leading zeros, so indices of any length
/// order numerically: shorter is smaller, equal lengths compare digit-wise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameIndex(String);

impl FrameIndex {
    /// `None` unless `digits` is non-empty and all ASCII digits.
    pub fn from_digits(digits: &str) -> Option<Self> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let trimmed = digits.trim_start_matches('0');
        Some(Self(if trimmed.is_empty() { "0" } else { trimmed }.to_string()))
    }

    pub fn digits(&self) -> &str {
        &self.0
    }

    /// The index as a `u64`, `None` when it does not fit.
    pub fn to_u64(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl From<u64> for FrameIndex {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl Ord for FrameIndex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.len().cmp(&other.0.len()).then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for FrameIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for FrameIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Numeric frame index embedded in a file name, if any.
///
/// Without a prefix the index is the integer after the last `_` of the stem
/// (`img_12.tif` -> 12). With a prefix the name must start with it, and the
/// index is formed from every digit after the prefix and its one-character
/// separator (`cam0-00_12.tif` with prefix `cam0` -> 12).
pub fn frame_index(file_name: &str, prefix: Option<&str>) -> Option<FrameIndex> {
    let stem = Path::new(file_name).file_stem()?.to_str()?;
    match prefix {
        None => FrameIndex::from_digits(stem.rsplit('_').next()?),
        Some(prefix) => {
            let rest = stem.strip_prefix(prefix)?;
            let mut chars = rest.chars();
            chars.next()?;
            let digits: String = chars.filter(char::is_ascii_digit).collect();
            FrameIndex::from_digits(&digits)
        }
    }
}

/// Lists the TIFF frames of a run directory in numeric order.
///
/// `prefix` of `None`, `""` or `"*"` accepts any file name. Files without a
/// recoverable index are skipped.
pub fn frame_paths(run_dir: &Path, prefix: Option<&str>) -> Result<Vec<PathBuf>> {
    let prefix = prefix.filter(|p| !p.is_empty() && *p != "*");
    let files = tiff_files(run_dir).map_err(|source| Error::ReadDir {
        path: run_dir.to_path_buf(),
        source,
    })?;

    let mut indexed: Vec<(FrameIndex, PathBuf)> = Vec::with_capacity(files.len());
    for path in files {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            tracing::warn!(path = %path.display(), "Skipping frame with non UTF-8 name");
            continue;
        };
        if prefix.is_some_and(|p| !name.starts_with(p)) {
            continue;
        }
        match frame_index(name, prefix) {
            Some(index) => indexed.push((index, path)),
            None => tracing::warn!(path = %path.display(), "Skipping frame without numeric index"),
        }
    }

    indexed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    Ok(indexed.into_iter().map(|(_, path)| path).collect())
}

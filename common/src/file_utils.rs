//! File utility functions for listing and filtering files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Supported TIFF frame extensions.
pub const TIFF_EXTENSIONS: &[&str] = &["tif", "tiff"];

/// Returns paths to all files in a directory matching the given extensions.
/// Extensions are matched case-insensitively. The order is unspecified.
pub fn files_with_extensions(dir: &Path, extensions: &[&str]) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        if extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
            files.push(path);
        }
    }
    Ok(files)
}

/// Returns paths to all TIFF files in the given directory.
pub fn tiff_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    files_with_extensions(dir, TIFF_EXTENSIONS)
}

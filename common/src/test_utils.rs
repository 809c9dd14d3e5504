use std::path::PathBuf;

/// Returns the workspace root directory (parent of the crate manifest directory).
fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// Returns the path to a test output file, creating `test_output/` if needed.
pub fn test_output_path(name: &str) -> PathBuf {
    let dir = workspace_root().join("test_output");
    std::fs::create_dir_all(&dir).expect("Failed to create test_output directory");
    dir.join(name)
}

/// Returns a fresh, empty directory under `test_output/`.
///
/// Any previous contents are removed, so each test should use its own name.
pub fn test_output_dir(name: &str) -> PathBuf {
    let dir = test_output_path(name);
    if dir.exists() {
        std::fs::remove_dir_all(&dir).expect("Failed to clear test output directory");
    }
    std::fs::create_dir_all(&dir).expect("Failed to create test output directory");
    dir
}

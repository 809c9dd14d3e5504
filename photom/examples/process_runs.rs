//! Example: extract and regress every run under a data directory
//!
//! # Directory Structure
//!
//! ```text
//! $PHOTOM_DATA_DIR/
//!   regions.yaml        list of { label, bounds: [x1, y1, x2, y2] }, background first
//!   photom.yaml         optional PipelineConfig
//!   Mouse 1 Run 1/
//!     img_0.tif, img_1.tif, ...
//!   Mouse 1 Run 2/
//!     ...
//! ```
//!
//! Results are written to `test_output/photom_results.json`.
//!
//! # Usage
//!
//! ```bash
//! PHOTOM_DATA_DIR=/path/to/data cargo run --release --example process_runs
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use common::log_setup::LogConfig;
use photom::{
    InspectionConfig, Pipeline, PipelineConfig, Progress, ProgressCallback, Region, RunInput,
    inspect_traces,
};

fn main() -> anyhow::Result<()> {
    let output_base = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
        .join("test_output");
    common::log_setup::setup_logging(&LogConfig {
        log_dir: output_base.join("logs"),
        ..LogConfig::default()
    })?;

    let data_dir = env::var("PHOTOM_DATA_DIR")
        .map(PathBuf::from)
        .map_err(|_| anyhow::anyhow!("PHOTOM_DATA_DIR environment variable must be set"))?;
    tracing::info!(path = %data_dir.display(), "Data directory");

    let config_path = data_dir.join("photom.yaml");
    let config = if config_path.exists() {
        PipelineConfig::load(&config_path)?
    } else {
        PipelineConfig::default()
    };
    let regions: Vec<Region> = common::serde::read_file(&data_dir.join("regions.yaml"))?;

    let mut runs = Vec::new();
    for entry in fs::read_dir(&data_dir)? {
        let path = entry?.path();
        if path.is_dir() {
            runs.push(RunInput::discover(path, config.frame_prefix.as_deref())?);
        }
    }
    runs.sort_by(|a, b| a.path.cmp(&b.path));

    let progress = ProgressCallback::new(Arc::new(|p: Progress| tracing::info!("{p}")));
    let pipeline = Pipeline::new(config, &regions)?.with_progress(progress);

    let start = Instant::now();
    let output = pipeline.process(&runs);
    tracing::info!(elapsed_s = start.elapsed().as_secs_f64(), "Processing complete");

    let inspection = InspectionConfig::default();
    for run in &output.runs {
        let issues = inspect_traces(&run.raw.traces, &inspection);
        if !issues.is_empty() {
            tracing::warn!(run = %run.path.display(), ?issues, "Suspicious raw traces");
        }
    }
    for failure in &output.failures {
        tracing::error!(run = %failure.path.display(), "{}", failure.message);
    }
    for (run, pair) in output.failed_pairs() {
        tracing::warn!(run = %run.display(), signal = %pair.signal, stage = %pair.stage, "Pair missing from results");
    }

    let results_path = output_base.join("photom_results.json");
    common::serde::write_file(&output, &results_path)?;
    tracing::info!(path = %results_path.display(), "Results written");
    Ok(())
}

//! Batch processing of runs: extraction, reorganization and regression.


use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::ser::SerializeMap;

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::extract::{Executor, TraceExtractor, resolve_executor};
use crate::frame::{FrameDecoder, TiffDecoder};
use crate::frames::frame_paths;
use crate::label::{LabelLayout, SignalMap};
use crate::mask::{Region, region_masks};
use crate::progress::{Progress, ProgressCallback, Stage, report_progress};
use crate::regression::{PairFailure, RegressionOutput, regress_run};
use crate::reshape::organize_run;

/// One run directory and its numerically ordered frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInput {
    pub path: PathBuf,
    pub frames: Vec<PathBuf>,
}

impl RunInput {
    pub fn new(path: impl Into<PathBuf>, frames: Vec<PathBuf>) -> Self {
        Self {
            path: path.into(),
            frames,
        }
    }

    /// Lists the frames of `path`, see [`frame_paths`].
    pub fn discover(path: impl Into<PathBuf>, prefix: Option<&str>) -> Result<Self> {
        let path = path.into();
        let frames = frame_paths(&path, prefix)?;
        Ok(Self { path, frames })
    }
}

/// Raw per-region traces; serializes as `region label -> trace`.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionTraces {
    pub labels: Vec<String>,
    pub traces: Vec<Vec<f64>>,
}

impl RegionTraces {
    pub fn get(&self, label: &str) -> Option<&[f64]> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.traces[i].as_slice())
    }
}

impl Serialize for RegionTraces {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.labels.len()))?;
        for (label, trace) in self.labels.iter().zip(&self.traces) {
            map.serialize_entry(label, trace)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub path: PathBuf,
    pub raw: RegionTraces,
    /// Trial matrices keyed `sig_<region>_ch<n>`.
    pub signals: SignalMap,
    pub corrsig_removed: SignalMap,
    pub residuals: SignalMap,
    /// Region/channel pairs missing from the regression maps.
    pub failed_pairs: Vec<PairFailure>,
}

/// A run whose analysis failed as a whole; other runs are unaffected.
#[derive(Debug, Clone, Serialize)]
pub struct RunFailure {
    pub path: PathBuf,
    pub message: String,
}

impl RunFailure {
    fn new(path: &Path, err: &Error) -> Self {
        Self {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineOutput {
    pub runs: Vec<RunOutput>,
    /// Runs without frames.
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<RunFailure>,
}

impl PipelineOutput {
    pub fn run(&self, path: &Path) -> Option<&RunOutput> {
        self.runs.iter().find(|r| r.path == path)
    }

    /// Failed region/channel pairs across all runs.
    pub fn failed_pairs(&self) -> impl Iterator<Item = (&Path, &PairFailure)> {
        self.runs
            .iter()
            .flat_map(|run| run.failed_pairs.iter().map(|f| (run.path.as_path(), f)))
    }
}

/// Runs every stage for a batch of runs sharing one region set.
pub struct Pipeline<D: FrameDecoder = TiffDecoder> {
    config: PipelineConfig,
    region_labels: Vec<String>,
    layout: LabelLayout,
    extractor: TraceExtractor<D>,
    executor: Executor,
    progress: ProgressCallback,
}

impl Pipeline<TiffDecoder> {
    pub fn new(config: PipelineConfig, regions: &[Region]) -> Result<Self> {
        Self::with_decoder(config, regions, TiffDecoder)
    }
}

impl<D: FrameDecoder> Pipeline<D> {
    /// `regions` lists the background first, then the correction fiber.
    pub fn with_decoder(config: PipelineConfig, regions: &[Region], decoder: D) -> Result<Self> {
        config.validate()?;
        let region_labels: Vec<String> = regions.iter().map(|r| r.label.clone()).collect();
        let layout = LabelLayout::from_region_labels(&region_labels, config.channel_count)?;
        let masks = region_masks(config.frame_width, config.frame_height, regions);
        for (region, mask) in regions.iter().zip(&masks) {
            if mask.pixel_count() == 0 {
                tracing::warn!(region = %region.label, "Region mask covers no pixels, its trace will be missing");
            }
        }
        let extractor = TraceExtractor::with_decoder(masks, decoder)?;
        let executor = resolve_executor(config.extraction);

        Ok(Self {
            config,
            region_labels,
            layout,
            extractor,
            executor,
            progress: ProgressCallback::default(),
        })
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.extractor = self
            .extractor
            .with_progress(progress.clone(), self.config.progress_interval);
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn layout(&self) -> &LabelLayout {
        &self.layout
    }

    /// Raw traces of one run, one per region in region order.
    pub fn extract_run(&self, run: &RunInput) -> RegionTraces {
        RegionTraces {
            labels: self.region_labels.clone(),
            traces: self.extractor.extract(&run.path, &run.frames, &self.executor),
        }
    }

    /// Reorganizes and regresses raw traces, e.g. after [`crate::edits`].
    pub fn analyze_raw(&self, raw: &[Vec<f64>]) -> Result<(SignalMap, RegressionOutput)> {
        let signals = organize_run(raw, &self.layout, self.config.samples_per_trial)?;
        let regression = regress_run(&signals, self.config.bin_size)?;
        Ok((signals, regression))
    }

    pub fn process(&self, runs: &[RunInput]) -> PipelineOutput {
        let mut output = PipelineOutput::default();

        for (index, run) in runs.iter().enumerate() {
            if run.frames.is_empty() {
                tracing::info!(run = %run.path.display(), "Skipping run without frames");
                output.skipped.push(run.path.clone());
                continue;
            }

            let raw = self.extract_run(run);
            report_progress(&self.progress, || Progress {
                run: run.path.clone(),
                current: index + 1,
                total: runs.len(),
                stage: Stage::Regressing,
                frames_per_second: None,
            });

            match self.analyze_raw(&raw.traces) {
                Ok((signals, regression)) => output.runs.push(RunOutput {
                    path: run.path.clone(),
                    raw,
                    signals,
                    corrsig_removed: regression.corrsig_removed,
                    residuals: regression.residuals,
                    failed_pairs: regression.failures,
                }),
                Err(err) => {
                    tracing::error!(run = %run.path.display(), error = %err, "Run analysis failed");
                    output.failures.push(RunFailure::new(&run.path, &err));
                }
            }
        }

        tracing::info!(
            processed = output.runs.len(),
            failed = output.failures.len(),
            failed_pairs = output.failed_pairs().count(),
            skipped = output.skipped.len(),
            "Batch finished"
        );
        output
    }
}

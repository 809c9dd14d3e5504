//! Per-frame masked-mean sampling across a run.
//!
//! Each frame is decoded once and reduced to one mean per mask. Results are
//! written into a frame-major buffer addressed by frame index, so the
//! sequential and pooled paths produce bit-identical traces regardless of
//! completion order. A frame that fails to load leaves NaN in every trace.


use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, FrameLoadError, Result};
use crate::frame::{FrameDecoder, TiffDecoder};
use crate::mask::Mask;
use crate::progress::{Progress, ProgressCallback, Stage, report_progress};

/// How frames of a run are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    Sequential,
    /// Bounded worker pool; `workers == 0` uses one worker per available core.
    Concurrent { workers: usize },
}

impl Default for ExtractionStrategy {
    fn default() -> Self {
        Self::Concurrent { workers: 0 }
    }
}

/// Resolved execution environment for extraction.
#[derive(Debug)]
pub enum Executor {
    Sequential,
    Pool(rayon::ThreadPool),
}

/// Resolves a strategy, falling back to sequential when no pool can be built.
pub fn resolve_executor(strategy: ExtractionStrategy) -> Executor {
    resolve_executor_with(strategy, |workers| {
        rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("photom-extract-{i}"))
            .build()
    })
}

/// [`resolve_executor`] with an injectable pool builder.
pub fn resolve_executor_with<E, F>(strategy: ExtractionStrategy, build: F) -> Executor
where
    E: fmt::Display,
    F: FnOnce(usize) -> std::result::Result<rayon::ThreadPool, E>,
{
    match strategy {
        ExtractionStrategy::Sequential => Executor::Sequential,
        ExtractionStrategy::Concurrent { workers } => match build(workers) {
            Ok(pool) => Executor::Pool(pool),
            Err(err) => {
                tracing::warn!(
                    workers,
                    error = %err,
                    "Worker pool unavailable, falling back to sequential extraction"
                );
                Executor::Sequential
            }
        },
    }
}

/// Samples every mask over every frame of a run.
pub struct TraceExtractor<D: FrameDecoder = TiffDecoder> {
    masks: Vec<Mask>,
    dimensions: (usize, usize),
    decoder: D,
    progress: ProgressCallback,
    progress_interval: usize,
}

impl TraceExtractor<TiffDecoder> {
    pub fn new(masks: Vec<Mask>) -> Result<Self> {
        Self::with_decoder(masks, TiffDecoder)
    }
}

impl<D: FrameDecoder> TraceExtractor<D> {
    /// All masks must share the same frame dimensions.
    pub fn with_decoder(masks: Vec<Mask>, decoder: D) -> Result<Self> {
        let Some(first) = masks.first() else {
            return Err(Error::TooFewRegions {
                required: 1,
                actual: 0,
            });
        };
        let dimensions = first.dimensions();
        if let Some(other) = masks.iter().find(|m| m.dimensions() != dimensions) {
            return Err(Error::InvalidParameter {
                name: "masks",
                reason: format!(
                    "mask dimensions differ: {:?} and {:?}",
                    dimensions,
                    other.dimensions()
                ),
            });
        }

        Ok(Self {
            masks,
            dimensions,
            decoder,
            progress: ProgressCallback::default(),
            progress_interval: 0,
        })
    }

    /// Reports every `interval` frames (0 disables periodic reports) and once
    /// per completed run.
    pub fn with_progress(mut self, progress: ProgressCallback, interval: usize) -> Self {
        self.progress = progress;
        self.progress_interval = interval;
        self
    }

    pub fn masks(&self) -> &[Mask] {
        &self.masks
    }

    /// `(width, height)` every frame must have.
    pub fn dimensions(&self) -> (usize, usize) {
        self.dimensions
    }

    /// One trace per mask, each `frames.len()` long.
    pub fn extract(&self, run: &Path, frames: &[PathBuf], executor: &Executor) -> Vec<Vec<f64>> {
        match executor {
            Executor::Sequential => self.extract_sequential(run, frames),
            Executor::Pool(pool) => self.extract_concurrent(run, frames, pool),
        }
    }

    pub fn extract_sequential(&self, run: &Path, frames: &[PathBuf]) -> Vec<Vec<f64>> {
        let tracker = RunTracker::new(run, frames.len());
        let mut samples = vec![f64::NAN; frames.len() * self.masks.len()];

        samples
            .chunks_mut(self.masks.len())
            .zip(frames)
            .for_each(|(out, path)| self.process_frame(path, out, &tracker));

        self.finish(tracker, samples)
    }

    pub fn extract_concurrent(
        &self,
        run: &Path,
        frames: &[PathBuf],
        pool: &rayon::ThreadPool,
    ) -> Vec<Vec<f64>> {
        let tracker = RunTracker::new(run, frames.len());
        let mut samples = vec![f64::NAN; frames.len() * self.masks.len()];

        pool.install(|| {
            samples
                .par_chunks_mut(self.masks.len())
                .zip(frames.par_iter())
                .for_each(|(out, path)| self.process_frame(path, out, &tracker));
        });

        self.finish(tracker, samples)
    }

    fn process_frame(&self, path: &Path, out: &mut [f64], tracker: &RunTracker<'_>) {
        if let Err(err) = self.sample_frame(path, out) {
            tracing::warn!(path = %path.display(), error = %err, "Frame load failed, samples left missing");
            tracker.failures.fetch_add(1, Ordering::Relaxed);
        }

        let done = tracker.completed.fetch_add(1, Ordering::Relaxed) + 1;
        if self.progress_interval > 0 && done % self.progress_interval == 0 {
            report_progress(&self.progress, || tracker.progress(done, Stage::Extracting));
        }
    }

    /// Loads one frame and writes one mean per mask into `out`.
    ///
    /// `out` is left untouched on failure.
    pub fn sample_frame(&self, path: &Path, out: &mut [f64]) -> std::result::Result<(), FrameLoadError> {
        let frame = self.decoder.decode(path)?;
        if frame.dimensions() != self.dimensions {
            return Err(FrameLoadError::DimensionMismatch {
                path: path.to_path_buf(),
                expected: self.dimensions,
                actual: frame.dimensions(),
            });
        }
        for (value, mask) in out.iter_mut().zip(&self.masks) {
            *value = mask.mean(frame.pixels());
        }
        Ok(())
    }

    fn finish(&self, tracker: RunTracker<'_>, samples: Vec<f64>) -> Vec<Vec<f64>> {
        let frame_count = tracker.total;
        let failed = tracker.failures.load(Ordering::Relaxed);
        let fps = tracker.frames_per_second(frame_count);
        tracing::info!(
            run = %tracker.run.display(),
            frame_count,
            failed,
            frames_per_second = fps,
            "Extraction finished"
        );
        report_progress(&self.progress, || tracker.progress(frame_count, Stage::RunComplete));

        let mask_count = self.masks.len();
        (0..mask_count)
            .map(|m| samples.iter().skip(m).step_by(mask_count).copied().collect())
            .collect()
    }
}

struct RunTracker<'a> {
    run: &'a Path,
    total: usize,
    started: Instant,
    completed: AtomicUsize,
    failures: AtomicUsize,
}

impl<'a> RunTracker<'a> {
    fn new(run: &'a Path, total: usize) -> Self {
        tracing::info!(run = %run.display(), frame_count = total, "Extraction started");
        Self {
            run,
            total,
            started: Instant::now(),
            completed: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        }
    }

    fn frames_per_second(&self, done: usize) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            done as f64 / elapsed
        } else {
            0.0
        }
    }

    fn progress(&self, done: usize, stage: Stage) -> Progress {
        Progress {
            run: self.run.to_path_buf(),
            current: done,
            total: self.total,
            stage,
            frames_per_second: Some(self.frames_per_second(done)),
        }
    }
}

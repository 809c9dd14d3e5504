//! Progress reporting for extraction and regression.

use std::fmt;
use std::path::PathBuf;

use common::SharedFn;
use strum_macros::Display;

/// Progress information emitted at extraction checkpoints.
#[derive(Debug, Clone)]
pub struct Progress {
    /// Run directory being processed.
    pub run: PathBuf,
    /// Frames (or regression pairs) completed so far.
    pub current: usize,
    pub total: usize,
    pub stage: Stage,
    /// Throughput since the start of the run, when known.
    pub frames_per_second: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Stage {
    #[strum(to_string = "extracting")]
    Extracting,
    #[strum(to_string = "run complete")]
    RunComplete,
    #[strum(to_string = "regressing")]
    Regressing,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {}/{}",
            self.run.display(),
            self.stage,
            self.current,
            self.total
        )?;
        if let Some(fps) = self.frames_per_second {
            write!(f, " ({fps:.1} frames/s)")?;
        }
        Ok(())
    }
}

/// Callback type for progress reporting.
pub type ProgressCallback = SharedFn<dyn Fn(Progress) + Send + Sync>;

/// Report progress using the callback if set.
pub fn report_progress(callback: &ProgressCallback, progress: impl FnOnce() -> Progress) {
    if let Some(f) = callback.as_ref() {
        f(progress());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn display_includes_throughput() {
        let progress = Progress {
            run: PathBuf::from("runs/mouse1"),
            current: 222,
            total: 600,
            stage: Stage::Extracting,
            frames_per_second: Some(40.96),
        };
        assert_eq!(progress.to_string(), "runs/mouse1: extracting 222/600 (41.0 frames/s)");
    }

    #[test]
    fn report_skips_none_callback() {
        let callback = ProgressCallback::default();
        report_progress(&callback, || panic!("progress built without observer"));
    }

    #[test]
    fn report_forwards_to_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback = ProgressCallback::new(Arc::new(move |p: Progress| sink.lock().push(p.stage)));
        report_progress(&callback, || Progress {
            run: PathBuf::new(),
            current: 1,
            total: 1,
            stage: Stage::RunComplete,
            frames_per_second: None,
        });
        assert_eq!(*seen.lock(), vec![Stage::RunComplete]);
    }
}

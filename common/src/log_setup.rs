use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::{MakeWriterExt, Tee, WithMaxLevel, WithMinLevel};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Console and rolling-file logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is unset, e.g. `info` or `photom=debug`.
    pub base_level: String,
    pub log_dir: PathBuf,
    pub file_prefix: String,
    /// Daily files kept on disk.
    pub max_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            base_level: "info".to_string(),
            log_dir: PathBuf::from("logs"),
            file_prefix: "photom".to_string(),
            max_files: 5,
        }
    }
}

/// Installs console and rolling-file logging for the process.
///
/// Console output goes to stdout up to INFO and to stderr from WARN, so each
/// event is printed once. Fails if logging is already installed.
pub fn setup_logging(config: &LogConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.base_level))
        .with_context(|| format!("Invalid log filter '{}'", config.base_level))?;

    std::fs::create_dir_all(&config.log_dir).with_context(|| {
        format!("Failed to create log directory {}", config.log_dir.display())
    })?;

    let file_appender = tracing_appender::rolling::Builder::new()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix(&config.file_prefix)
        .filename_suffix("log")
        .max_log_files(config.max_files)
        .build(&config.log_dir)
        .context("Failed to create log file appender")?;

    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    if LOG_GUARD.set(guard).is_err() {
        bail!("Logging already initialized");
    }

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_ansi(true)
        .with_writer(split_console(std::io::stdout, std::io::stderr));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Logger initialization failed")
}

/// Routes WARN and ERROR to `err`, INFO and more verbose to `out`.
fn split_console<O, E>(out: O, err: E) -> Tee<WithMinLevel<O>, WithMaxLevel<E>>
where
    O: for<'a> MakeWriter<'a>,
    E: for<'a> MakeWriter<'a>,
{
    out.with_min_level(Level::INFO).and(err.with_max_level(Level::WARN))
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn console_prints_each_event_once() {
        let (out, err) = (Capture::default(), Capture::default());
        let (out_sink, err_sink) = (out.clone(), err.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .with_ansi(false)
            .with_writer(split_console(
                move || out_sink.clone(),
                move || err_sink.clone(),
            ))
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("mask built");
            tracing::info!("frame sampled");
            tracing::warn!("frame skipped");
            tracing::error!("run failed");
        });

        let (out, err) = (out.text(), err.text());
        assert!(out.contains("mask built") && out.contains("frame sampled"));
        assert!(!out.contains("frame skipped") && !out.contains("run failed"));
        assert!(err.contains("frame skipped") && err.contains("run failed"));
        assert!(!err.contains("frame sampled"));
    }

    #[test]
    fn config_reads_partial_yaml() {
        let config: LogConfig = serde_yml::from_str("base_level: photom=debug\n").unwrap();
        assert_eq!(config.base_level, "photom=debug");
        assert_eq!(config.max_files, 5);
        assert_eq!(config.file_prefix, "photom");
    }
}

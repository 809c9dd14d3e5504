//! Pipeline parameters.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::extract::ExtractionStrategy;

/// Parameters shared by every run of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Interleaved excitation channels per frame sequence.
    pub channel_count: usize,
    pub samples_per_trial: usize,
    /// Trials merged per regression bin.
    pub bin_size: usize,
    pub frame_width: usize,
    pub frame_height: usize,
    /// Frame file name prefix; `None` accepts any name.
    pub frame_prefix: Option<String>,
    pub extraction: ExtractionStrategy,
    /// Frames between progress reports; 0 reports only run completion.
    pub progress_interval: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channel_count: 2,
            samples_per_trial: 600,
            bin_size: 1,
            frame_width: 424,
            frame_height: 424,
            frame_prefix: None,
            extraction: ExtractionStrategy::default(),
            progress_interval: 111,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("channel_count", self.channel_count),
            ("samples_per_trial", self.samples_per_trial),
            ("bin_size", self.bin_size),
            ("frame_width", self.frame_width),
            ("frame_height", self.frame_height),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(Error::InvalidParameter {
                    name,
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Reads a YAML or JSON config, chosen by extension.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config: Self = common::serde::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        common::serde::write_file(self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::test_utils::test_output_dir;

    #[test]
    fn defaults_match_acquisition_rig() {
        let config = PipelineConfig::default();
        assert_eq!(config.channel_count, 2);
        assert_eq!(config.samples_per_trial, 600);
        assert_eq!((config.frame_width, config.frame_height), (424, 424));
        assert_eq!(config.extraction, ExtractionStrategy::Concurrent { workers: 0 });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_counts_are_invalid() {
        let config = PipelineConfig {
            bin_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidParameter { name: "bin_size", .. })
        ));
    }

    #[test]
    fn round_trips_through_yaml_and_json() {
        let dir = test_output_dir("photom_config_round_trip");
        let config = PipelineConfig {
            bin_size: 3,
            frame_prefix: Some("img".to_string()),
            extraction: ExtractionStrategy::Sequential,
            ..Default::default()
        };
        for name in ["config.yaml", "config.json"] {
            let path = dir.join(name);
            config.save(&path).unwrap();
            assert_eq!(PipelineConfig::load(&path).unwrap(), config);
        }
    }

    #[test]
    fn missing_fields_take_defaults() {
        let dir = test_output_dir("photom_config_partial");
        let path = dir.join("partial.yaml");
        std::fs::write(&path, "bin_size: 4\nextraction:\n  concurrent:\n    workers: 3\n").unwrap();
        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.bin_size, 4);
        assert_eq!(config.channel_count, 2);
        assert_eq!(config.extraction, ExtractionStrategy::Concurrent { workers: 3 });
    }

    #[test]
    fn load_rejects_invalid_values() {
        let dir = test_output_dir("photom_config_invalid");
        let path = dir.join("bad.json");
        std::fs::write(&path, r#"{"channel_count": 0}"#).unwrap();
        assert!(PipelineConfig::load(&path).is_err());
    }
}

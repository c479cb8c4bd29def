use std::{fs, path::Path, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{error::CloakError, types::ColorRange};

/// Red straddles hue 0, so it takes two ranges to bracket it.
pub const DEFAULT_COLOR_RANGES: [ColorRange; 2] = [
    ColorRange::new([0, 120, 50], [10, 255, 255]),
    ColorRange::new([170, 120, 70], [180, 255, 255]),
];

const MAX_HUE: u8 = 180;

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CloakConfig {
    pub camera: CameraConfig,
    pub cloak: SegmentationConfig,
    pub output: OutputConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CameraConfig {
    pub device_index: u32,
    pub warmup_ms: u64,
    pub max_read_retries: u32,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SegmentationConfig {
    pub background_frames: usize,
    pub color_ranges: Vec<ColorRange>,
    pub kernel_size: usize,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub codec: String,
    pub frame_rate: f64,
    pub width: u32,
    pub height: u32,
    pub ffmpeg: PathBuf,
    pub window_title: String,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            warmup_ms: 2_000,
            max_read_retries: 3,
        }
    }
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            background_frames: 60,
            color_ranges: DEFAULT_COLOR_RANGES.to_vec(),
            kernel_size: 5,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("output.avi"),
            codec: "XVID".to_string(),
            frame_rate: 20.0,
            width: 640,
            height: 480,
            ffmpeg: PathBuf::from("ffmpeg"),
            window_title: "magic".to_string(),
        }
    }
}

impl CameraConfig {
    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }
}

impl CloakConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        log::info!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> Result<(), CloakError> {
        let invalid = |msg: String| -> Result<(), CloakError> {
            Err(CloakError::InvalidConfig(msg))
        };

        let cloak = &self.cloak;
        if cloak.background_frames == 0 {
            return invalid("cloak.background_frames must be at least 1".into());
        }
        if cloak.kernel_size == 0 {
            return invalid("cloak.kernel_size must be at least 1".into());
        }
        if cloak.color_ranges.is_empty() {
            return invalid("cloak.color_ranges must list at least one range".into());
        }
        for (i, range) in cloak.color_ranges.iter().enumerate() {
            if range.lower.iter().zip(range.upper.iter()).any(|(lo, hi)| lo > hi) {
                return invalid(format!(
                    "cloak.color_ranges[{i}]: lower {:?} exceeds upper {:?}",
                    range.lower, range.upper
                ));
            }
            if range.upper[0] > MAX_HUE {
                return invalid(format!(
                    "cloak.color_ranges[{i}]: hue {} is above {MAX_HUE}",
                    range.upper[0]
                ));
            }
        }

        let output = &self.output;
        if !(output.frame_rate.is_finite() && output.frame_rate > 0.0) {
            return invalid(format!(
                "output.frame_rate must be positive, got {}",
                output.frame_rate
            ));
        }
        if output.width == 0 || output.height == 0 {
            return invalid(format!(
                "output dimensions must be non-zero, got {}x{}",
                output.width, output.height
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_setup() {
        let config = CloakConfig::default();
        assert_eq!(config.cloak.background_frames, 60);
        assert_eq!(config.cloak.kernel_size, 5);
        assert_eq!(config.cloak.color_ranges, DEFAULT_COLOR_RANGES.to_vec());
        assert_eq!(config.output.frame_rate, 20.0);
        assert_eq!((config.output.width, config.output.height), (640, 480));
        assert_eq!(config.output.codec, "XVID");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config = CloakConfig::from_toml(
            r#"
            [camera]
            device_index = 2

            [cloak]
            kernel_size = 3

            [[cloak.color_ranges]]
            lower = [35, 80, 40]
            upper = [85, 255, 255]
            "#,
        )
        .unwrap();

        assert_eq!(config.camera.device_index, 2);
        assert_eq!(config.camera.max_read_retries, 3);
        assert_eq!(config.cloak.kernel_size, 3);
        assert_eq!(config.cloak.background_frames, 60);
        assert_eq!(
            config.cloak.color_ranges,
            vec![ColorRange::new([35, 80, 40], [85, 255, 255])]
        );
        assert_eq!(config.output, OutputConfig::default());
    }

    #[test]
    fn shipped_config_matches_the_defaults() {
        let config = CloakConfig::from_toml(include_str!("../config/default.toml")).unwrap();
        assert_eq!(config, CloakConfig::default());
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(CloakConfig::from_toml("[cloak]\nkernel_size = \"five\"").is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = CloakConfig::from_file("does/not/exist.toml").unwrap_err();
        assert!(err.to_string().contains("does/not/exist.toml"));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let cases: [fn(&mut CloakConfig); 8] = [
            |c| c.cloak.background_frames = 0,
            |c| c.cloak.kernel_size = 0,
            |c| c.cloak.color_ranges.clear(),
            |c| c.cloak.color_ranges[0] = ColorRange::new([20, 0, 0], [10, 255, 255]),
            |c| c.cloak.color_ranges[1] = ColorRange::new([170, 0, 0], [200, 255, 255]),
            |c| c.output.frame_rate = 0.0,
            |c| c.output.frame_rate = f64::NAN,
            |c| c.output.width = 0,
        ];

        for (i, mutate) in cases.iter().enumerate() {
            let mut config = CloakConfig::default();
            mutate(&mut config);
            assert!(
                matches!(config.validate(), Err(CloakError::InvalidConfig(_))),
                "case {i} passed validation"
            );
        }
    }
}

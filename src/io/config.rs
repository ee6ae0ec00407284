use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::capture::{FacingMode, StreamConstraints};
use crate::error::SessionError;
use crate::render::RenderSettings;

/// Session configuration, usually loaded from YAML.
///
/// ```yaml
/// image_target_src: assets/targets.mind
/// max_track: 1
/// facing_mode: environment
/// renderer:
///   pixel_ratio: 2.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Compiled target set handed to the tracker.
    pub image_target_src: String,

    /// Maximum number of targets tracked concurrently.
    pub max_track: usize,

    pub facing_mode: FacingMode,

    pub audio: bool,

    /// Run one inference pass before steady-state processing.
    pub warm_up: bool,

    pub renderer: RenderSettings,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            image_target_src: "targets.mind".to_string(),
            max_track: 1,
            facing_mode: FacingMode::Environment,
            audio: false,
            warm_up: true,
            renderer: RenderSettings::default(),
        }
    }
}

impl SessionConfig {
    /// Config with every default except the target source.
    pub fn with_targets(image_target_src: impl Into<String>) -> Self {
        Self {
            image_target_src: image_target_src.into(),
            ..Self::default()
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).context("Failed to parse session config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config: Self = serde_yaml::from_reader(
            File::open(path).with_context(|| format!("Failed to open {:?}", path))?,
        )
        .with_context(|| format!("Failed to parse {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), SessionError> {
        if self.image_target_src.trim().is_empty() {
            return Err(SessionError::Config("image_target_src is empty".into()));
        }
        if self.max_track == 0 {
            return Err(SessionError::Config("max_track must be at least 1".into()));
        }
        if !(self.renderer.pixel_ratio > 0.0) {
            return Err(SessionError::Config(format!(
                "pixel_ratio must be positive, got {}",
                self.renderer.pixel_ratio
            )));
        }
        Ok(())
    }

    pub fn stream_constraints(&self) -> StreamConstraints {
        StreamConstraints {
            facing_mode: self.facing_mode,
            audio: self.audio,
        }
    }
}

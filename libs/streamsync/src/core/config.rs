// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Engine configuration via `streamsync.yaml`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::clock::{OutputClock, NANOS_PER_SECOND};
use crate::core::format::OutputFormat;
use crate::core::{Result, SyncError};

fn default_time_base() -> u64 {
    NANOS_PER_SECOND
}

/// Engine configuration from `streamsync.yaml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Shape and frame rate of the composed output.
    #[serde(default)]
    pub output: OutputFormat,

    /// Timestamp units per second. Defaults to nanoseconds.
    #[serde(default = "default_time_base")]
    pub time_base: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            output: OutputFormat::default(),
            time_base: default_time_base(),
        }
    }
}

impl SyncConfig {
    /// Configuration file name.
    pub const FILE_NAME: &'static str = "streamsync.yaml";

    /// Load configuration from a directory. Returns error if the file is
    /// missing, unparseable or invalid.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(Self::FILE_NAME);

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            SyncError::Configuration(format!("Failed to read {}: {}", config_path.display(), e))
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            SyncError::Configuration(format!("Failed to parse {}: {}", config_path.display(), e))
        })?;
        config.validate()?;

        tracing::info!("Loaded sync config from {}", config_path.display());
        Ok(config)
    }

    /// Load configuration from a directory, returning defaults if the file is
    /// missing, unparseable or invalid.
    pub fn load_or_default(dir: &Path) -> Self {
        let config_path = dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            tracing::debug!(
                "No {} found in {}, using defaults",
                Self::FILE_NAME,
                dir.display()
            );
            return Self::default();
        }

        match Self::load(dir) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| SyncError::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.time_base == 0 {
            return Err(SyncError::Configuration(
                "time_base must be greater than zero".into(),
            ));
        }
        self.output.validate()?;
        Ok(())
    }

    /// Output clock starting at tick 0.
    pub fn clock(&self) -> Result<OutputClock> {
        self.validate()?;
        Ok(OutputClock::new(self.output.framerate, self.time_base)?)
    }
}

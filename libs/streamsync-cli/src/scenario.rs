// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Scenario files: an engine config plus the driver calls to replay.
//!
//! ```yaml
//! engine:
//!   output: { width: 1280, height: 720, framerate: { num: 1, den: 1 } }
//!   time_base: 1
//! steps:
//!   - { op: admit, stream: 1 }
//!   - { op: format, stream: 1, width: 640, height: 480 }
//!   - { op: frame, stream: 1, pts: 0 }
//!   - { op: retire, stream: 1 }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use streamsync::{
    CompositionPipeline, Compositor, FrameRate, PipelineOutput, PixelFormat, StreamId, SyncConfig,
    Timestamp, VideoFormat,
};

#[derive(Debug, Default, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub engine: SyncConfig,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let scenario = Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        tracing::debug!(
            "Loaded scenario {} ({} step(s))",
            path.display(),
            scenario.steps.len()
        );
        Ok(scenario)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let scenario: Self = serde_yaml::from_str(content).context("Failed to parse scenario")?;
        scenario.engine.validate().context("Invalid engine config")?;
        Ok(scenario)
    }
}

/// One driver call.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Admit {
        stream: StreamId,
        #[serde(default)]
        offset: Timestamp,
    },
    Format {
        stream: StreamId,
        width: u32,
        height: u32,
        #[serde(default)]
        pixel_format: PixelFormat,
        #[serde(default)]
        framerate: Option<FrameRate>,
    },
    Frame {
        stream: StreamId,
        pts: Timestamp,
        /// Defaults to `<stream>@<pts>`.
        #[serde(default)]
        payload: Option<String>,
    },
    Message {
        stream: StreamId,
        message: serde_json::Value,
    },
    Retire {
        stream: StreamId,
    },
    Remove {
        stream: StreamId,
    },
}

impl Step {
    pub fn op(&self) -> &'static str {
        match self {
            Step::Admit { .. } => "admit",
            Step::Format { .. } => "format",
            Step::Frame { .. } => "frame",
            Step::Message { .. } => "message",
            Step::Retire { .. } => "retire",
            Step::Remove { .. } => "remove",
        }
    }

    pub fn stream(&self) -> StreamId {
        match self {
            Step::Admit { stream, .. }
            | Step::Format { stream, .. }
            | Step::Frame { stream, .. }
            | Step::Message { stream, .. }
            | Step::Retire { stream }
            | Step::Remove { stream } => *stream,
        }
    }

    pub fn apply<C: Compositor<String>>(
        &self,
        pipeline: &mut CompositionPipeline<String, C>,
    ) -> streamsync::Result<Vec<PipelineOutput<String>>> {
        match self {
            Step::Admit { stream, offset } => pipeline.admit(*stream, *offset),
            Step::Format {
                stream,
                width,
                height,
                pixel_format,
                framerate,
            } => pipeline.update_format(
                *stream,
                VideoFormat {
                    width: *width,
                    height: *height,
                    pixel_format: *pixel_format,
                    framerate: *framerate,
                },
            ),
            Step::Frame {
                stream,
                pts,
                payload,
            } => {
                let payload = payload
                    .clone()
                    .unwrap_or_else(|| format!("{}@{}", stream, pts));
                pipeline.push_frame(*stream, payload, *pts)
            }
            Step::Message { stream, message } => pipeline.push_message(*stream, message.clone()),
            Step::Retire { stream } => pipeline.retire(*stream),
            Step::Remove { stream } => pipeline.remove(*stream),
        }
    }
}

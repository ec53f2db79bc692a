// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Scene handler interface and the built-in grid layout.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::event::StreamId;
use crate::core::format::{OutputFormat, VideoFormat};

/// Opaque scene configuration returned by a [`SceneHandler`].
///
/// The engine forwards it to the compositor without looking inside.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneDescription(pub serde_json::Value);

impl SceneDescription {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_null()
    }
}

/// What a handler sees when the set of inputs changes.
#[derive(Debug, Clone, Copy)]
pub struct SceneInputs<'a> {
    /// Active streams with a known format.
    pub streams: &'a BTreeMap<StreamId, VideoFormat>,
    pub output: &'a OutputFormat,
}

/// User-supplied callback computing the desired scene for the current inputs.
///
/// Invoked again on every change to the set of active streams or their
/// formats; the engine never diffs scenes.
pub trait SceneHandler: Send {
    fn compute_scene(&mut self, inputs: &SceneInputs<'_>) -> SceneDescription;
}

impl<F> SceneHandler for F
where
    F: FnMut(&SceneInputs<'_>) -> SceneDescription + Send,
{
    fn compute_scene(&mut self, inputs: &SceneInputs<'_>) -> SceneDescription {
        self(inputs)
    }
}

/// Where one stream lands in the output frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub stream: StreamId,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub z: f32,
}

/// Places every input on an even grid, scaled to fit its cell with the aspect
/// ratio preserved.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridLayout;

impl GridLayout {
    pub fn placements(inputs: &SceneInputs<'_>) -> Vec<Placement> {
        let count = inputs.streams.len() as u32;
        if count == 0 {
            return Vec::new();
        }

        let columns = (count as f64).sqrt().ceil() as u32;
        let rows = count.div_ceil(columns);
        let cell_width = inputs.output.width / columns;
        let cell_height = inputs.output.height / rows;

        inputs
            .streams
            .iter()
            .enumerate()
            .map(|(position, (stream, format))| {
                let position = position as u32;
                let (column, row) = (position % columns, position / columns);

                let scale = f64::min(
                    cell_width as f64 / format.width as f64,
                    cell_height as f64 / format.height as f64,
                );
                let width = even_floor(format.width as f64 * scale).min(cell_width);
                let height = even_floor(format.height as f64 * scale).min(cell_height);

                Placement {
                    stream: *stream,
                    x: column * cell_width + (cell_width - width) / 2,
                    y: row * cell_height + (cell_height - height) / 2,
                    width,
                    height,
                    z: 0.0,
                }
            })
            .collect()
    }
}

fn even_floor(value: f64) -> u32 {
    (value.floor() as u32) & !1
}

impl SceneHandler for GridLayout {
    fn compute_scene(&mut self, inputs: &SceneInputs<'_>) -> SceneDescription {
        let placements = Self::placements(inputs);
        SceneDescription(serde_json::json!({
            "layout": "grid",
            "videos": placements,
        }))
    }
}

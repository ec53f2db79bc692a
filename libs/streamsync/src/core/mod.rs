// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

pub mod clock;
pub mod compositor;
pub mod config;
pub mod drain;
pub mod engine;
pub mod error;
pub mod event;
pub mod format;
pub mod observability;
pub mod readiness;
pub mod runtime;
pub mod scene;
pub mod stream_state;
pub mod sync_table;
pub mod topology;

pub use clock::OutputClock;
pub use compositor::{
    ComposedFrame, CompositionContext, CompositionPipeline, Compositor, PipelineOutput,
};
pub use config::SyncConfig;
pub use engine::SyncEngine;
pub use error::*;
pub use event::{ComposedTick, EngineOutput, Event, StreamId, TickFrame, Timestamp};
pub use format::{FormatError, FrameRate, OutputFormat, PixelFormat, VideoFormat};
pub use observability::{EngineStats, StreamSnapshot, SyncSnapshot};
pub use readiness::{evaluate as evaluate_readiness, Readiness};
pub use runtime::{EngineCommand, EngineHandle};
pub use scene::{GridLayout, SceneDescription, SceneHandler, SceneInputs};
pub use stream_state::StreamState;
pub use sync_table::SyncTable;

// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Multi-stream synchronization for frame-by-frame composition.
//!
//! Input streams push format changes, timestamped frames, opaque messages and
//! end-of-stream markers into a [`SyncEngine`]. The engine advances a virtual
//! output clock and emits one [`ComposedTick`] per output frame as soon as every
//! due stream has data for it.

#![allow(clippy::type_complexity)] // Output maps are clear in context

pub mod core;

pub use core::{
    evaluate_readiness, ComposedFrame, ComposedTick, CompositionContext, CompositionPipeline,
    Compositor, EngineCommand, EngineHandle, EngineOutput, EngineStats, Event, FormatError,
    FrameRate, GridLayout, OutputClock, OutputFormat, PipelineOutput, PixelFormat, Readiness,
    Result, SceneDescription, SceneHandler, SceneInputs, StreamId, StreamSnapshot, StreamState,
    SyncConfig, SyncEngine, SyncError, SyncSnapshot, SyncTable, TickFrame, Timestamp,
    VideoFormat,
};

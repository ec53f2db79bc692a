// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Stream admission, format binding, retirement and removal.
//!
//! Every function validates before it mutates, so a rejected call leaves the
//! table exactly as it was.

use crate::core::event::{Event, StreamId, Timestamp};
use crate::core::format::{OutputFormat, VideoFormat};
use crate::core::scene::{SceneDescription, SceneHandler, SceneInputs};
use crate::core::stream_state::StreamState;
use crate::core::sync_table::SyncTable;
use crate::core::{Result, SyncError};

/// How a format update was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatBinding {
    /// Nothing of the stream was emitted or queued yet, so the binding was
    /// updated in place.
    Direct { changed: bool },
    /// Queued behind the stream's pending frames.
    Queued,
}

/// Outcome of [`remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The stream never contributed and was dropped on the spot.
    Dropped {
        discarded_frames: usize,
        discarded_messages: usize,
        format_changed: bool,
    },
    /// An implicit end of stream was queued behind the pending frames.
    Retiring,
    /// The stream had already been retired or finished.
    AlreadyRetired,
}

/// Furthest a start offset may lie ahead of the current tick, in seconds.
///
/// A frame queued by a stream that is not due yet lets empty ticks run up to
/// its offset, so an unbounded offset would spin out an unbounded burst.
pub const MAX_START_LEAD_SECONDS: u64 = 3600;

pub fn admit<P>(table: &mut SyncTable<P>, id: StreamId, start_offset: Timestamp) -> Result<()> {
    let max_lead = i128::from(MAX_START_LEAD_SECONDS) * i128::from(table.clock().time_base());
    let lead = i128::from(start_offset) - i128::from(table.tick());
    if start_offset < 0 || lead > max_lead {
        return Err(SyncError::BadStartOffset {
            stream: id,
            offset: start_offset,
        });
    }
    table.insert(StreamState::new(id, start_offset))?;
    tracing::debug!(
        "Admitted stream {} (start offset {}, tick {})",
        id,
        start_offset,
        table.tick()
    );
    Ok(())
}

pub fn update_format<P>(
    table: &mut SyncTable<P>,
    id: StreamId,
    format: VideoFormat,
) -> Result<FormatBinding> {
    let event = Event::format(format);
    let stream = table.lookup_mut(id)?;
    stream.check_push(&event)?;

    if stream.accepts_direct_format() {
        let changed = table.set_format(id, format);
        tracing::debug!("Stream {}: format bound to {}", id, format);
        return Ok(FormatBinding::Direct { changed });
    }

    stream.push(event)?;
    tracing::trace!("Stream {}: format {} queued", id, format);
    Ok(FormatBinding::Queued)
}

pub fn retire<P>(table: &mut SyncTable<P>, id: StreamId) -> Result<()> {
    table.lookup_mut(id)?.push(Event::EndOfStream)?;
    tracing::debug!("Stream {} retired", id);
    Ok(())
}

/// Cancel a stream mid-flight.
///
/// A stream that never contributed is destroyed immediately together with
/// anything it had queued. Otherwise it is retired so the frames it already
/// delivered still reach their ticks.
pub fn remove<P>(table: &mut SyncTable<P>, id: StreamId) -> Result<Removal> {
    if table.is_retired(id) {
        return Ok(Removal::AlreadyRetired);
    }
    let stream = table.lookup(id)?;

    if stream.is_end_queued() {
        return Ok(Removal::AlreadyRetired);
    }

    if stream.has_contributed() {
        retire(table, id)?;
        return Ok(Removal::Retiring);
    }

    let Some((state, format_changed)) = table.remove(id) else {
        return Err(SyncError::UnknownStream(id));
    };
    let discarded_frames = state.queued_frames();
    let discarded_messages = state.queued_messages();
    if discarded_frames > 0 || discarded_messages > 0 {
        tracing::warn!(
            "Stream {} removed before contributing; discarding {} frame(s) and {} message(s)",
            id,
            discarded_frames,
            discarded_messages
        );
    } else {
        tracing::debug!("Stream {} removed", id);
    }
    Ok(Removal::Dropped {
        discarded_frames,
        discarded_messages,
        format_changed,
    })
}

/// Ask the handler for the scene matching the table's current inputs.
pub fn compute_scene<P>(
    handler: &mut dyn SceneHandler,
    table: &SyncTable<P>,
    output: &OutputFormat,
) -> SceneDescription {
    let inputs = SceneInputs {
        streams: table.aggregate_format(),
        output,
    };
    let scene = handler.compute_scene(&inputs);
    tracing::debug!(
        "Scene recomputed for {} input(s) at tick {}",
        inputs.streams.len(),
        table.tick()
    );
    scene
}

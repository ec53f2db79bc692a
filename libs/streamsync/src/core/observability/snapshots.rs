// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Point-in-time snapshot types for engine observation.

use serde::{Deserialize, Serialize};

use crate::core::event::{StreamId, Timestamp};
use crate::core::format::VideoFormat;
use crate::core::stream_state::StreamState;

/// Running counters kept by the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Composed ticks emitted.
    pub ticks_emitted: u64,
    /// Ticks emitted with no contributing stream.
    pub empty_ticks: u64,
    /// Frames moved into composed ticks.
    pub frames_drained: u64,
    /// Messages forwarded to the driver.
    pub messages_forwarded: u64,
    /// Cycles that ended waiting while frames were queued.
    pub stalls: u64,
    pub streams_admitted: u64,
    pub streams_finished: u64,
}

/// Point-in-time snapshot of one stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSnapshot {
    pub id: StreamId,
    pub start_offset: Timestamp,
    /// Events of any kind waiting in the queue.
    pub queued_events: usize,
    pub queued_frames: usize,
    pub due: bool,
    pub blocking: bool,
    pub end_queued: bool,
    pub contributed: bool,
    pub last_pts: Option<Timestamp>,
    pub format: Option<VideoFormat>,
}

impl StreamSnapshot {
    pub fn capture<P>(stream: &StreamState<P>, tick: Timestamp) -> Self {
        Self {
            id: stream.id(),
            start_offset: stream.start_offset(),
            queued_events: stream.queue_len(),
            queued_frames: stream.queued_frames(),
            due: stream.is_due(tick),
            blocking: stream.is_blocking(tick),
            end_queued: stream.is_end_queued(),
            contributed: stream.has_contributed(),
            last_pts: stream.last_pts(),
            format: stream.format().copied(),
        }
    }
}

/// Point-in-time snapshot of the whole engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSnapshot {
    /// Pts of the next tick to emit.
    pub tick: Timestamp,
    pub tick_index: u64,
    pub terminated: bool,
    pub streams: Vec<StreamSnapshot>,
    pub stats: EngineStats,
}

impl SyncSnapshot {
    /// Streams currently holding the tick back.
    pub fn blocking(&self) -> impl Iterator<Item = StreamId> + '_ {
        self.streams
            .iter()
            .filter(|stream| stream.blocking)
            .map(|stream| stream.id)
    }

    pub fn is_stalled(&self) -> bool {
        self.streams.iter().any(|stream| stream.blocking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::Event;

    #[test]
    fn test_stream_snapshot_capture() {
        let mut stream: StreamState<u8> = StreamState::new(StreamId(5), 3);
        stream.push(Event::message(serde_json::json!("hi"))).unwrap();
        stream.push(Event::frame(1, 3)).unwrap();

        let early = StreamSnapshot::capture(&stream, 0);
        assert!(!early.due);
        assert!(!early.blocking);
        assert_eq!(early.queued_events, 2);
        assert_eq!(early.queued_frames, 1);
        assert_eq!(early.last_pts, Some(3));

        let due = StreamSnapshot::capture(&stream, 3);
        assert!(due.due);
        assert!(!due.blocking);
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = SyncSnapshot {
            tick: 10,
            tick_index: 10,
            terminated: false,
            streams: vec![],
            stats: EngineStats {
                ticks_emitted: 10,
                ..Default::default()
            },
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["stats"]["ticks_emitted"], 10);
        assert!(!snapshot.is_stalled());
    }
}

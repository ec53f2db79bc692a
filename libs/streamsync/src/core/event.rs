// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::format::VideoFormat;
use crate::core::scene::SceneDescription;

/// Presentation timestamp in the configured time base (nanoseconds by default).
pub type Timestamp = i64;

/// Identity of one input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(pub u32);

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for StreamId {
    fn from(id: u32) -> Self {
        StreamId(id)
    }
}

/// One entry of a stream's queue.
///
/// Within a queue events keep insertion order and `EndOfStream`, when present,
/// is always the last element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event<P> {
    FormatChange { format: VideoFormat },
    Frame { payload: P, pts: Timestamp },
    EndOfStream,
    Message { message: serde_json::Value },
}

impl<P> Event<P> {
    pub fn frame(payload: P, pts: Timestamp) -> Self {
        Event::Frame { payload, pts }
    }

    pub fn format(format: VideoFormat) -> Self {
        Event::FormatChange { format }
    }

    pub fn message(message: serde_json::Value) -> Self {
        Event::Message { message }
    }

    #[inline]
    pub fn is_frame(&self) -> bool {
        matches!(self, Event::Frame { .. })
    }

    #[inline]
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Event::EndOfStream)
    }

    /// Short tag used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::FormatChange { .. } => "format_change",
            Event::Frame { .. } => "frame",
            Event::EndOfStream => "end_of_stream",
            Event::Message { .. } => "message",
        }
    }
}

/// A frame taken out of a stream for one output tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickFrame<P> {
    pub payload: P,
    /// Source pts as pushed by the driver.
    pub pts: Timestamp,
}

/// Everything the compositor needs for one output frame: one frame per
/// contributing stream, keyed by stream id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedTick<P> {
    /// Zero-based output frame number.
    pub index: u64,
    /// Output pts of this tick.
    pub pts: Timestamp,
    pub frames: BTreeMap<StreamId, TickFrame<P>>,
}

impl<P> ComposedTick<P> {
    pub fn contains(&self, stream: StreamId) -> bool {
        self.frames.contains_key(&stream)
    }

    pub fn stream_ids(&self) -> impl Iterator<Item = StreamId> + '_ {
        self.frames.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Everything one engine operation can produce, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EngineOutput<P> {
    /// A stream's format became known or changed.
    FormatChanged { stream: StreamId, format: VideoFormat },
    /// Opaque message forwarded in stream order.
    Message {
        stream: StreamId,
        message: serde_json::Value,
    },
    /// The handler returned a new scene for the current set of inputs.
    SceneChanged(SceneDescription),
    /// A stream reached its end and left the table.
    StreamFinished(StreamId),
    Tick(ComposedTick<P>),
    /// Every stream finished. Emitted exactly once.
    EndOfStream,
}

impl<P> EngineOutput<P> {
    pub fn as_tick(&self) -> Option<&ComposedTick<P>> {
        match self {
            EngineOutput::Tick(tick) => Some(tick),
            _ => None,
        }
    }

    pub fn into_tick(self) -> Option<ComposedTick<P>> {
        match self {
            EngineOutput::Tick(tick) => Some(tick),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind() {
        assert_eq!(Event::frame(1u8, 0).kind(), "frame");
        assert_eq!(Event::<u8>::EndOfStream.kind(), "end_of_stream");
        assert!(Event::frame((), 10).is_frame());
        assert!(!Event::<()>::message(serde_json::json!({"a": 1})).is_frame());
    }

    #[test]
    fn test_event_json_shape() {
        let event = Event::frame("payload".to_string(), 40);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "frame");
        assert_eq!(json["pts"], 40);

        let parsed: Event<String> =
            serde_json::from_value(serde_json::json!({"type": "end_of_stream"})).unwrap();
        assert!(parsed.is_end_of_stream());
    }

    #[test]
    fn test_composed_tick_is_keyed() {
        let mut frames = BTreeMap::new();
        frames.insert(StreamId(9), TickFrame { payload: 'b', pts: 0 });
        frames.insert(StreamId(2), TickFrame { payload: 'a', pts: 0 });
        let tick = ComposedTick {
            index: 0,
            pts: 0,
            frames,
        };

        let ids: Vec<_> = tick.stream_ids().collect();
        assert_eq!(ids, vec![StreamId(2), StreamId(9)]);
        assert!(tick.contains(StreamId(9)));
        assert!(!tick.contains(StreamId(3)));
    }
}

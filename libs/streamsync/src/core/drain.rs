// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Tick assembly and end-of-stream reaping.
//!
//! Both steps move events out of stream queues and append what they surface to
//! the caller's output list. Readiness must already say `AllReady` before
//! [`drain_tick`] is called; the loop that alternates evaluation and draining
//! lives in the engine.

use std::collections::BTreeMap;

use crate::core::event::{ComposedTick, EngineOutput, Event, StreamId, TickFrame};
use crate::core::observability::EngineStats;
use crate::core::stream_state::{QueueHead, TakenFrame};
use crate::core::sync_table::SyncTable;

/// Result of assembling one tick.
#[derive(Debug)]
pub struct DrainedTick<P> {
    pub tick: ComposedTick<P>,
    /// A drained format change altered the aggregate format.
    pub format_changed: bool,
}

/// Take one frame from every due stream that has one and build the tick for
/// the current clock position. Does not advance the clock.
pub fn drain_tick<P>(
    table: &mut SyncTable<P>,
    out: &mut Vec<EngineOutput<P>>,
    stats: &mut EngineStats,
) -> DrainedTick<P> {
    let pts = table.tick();
    let index = table.tick_index();

    let mut taken: Vec<(StreamId, TakenFrame<P>)> = Vec::new();
    for stream in table.streams_mut() {
        if !stream.is_due(pts) {
            continue;
        }
        let QueueHead::Frame(at) = stream.head() else {
            continue;
        };
        if let Some(frame) = stream.take_through(at) {
            taken.push((stream.id(), frame));
        }
    }

    let mut format_changed = false;
    let mut frames = BTreeMap::new();
    for (stream, frame) in taken {
        format_changed |= surface_leading(table, stream, frame.leading, out, stats);
        frames.insert(
            stream,
            TickFrame {
                payload: frame.payload,
                pts: frame.pts,
            },
        );
    }

    stats.ticks_emitted += 1;
    stats.frames_drained += frames.len() as u64;
    if frames.is_empty() {
        stats.empty_ticks += 1;
    }
    tracing::trace!("Tick {} (pts {}): {} frame(s)", index, pts, frames.len());

    DrainedTick {
        tick: ComposedTick { index, pts, frames },
        format_changed,
    }
}

/// Apply and forward the format changes and messages that preceded a frame.
fn surface_leading<P>(
    table: &mut SyncTable<P>,
    stream: StreamId,
    events: Vec<Event<P>>,
    out: &mut Vec<EngineOutput<P>>,
    stats: &mut EngineStats,
) -> bool {
    let mut format_changed = false;
    for event in events {
        match event {
            Event::FormatChange { format } => {
                format_changed |= table.set_format(stream, format);
                out.push(EngineOutput::FormatChanged { stream, format });
            }
            Event::Message { message } => {
                stats.messages_forwarded += 1;
                out.push(EngineOutput::Message { stream, message });
            }
            Event::Frame { .. } | Event::EndOfStream => {
                debug_assert!(false, "leading events never hold frames or end of stream");
            }
        }
    }
    format_changed
}

/// Remove every stream whose queue reaches `EndOfStream` before a frame.
///
/// Messages still queued ahead of the end are forwarded first; trailing format
/// changes have no frame left to describe and are dropped. Returns whether the
/// aggregate format changed.
pub fn reap_finished<P>(
    table: &mut SyncTable<P>,
    out: &mut Vec<EngineOutput<P>>,
    stats: &mut EngineStats,
) -> bool {
    let finished: Vec<StreamId> = table
        .streams()
        .filter(|stream| stream.is_finished())
        .map(|stream| stream.id())
        .collect();

    let mut format_changed = false;
    for id in finished {
        let Some((mut state, removed_format)) = table.remove(id) else {
            continue;
        };
        for event in state.take_all() {
            match event {
                Event::Message { message } => {
                    stats.messages_forwarded += 1;
                    out.push(EngineOutput::Message {
                        stream: id,
                        message,
                    });
                }
                Event::FormatChange { format } => {
                    tracing::trace!("Stream {}: dropping trailing format {}", id, format);
                }
                Event::EndOfStream => break,
                Event::Frame { .. } => {
                    debug_assert!(false, "finished streams hold no frames before their end");
                }
            }
        }

        stats.streams_finished += 1;
        format_changed |= removed_format;
        tracing::debug!(
            "Stream {} finished (contributed: {})",
            id,
            state.has_contributed()
        );
        out.push(EngineOutput::StreamFinished(id));
    }
    format_changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::OutputClock;
    use crate::core::format::{FrameRate, PixelFormat, VideoFormat};
    use crate::core::stream_state::StreamState;

    fn table() -> SyncTable<&'static str> {
        SyncTable::new(OutputClock::new(FrameRate::new(1, 1), 1).unwrap())
    }

    fn admit(
        table: &mut SyncTable<&'static str>,
        id: u32,
        offset: i64,
        events: Vec<Event<&'static str>>,
    ) {
        let mut stream = StreamState::new(StreamId(id), offset);
        for event in events {
            stream.push(event).unwrap();
        }
        table.insert(stream).unwrap();
    }

    #[test]
    fn test_drain_takes_one_frame_per_due_stream() {
        let mut table = table();
        admit(&mut table, 1, 0, vec![Event::frame("a0", 0), Event::frame("a1", 1)]);
        admit(&mut table, 2, 0, vec![Event::frame("b0", 0)]);
        admit(&mut table, 3, 4, vec![Event::frame("c4", 4)]);

        let mut out = Vec::new();
        let mut stats = EngineStats::default();
        let drained = drain_tick(&mut table, &mut out, &mut stats);

        assert_eq!(drained.tick.index, 0);
        assert_eq!(drained.tick.pts, 0);
        assert_eq!(
            drained.tick.stream_ids().collect::<Vec<_>>(),
            vec![StreamId(1), StreamId(2)]
        );
        assert_eq!(drained.tick.frames[&StreamId(1)].payload, "a0");
        assert_eq!(table.stream(StreamId(1)).unwrap().queued_frames(), 1);
        assert_eq!(table.stream(StreamId(3)).unwrap().queued_frames(), 1);
        assert!(out.is_empty());
        assert_eq!(stats.frames_drained, 2);
    }

    #[test]
    fn test_leading_events_surface_in_order() {
        let mut table = table();
        let format = VideoFormat::new(640, 480, PixelFormat::I420);
        admit(
            &mut table,
            1,
            0,
            vec![
                Event::message(serde_json::json!("first")),
                Event::format(format),
                Event::message(serde_json::json!("second")),
                Event::frame("a0", 0),
            ],
        );

        let mut out = Vec::new();
        let mut stats = EngineStats::default();
        let drained = drain_tick(&mut table, &mut out, &mut stats);

        assert!(drained.format_changed);
        assert_eq!(out.len(), 3);
        assert!(matches!(&out[0], EngineOutput::Message { message, .. } if message == "first"));
        assert!(matches!(&out[1], EngineOutput::FormatChanged { stream: StreamId(1), .. }));
        assert!(matches!(&out[2], EngineOutput::Message { message, .. } if message == "second"));
        assert_eq!(table.aggregate_format().get(&StreamId(1)), Some(&format));
    }

    #[test]
    fn test_reap_forwards_messages_then_finishes() {
        let mut table = table();
        admit(
            &mut table,
            1,
            0,
            vec![Event::message(serde_json::json!("bye")), Event::EndOfStream],
        );
        admit(&mut table, 2, 0, vec![Event::frame("b0", 0)]);

        let mut out = Vec::new();
        let mut stats = EngineStats::default();
        reap_finished(&mut table, &mut out, &mut stats);

        assert_eq!(table.ids(), vec![StreamId(2)]);
        assert_eq!(out.len(), 2);
        assert!(matches!(out[0], EngineOutput::Message { stream: StreamId(1), .. }));
        assert!(matches!(out[1], EngineOutput::StreamFinished(StreamId(1))));
        assert_eq!(stats.streams_finished, 1);
    }
}

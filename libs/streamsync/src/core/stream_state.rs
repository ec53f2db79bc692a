// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::collections::VecDeque;

use crate::core::event::{Event, StreamId, Timestamp};
use crate::core::format::VideoFormat;
use crate::core::{Result, SyncError};

/// First blocking-relevant entry of a queue, skipping format changes and
/// messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueHead {
    /// A frame sits at this queue index.
    Frame(usize),
    /// The stream ends before any further frame.
    EndOfStream,
    /// Neither a frame nor the end has arrived yet.
    Pending,
}

/// A frame pulled out of a queue together with everything queued ahead of it.
#[derive(Debug)]
pub struct TakenFrame<P> {
    pub leading: Vec<Event<P>>,
    pub payload: P,
    pub pts: Timestamp,
}

/// Per-stream synchronization state.
#[derive(Debug)]
pub struct StreamState<P> {
    id: StreamId,
    start_offset: Timestamp,
    queue: VecDeque<Event<P>>,
    format: Option<VideoFormat>,
    contributed: bool,
    end_queued: bool,
    last_pts: Option<Timestamp>,
}

impl<P> StreamState<P> {
    pub fn new(id: StreamId, start_offset: Timestamp) -> Self {
        Self {
            id,
            start_offset,
            queue: VecDeque::new(),
            format: None,
            contributed: false,
            end_queued: false,
            last_pts: None,
        }
    }

    pub fn id(&self) -> StreamId {
        self.id
    }

    pub fn start_offset(&self) -> Timestamp {
        self.start_offset
    }

    /// Last format applied to this stream's emitted frames.
    pub fn format(&self) -> Option<&VideoFormat> {
        self.format.as_ref()
    }

    /// At least one frame of this stream went into a composed tick.
    pub fn has_contributed(&self) -> bool {
        self.contributed
    }

    pub fn is_end_queued(&self) -> bool {
        self.end_queued
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn queued_frames(&self) -> usize {
        self.queue.iter().filter(|event| event.is_frame()).count()
    }

    pub fn queued_messages(&self) -> usize {
        self.queue
            .iter()
            .filter(|event| matches!(event, Event::Message { .. }))
            .count()
    }

    /// Pts of the most recently pushed frame.
    pub fn last_pts(&self) -> Option<Timestamp> {
        self.last_pts
    }

    #[inline]
    pub fn is_due(&self, tick: Timestamp) -> bool {
        self.start_offset <= tick
    }

    pub fn head(&self) -> QueueHead {
        for (index, event) in self.queue.iter().enumerate() {
            match event {
                Event::Frame { .. } => return QueueHead::Frame(index),
                Event::EndOfStream => return QueueHead::EndOfStream,
                Event::FormatChange { .. } | Event::Message { .. } => {}
            }
        }
        QueueHead::Pending
    }

    /// The stream reaches its end before any further frame.
    pub fn is_finished(&self) -> bool {
        self.head() == QueueHead::EndOfStream
    }

    /// A due stream in this state holds the current tick back.
    pub fn is_blocking(&self, tick: Timestamp) -> bool {
        self.is_due(tick) && self.head() == QueueHead::Pending
    }

    /// Format updates may skip the queue while nothing of this stream was
    /// emitted or is waiting to be emitted, messages included.
    pub fn accepts_direct_format(&self) -> bool {
        !self.contributed && self.queue.is_empty()
    }

    /// Validate an event without applying it.
    pub fn check_push(&self, event: &Event<P>) -> Result<()> {
        if self.end_queued {
            return Err(SyncError::EventAfterEndOfStream(self.id));
        }
        match event {
            Event::Frame { pts, .. } if *pts < 0 => Err(SyncError::BadTimestamp {
                stream: self.id,
                pts: *pts,
            }),
            Event::FormatChange { format } => Ok(format.validate()?),
            _ => Ok(()),
        }
    }

    pub fn push(&mut self, event: Event<P>) -> Result<()> {
        self.check_push(&event)?;

        match &event {
            Event::Frame { pts, .. } => {
                match self.last_pts {
                    Some(last) if *pts < last => {
                        tracing::warn!(
                            "Stream {}: frame pts {} goes backwards (previous {})",
                            self.id,
                            pts,
                            last
                        );
                    }
                    _ => {}
                }
                self.last_pts = Some(*pts);
            }
            Event::EndOfStream => self.end_queued = true,
            Event::FormatChange { .. } | Event::Message { .. } => {}
        }

        self.queue.push_back(event);
        Ok(())
    }

    pub(crate) fn set_format(&mut self, format: VideoFormat) {
        self.format = Some(format);
    }

    /// Remove every event up to and including the frame at `index`.
    ///
    /// Format changes met on the way are applied to this stream before the
    /// frame is handed out.
    pub(crate) fn take_through(&mut self, index: usize) -> Option<TakenFrame<P>> {
        if index >= self.queue.len() || !self.queue[index].is_frame() {
            return None;
        }

        let leading: Vec<Event<P>> = self.queue.drain(..index).collect();
        for event in &leading {
            if let Event::FormatChange { format } = event {
                self.format = Some(*format);
            }
        }

        match self.queue.pop_front() {
            Some(Event::Frame { payload, pts }) => {
                self.contributed = true;
                Some(TakenFrame {
                    leading,
                    payload,
                    pts,
                })
            }
            _ => None,
        }
    }

    /// Empty the queue, returning the events in order.
    pub(crate) fn take_all(&mut self) -> Vec<Event<P>> {
        self.queue.drain(..).collect()
    }
}

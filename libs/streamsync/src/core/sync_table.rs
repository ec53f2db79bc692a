// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::collections::{BTreeMap, BTreeSet};

use crate::core::clock::OutputClock;
use crate::core::event::{StreamId, Timestamp};
use crate::core::format::VideoFormat;
use crate::core::stream_state::StreamState;
use crate::core::{Result, SyncError};

/// All per-stream state plus the output clock.
///
/// Owned by exactly one engine; every mutation goes through the engine's
/// operations.
#[derive(Debug)]
pub struct SyncTable<P> {
    streams: BTreeMap<StreamId, StreamState<P>>,
    clock: OutputClock,
    aggregate_format: BTreeMap<StreamId, VideoFormat>,
    /// Streams that finished and left the table.
    retired: BTreeSet<StreamId>,
    admitted_total: usize,
}

impl<P> SyncTable<P> {
    pub fn new(clock: OutputClock) -> Self {
        Self {
            streams: BTreeMap::new(),
            clock,
            aggregate_format: BTreeMap::new(),
            retired: BTreeSet::new(),
            admitted_total: 0,
        }
    }

    #[inline]
    pub fn tick(&self) -> Timestamp {
        self.clock.tick()
    }

    #[inline]
    pub fn tick_index(&self) -> u64 {
        self.clock.index()
    }

    pub fn clock(&self) -> &OutputClock {
        &self.clock
    }

    pub(crate) fn advance(&mut self) {
        self.clock.advance();
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn contains(&self, id: StreamId) -> bool {
        self.streams.contains_key(&id)
    }

    /// Number of admissions over the table's lifetime.
    pub fn admitted_total(&self) -> usize {
        self.admitted_total
    }

    pub fn is_retired(&self, id: StreamId) -> bool {
        self.retired.contains(&id)
    }

    pub fn streams(&self) -> impl Iterator<Item = &StreamState<P>> {
        self.streams.values()
    }

    pub(crate) fn streams_mut(&mut self) -> impl Iterator<Item = &mut StreamState<P>> {
        self.streams.values_mut()
    }

    pub fn ids(&self) -> Vec<StreamId> {
        self.streams.keys().copied().collect()
    }

    pub fn stream(&self, id: StreamId) -> Option<&StreamState<P>> {
        self.streams.get(&id)
    }

    /// Like [`stream`](Self::stream) but tells a finished stream apart from one
    /// that never existed.
    pub fn lookup(&self, id: StreamId) -> Result<&StreamState<P>> {
        match self.streams.get(&id) {
            Some(stream) => Ok(stream),
            None => Err(self.missing(id)),
        }
    }

    pub(crate) fn lookup_mut(&mut self, id: StreamId) -> Result<&mut StreamState<P>> {
        if !self.streams.contains_key(&id) {
            return Err(self.missing(id));
        }
        self.streams
            .get_mut(&id)
            .ok_or(SyncError::UnknownStream(id))
    }

    fn missing(&self, id: StreamId) -> SyncError {
        if self.retired.contains(&id) {
            SyncError::EventAfterEndOfStream(id)
        } else {
            SyncError::UnknownStream(id)
        }
    }

    pub(crate) fn insert(&mut self, state: StreamState<P>) -> Result<()> {
        let id = state.id();
        if self.streams.contains_key(&id) {
            return Err(SyncError::StreamAlreadyAdmitted(id));
        }
        self.retired.remove(&id);
        self.streams.insert(id, state);
        self.admitted_total += 1;
        Ok(())
    }

    /// Drop a stream from the table. Returns whether the aggregate format
    /// changed as a result.
    pub(crate) fn remove(&mut self, id: StreamId) -> Option<(StreamState<P>, bool)> {
        let state = self.streams.remove(&id)?;
        self.retired.insert(id);
        let format_changed = self.aggregate_format.remove(&id).is_some();
        Some((state, format_changed))
    }

    pub fn aggregate_format(&self) -> &BTreeMap<StreamId, VideoFormat> {
        &self.aggregate_format
    }

    /// Record a stream's current format. Returns `false` when nothing changed.
    pub(crate) fn set_format(&mut self, id: StreamId, format: VideoFormat) -> bool {
        if let Some(stream) = self.streams.get_mut(&id) {
            stream.set_format(format);
        }
        self.aggregate_format.insert(id, format) != Some(format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::format::{FrameRate, PixelFormat};

    fn table() -> SyncTable<u32> {
        SyncTable::new(OutputClock::new(FrameRate::new(1, 1), 1).unwrap())
    }

    #[test]
    fn test_duplicate_admission_rejected() {
        let mut table = table();
        table.insert(StreamState::new(StreamId(1), 0)).unwrap();
        let err = table.insert(StreamState::new(StreamId(1), 5)).unwrap_err();
        assert!(matches!(err, SyncError::StreamAlreadyAdmitted(StreamId(1))));
        assert_eq!(table.len(), 1);
        assert_eq!(table.admitted_total(), 1);
    }

    #[test]
    fn test_lookup_distinguishes_retired_streams() {
        let mut table = table();
        table.insert(StreamState::new(StreamId(1), 0)).unwrap();
        table.remove(StreamId(1)).unwrap();

        assert!(matches!(
            table.lookup(StreamId(1)),
            Err(SyncError::EventAfterEndOfStream(StreamId(1)))
        ));
        assert!(matches!(
            table.lookup(StreamId(2)),
            Err(SyncError::UnknownStream(StreamId(2)))
        ));
        assert!(table.is_retired(StreamId(1)));
    }

    #[test]
    fn test_aggregate_format_tracks_changes() {
        let mut table = table();
        table.insert(StreamState::new(StreamId(4), 0)).unwrap();
        let format = VideoFormat::new(640, 360, PixelFormat::I420);

        assert!(table.set_format(StreamId(4), format));
        assert!(!table.set_format(StreamId(4), format));
        assert_eq!(table.stream(StreamId(4)).unwrap().format(), Some(&format));

        let (_, changed) = table.remove(StreamId(4)).unwrap();
        assert!(changed);
        assert!(table.aggregate_format().is_empty());
    }

    #[test]
    fn test_advance_moves_tick() {
        let mut table = table();
        assert_eq!(table.tick(), 0);
        table.advance();
        assert_eq!(table.tick(), 1);
        assert_eq!(table.tick_index(), 1);
    }
}

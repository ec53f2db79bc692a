// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Global readiness predicate over a [`SyncTable`].

use crate::core::event::StreamId;
use crate::core::stream_state::QueueHead;
use crate::core::sync_table::SyncTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The current tick can be emitted.
    AllReady,
    /// Every stream reached its end with no frame ahead of it.
    AllFinished,
    /// A due stream has not delivered a frame yet. Not an error.
    Waiting,
}

/// Decide whether the current tick can be emitted.
///
/// Streams that are not yet due never block. Streams whose queue reaches
/// `EndOfStream` before any frame never block either. An empty table counts as
/// finished once at least one stream has been admitted.
pub fn evaluate<P>(table: &SyncTable<P>) -> Readiness {
    if table.is_empty() {
        return if table.admitted_total() > 0 {
            Readiness::AllFinished
        } else {
            Readiness::Waiting
        };
    }

    let tick = table.tick();
    let mut any_frame = false;
    let mut all_finished = true;

    for stream in table.streams() {
        match stream.head() {
            QueueHead::Frame(_) => {
                any_frame = true;
                all_finished = false;
            }
            QueueHead::EndOfStream => {}
            QueueHead::Pending => {
                if stream.is_due(tick) {
                    return Readiness::Waiting;
                }
                all_finished = false;
            }
        }
    }

    if all_finished {
        Readiness::AllFinished
    } else if any_frame {
        Readiness::AllReady
    } else {
        Readiness::Waiting
    }
}

/// Due streams that hold the current tick back.
pub fn blocking_streams<P>(table: &SyncTable<P>) -> Vec<StreamId> {
    let tick = table.tick();
    table
        .streams()
        .filter(|stream| stream.is_blocking(tick))
        .map(|stream| stream.id())
        .collect()
}

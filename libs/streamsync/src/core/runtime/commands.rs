// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use crossbeam_channel::Sender;

use crate::core::event::{Event, StreamId, Timestamp};
use crate::core::format::VideoFormat;
use crate::core::observability::SyncSnapshot;
use crate::core::Result;

pub(crate) type Reply<T> = Sender<Result<T>>;

/// Commands processed by the engine thread. Mutating commands reply with the
/// number of outputs they published.
pub enum EngineCommand<P> {
    Admit {
        id: StreamId,
        start_offset: Timestamp,
        reply: Reply<usize>,
    },
    UpdateFormat {
        id: StreamId,
        format: VideoFormat,
        reply: Reply<usize>,
    },
    PushEvent {
        id: StreamId,
        event: Event<P>,
        reply: Reply<usize>,
    },
    Retire {
        id: StreamId,
        reply: Reply<usize>,
    },
    Remove {
        id: StreamId,
        reply: Reply<usize>,
    },
    Snapshot {
        reply: Reply<SyncSnapshot>,
    },
    Shutdown,
}

// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Thread-safe front for a [`SyncEngine`] running on its own thread.

use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

use super::command_receiver::CommandReceiver;
use super::commands::EngineCommand;
use crate::core::engine::SyncEngine;
use crate::core::event::{EngineOutput, Event, StreamId, Timestamp};
use crate::core::format::VideoFormat;
use crate::core::observability::SyncSnapshot;
use crate::core::{Result, SyncError};

/// Serializes engine calls from any number of threads.
///
/// Every call blocks until the engine thread has applied it and published its
/// outputs on the receiver returned by [`EngineHandle::spawn`]. The thread
/// stops on [`EngineHandle::shutdown`] or once every handle is dropped.
pub struct EngineHandle<P> {
    command_tx: Sender<EngineCommand<P>>,
    thread: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl<P> Clone for EngineHandle<P> {
    fn clone(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            thread: Arc::clone(&self.thread),
        }
    }
}

impl<P: Send + 'static> EngineHandle<P> {
    pub fn spawn(mut engine: SyncEngine<P>) -> Result<(Self, Receiver<EngineOutput<P>>)> {
        let (command_tx, command_rx) = crossbeam_channel::unbounded::<EngineCommand<P>>();
        let (output_tx, output_rx) = crossbeam_channel::unbounded();

        let thread = std::thread::Builder::new()
            .name("streamsync-engine".to_string())
            .spawn(move || {
                tracing::debug!("Engine thread started");
                while let Ok(cmd) = command_rx.recv() {
                    if engine.process_command(cmd, &output_tx).is_break() {
                        break;
                    }
                }
                tracing::debug!(
                    "Engine thread exiting after {} tick(s)",
                    engine.stats().ticks_emitted
                );
            })?;

        let handle = Self {
            command_tx,
            thread: Arc::new(Mutex::new(Some(thread))),
        };
        Ok((handle, output_rx))
    }
}

impl<P> EngineHandle<P> {
    fn send_and_recv<T>(
        &self,
        make_cmd: impl FnOnce(Sender<Result<T>>) -> EngineCommand<P>,
    ) -> Result<T> {
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        let cmd = make_cmd(reply_tx);

        self.command_tx
            .send(cmd)
            .map_err(|_| SyncError::Runtime("Engine command channel closed".into()))?;

        reply_rx
            .recv()
            .map_err(|_| SyncError::Runtime("Engine reply channel closed".into()))?
    }

    pub fn admit(&self, id: StreamId, start_offset: Timestamp) -> Result<usize> {
        self.send_and_recv(|reply| EngineCommand::Admit {
            id,
            start_offset,
            reply,
        })
    }

    pub fn update_format(&self, id: StreamId, format: VideoFormat) -> Result<usize> {
        self.send_and_recv(|reply| EngineCommand::UpdateFormat { id, format, reply })
    }

    pub fn push_event(&self, id: StreamId, event: Event<P>) -> Result<usize> {
        self.send_and_recv(|reply| EngineCommand::PushEvent { id, event, reply })
    }

    pub fn push_frame(&self, id: StreamId, payload: P, pts: Timestamp) -> Result<usize> {
        self.push_event(id, Event::frame(payload, pts))
    }

    pub fn push_message(&self, id: StreamId, message: serde_json::Value) -> Result<usize> {
        self.push_event(id, Event::message(message))
    }

    pub fn retire(&self, id: StreamId) -> Result<usize> {
        self.send_and_recv(|reply| EngineCommand::Retire { id, reply })
    }

    pub fn remove(&self, id: StreamId) -> Result<usize> {
        self.send_and_recv(|reply| EngineCommand::Remove { id, reply })
    }

    pub fn snapshot(&self) -> Result<SyncSnapshot> {
        self.send_and_recv(|reply| EngineCommand::Snapshot { reply })
    }

    /// Stop the engine thread and wait for it. Later calls on any clone of
    /// this handle fail with [`SyncError::Runtime`].
    pub fn shutdown(&self) -> Result<()> {
        // The thread may already be gone; joining below still succeeds.
        let _ = self.command_tx.send(EngineCommand::Shutdown);

        let Some(thread) = self.thread.lock().take() else {
            return Ok(());
        };
        thread
            .join()
            .map_err(|_| SyncError::Runtime("Engine thread panicked".into()))
    }
}

// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::ops::ControlFlow;

use crossbeam_channel::Sender;

use super::commands::EngineCommand;
use crate::core::engine::SyncEngine;
use crate::core::event::EngineOutput;
use crate::core::Result;

pub trait CommandReceiver<P> {
    /// Apply one command, publishing its outputs before replying.
    fn process_command(
        &mut self,
        cmd: EngineCommand<P>,
        outputs: &Sender<EngineOutput<P>>,
    ) -> ControlFlow<()>;
}

impl<P> CommandReceiver<P> for SyncEngine<P> {
    fn process_command(
        &mut self,
        cmd: EngineCommand<P>,
        outputs: &Sender<EngineOutput<P>>,
    ) -> ControlFlow<()> {
        match cmd {
            EngineCommand::Admit {
                id,
                start_offset,
                reply,
            } => {
                let _ = reply.send(publish(self.admit(id, start_offset), outputs));
            }
            EngineCommand::UpdateFormat { id, format, reply } => {
                let _ = reply.send(publish(self.update_format(id, format), outputs));
            }
            EngineCommand::PushEvent { id, event, reply } => {
                let _ = reply.send(publish(self.push_event(id, event), outputs));
            }
            EngineCommand::Retire { id, reply } => {
                let _ = reply.send(publish(self.retire(id), outputs));
            }
            EngineCommand::Remove { id, reply } => {
                let _ = reply.send(publish(self.remove(id), outputs));
            }
            EngineCommand::Snapshot { reply } => {
                let _ = reply.send(Ok(self.snapshot()));
            }
            EngineCommand::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }
}

fn publish<P>(
    result: Result<Vec<EngineOutput<P>>>,
    outputs: &Sender<EngineOutput<P>>,
) -> Result<usize> {
    let batch = result?;
    let count = batch.len();
    for output in batch {
        if outputs.send(output).is_err() {
            tracing::trace!("Output receiver dropped; discarding engine output");
            break;
        }
    }
    Ok(count)
}

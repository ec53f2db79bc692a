// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! The synchronization engine.
//!
//! Every public operation validates its input, applies it to the table and
//! then runs exactly one evaluate-and-drain cycle. A cycle may emit any number
//! of ticks: it keeps draining while readiness says `AllReady` and stops on
//! `Waiting` or `AllFinished`.

use crate::core::config::SyncConfig;
use crate::core::drain;
use crate::core::event::{EngineOutput, Event, StreamId, Timestamp};
use crate::core::format::{OutputFormat, VideoFormat};
use crate::core::observability::{EngineStats, StreamSnapshot, SyncSnapshot};
use crate::core::readiness::{self, Readiness};
use crate::core::scene::{SceneDescription, SceneHandler};
use crate::core::sync_table::SyncTable;
use crate::core::topology::{self, FormatBinding, Removal};
use crate::core::{Result, SyncError};

pub struct SyncEngine<P> {
    table: SyncTable<P>,
    output: OutputFormat,
    handler: Box<dyn SceneHandler>,
    scene: SceneDescription,
    stats: EngineStats,
    terminated: bool,
}

impl<P> SyncEngine<P> {
    pub fn new(config: &SyncConfig, handler: impl SceneHandler + 'static) -> Result<Self> {
        Self::with_boxed_handler(config, Box::new(handler))
    }

    pub fn with_boxed_handler(config: &SyncConfig, handler: Box<dyn SceneHandler>) -> Result<Self> {
        let clock = config.clock()?;
        tracing::debug!(
            "Sync engine at {} fps ({}x{} {}), time base {}",
            config.output.framerate,
            config.output.width,
            config.output.height,
            config.output.pixel_format,
            config.time_base
        );
        Ok(Self {
            table: SyncTable::new(clock),
            output: config.output,
            handler,
            scene: SceneDescription::default(),
            stats: EngineStats::default(),
            terminated: false,
        })
    }

    // =========================================================================
    // Topology
    // =========================================================================

    /// Admit a stream that may contribute from `start_offset` on.
    pub fn admit(&mut self, id: StreamId, start_offset: Timestamp) -> Result<Vec<EngineOutput<P>>> {
        if self.terminated {
            return Err(SyncError::Terminated);
        }
        topology::admit(&mut self.table, id, start_offset)?;
        self.stats.streams_admitted += 1;
        Ok(self.run_cycle(Vec::new()))
    }

    pub fn update_format(
        &mut self,
        id: StreamId,
        format: VideoFormat,
    ) -> Result<Vec<EngineOutput<P>>> {
        let binding = topology::update_format(&mut self.table, id, format)?;

        let mut out = Vec::new();
        if binding == (FormatBinding::Direct { changed: true }) {
            out.push(EngineOutput::FormatChanged { stream: id, format });
            self.refresh_scene(&mut out);
        }
        Ok(self.run_cycle(out))
    }

    /// Queue an end of stream. Frames already queued still reach their ticks.
    pub fn retire(&mut self, id: StreamId) -> Result<Vec<EngineOutput<P>>> {
        topology::retire(&mut self.table, id)?;
        Ok(self.run_cycle(Vec::new()))
    }

    /// Cancel a stream. Always safe; see [`topology::remove`].
    pub fn remove(&mut self, id: StreamId) -> Result<Vec<EngineOutput<P>>> {
        let removal = topology::remove(&mut self.table, id)?;

        let mut out = Vec::new();
        if let Removal::Dropped { format_changed, .. } = removal {
            self.stats.streams_finished += 1;
            out.push(EngineOutput::StreamFinished(id));
            if format_changed {
                self.refresh_scene(&mut out);
            }
        }
        Ok(self.run_cycle(out))
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub fn push_event(&mut self, id: StreamId, event: Event<P>) -> Result<Vec<EngineOutput<P>>> {
        match event {
            Event::FormatChange { format } => self.update_format(id, format),
            Event::EndOfStream => self.retire(id),
            event @ (Event::Frame { .. } | Event::Message { .. }) => {
                self.table.lookup_mut(id)?.push(event)?;
                Ok(self.run_cycle(Vec::new()))
            }
        }
    }

    pub fn push_frame(
        &mut self,
        id: StreamId,
        payload: P,
        pts: Timestamp,
    ) -> Result<Vec<EngineOutput<P>>> {
        self.push_event(id, Event::frame(payload, pts))
    }

    pub fn push_message(
        &mut self,
        id: StreamId,
        message: serde_json::Value,
    ) -> Result<Vec<EngineOutput<P>>> {
        self.push_event(id, Event::message(message))
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    pub fn readiness(&self) -> Readiness {
        readiness::evaluate(&self.table)
    }

    /// Due streams the engine is waiting on.
    pub fn blocking_streams(&self) -> Vec<StreamId> {
        readiness::blocking_streams(&self.table)
    }

    /// Pts of the next tick to emit.
    pub fn tick(&self) -> Timestamp {
        self.table.tick()
    }

    pub fn tick_index(&self) -> u64 {
        self.table.tick_index()
    }

    pub fn table(&self) -> &SyncTable<P> {
        &self.table
    }

    pub fn aggregate_format(&self) -> &std::collections::BTreeMap<StreamId, VideoFormat> {
        self.table.aggregate_format()
    }

    pub fn output_format(&self) -> &OutputFormat {
        &self.output
    }

    /// Last scene returned by the handler.
    pub fn scene(&self) -> &SceneDescription {
        &self.scene
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// The terminal end of stream has been emitted.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        let tick = self.table.tick();
        SyncSnapshot {
            tick,
            tick_index: self.table.tick_index(),
            terminated: self.terminated,
            streams: self
                .table
                .streams()
                .map(|stream| StreamSnapshot::capture(stream, tick))
                .collect(),
            stats: self.stats,
        }
    }

    // =========================================================================
    // Drain loop
    // =========================================================================

    fn run_cycle(&mut self, mut out: Vec<EngineOutput<P>>) -> Vec<EngineOutput<P>> {
        loop {
            if drain::reap_finished(&mut self.table, &mut out, &mut self.stats) {
                self.refresh_scene(&mut out);
            }

            match readiness::evaluate(&self.table) {
                Readiness::AllReady => {
                    let drained = drain::drain_tick(&mut self.table, &mut out, &mut self.stats);
                    if drained.format_changed {
                        self.refresh_scene(&mut out);
                    }
                    out.push(EngineOutput::Tick(drained.tick));
                    self.table.advance();
                }
                Readiness::AllFinished => {
                    if !self.terminated {
                        self.terminated = true;
                        tracing::info!(
                            "All streams finished after {} tick(s)",
                            self.stats.ticks_emitted
                        );
                        out.push(EngineOutput::EndOfStream);
                    }
                    break;
                }
                Readiness::Waiting => {
                    if self.table.streams().any(|stream| stream.queued_frames() > 0) {
                        self.stats.stalls += 1;
                        tracing::debug!(
                            "Tick {} waiting on stream(s) {:?}",
                            self.table.tick(),
                            self.blocking_streams()
                        );
                    }
                    break;
                }
            }
        }
        out
    }

    fn refresh_scene(&mut self, out: &mut Vec<EngineOutput<P>>) {
        self.scene = topology::compute_scene(self.handler.as_mut(), &self.table, &self.output);
        out.push(EngineOutput::SceneChanged(self.scene.clone()));
    }
}

impl<P> std::fmt::Debug for SyncEngine<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("tick", &self.table.tick())
            .field("streams", &self.table.ids())
            .field("terminated", &self.terminated)
            .field("stats", &self.stats)
            .finish()
    }
}

// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Turns composed ticks into output frames.
//!
//! [`CompositionPipeline`] replays the engine's notifications in order, so the
//! compositor always sees the formats and scene that were current at the tick
//! it is composing, even when one call emits several ticks around a format
//! change.

use std::collections::BTreeMap;

use crate::core::engine::SyncEngine;
use crate::core::event::{ComposedTick, EngineOutput, Event, StreamId, Timestamp};
use crate::core::format::{OutputFormat, VideoFormat};
use crate::core::scene::SceneDescription;
use crate::core::{Result, SyncError};

/// Everything a compositor may consult besides the tick itself.
#[derive(Debug, Clone, Copy)]
pub struct CompositionContext<'a> {
    pub output: &'a OutputFormat,
    /// Formats of the streams with a known format.
    pub formats: &'a BTreeMap<StreamId, VideoFormat>,
    pub scene: &'a SceneDescription,
}

/// Combines the frames of one tick into a single output frame.
pub trait Compositor<P>: Send {
    fn compose(
        &mut self,
        tick: &ComposedTick<P>,
        ctx: &CompositionContext<'_>,
    ) -> anyhow::Result<P>;
}

impl<P, F> Compositor<P> for F
where
    F: FnMut(&ComposedTick<P>, &CompositionContext<'_>) -> anyhow::Result<P> + Send,
{
    fn compose(
        &mut self,
        tick: &ComposedTick<P>,
        ctx: &CompositionContext<'_>,
    ) -> anyhow::Result<P> {
        self(tick, ctx)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposedFrame<P> {
    pub index: u64,
    pub pts: Timestamp,
    pub payload: P,
}

#[derive(Debug)]
pub enum PipelineOutput<P> {
    Composed(ComposedFrame<P>),
    /// The compositor failed on one tick. Later ticks are still composed.
    Failed(SyncError),
    /// Any engine output other than a tick.
    Notification(EngineOutput<P>),
}

impl<P> PipelineOutput<P> {
    pub fn as_composed(&self) -> Option<&ComposedFrame<P>> {
        match self {
            PipelineOutput::Composed(frame) => Some(frame),
            _ => None,
        }
    }
}

pub struct CompositionPipeline<P, C> {
    engine: SyncEngine<P>,
    compositor: C,
    formats: BTreeMap<StreamId, VideoFormat>,
    scene: SceneDescription,
}

impl<P, C: Compositor<P>> CompositionPipeline<P, C> {
    pub fn new(engine: SyncEngine<P>, compositor: C) -> Self {
        let formats = engine.aggregate_format().clone();
        let scene = engine.scene().clone();
        Self {
            engine,
            compositor,
            formats,
            scene,
        }
    }

    pub fn engine(&self) -> &SyncEngine<P> {
        &self.engine
    }

    pub fn compositor(&self) -> &C {
        &self.compositor
    }

    pub fn into_parts(self) -> (SyncEngine<P>, C) {
        (self.engine, self.compositor)
    }

    pub fn admit(
        &mut self,
        id: StreamId,
        start_offset: Timestamp,
    ) -> Result<Vec<PipelineOutput<P>>> {
        let outputs = self.engine.admit(id, start_offset)?;
        Ok(self.compose_all(outputs))
    }

    pub fn update_format(
        &mut self,
        id: StreamId,
        format: VideoFormat,
    ) -> Result<Vec<PipelineOutput<P>>> {
        let outputs = self.engine.update_format(id, format)?;
        Ok(self.compose_all(outputs))
    }

    pub fn push_event(
        &mut self,
        id: StreamId,
        event: Event<P>,
    ) -> Result<Vec<PipelineOutput<P>>> {
        let outputs = self.engine.push_event(id, event)?;
        Ok(self.compose_all(outputs))
    }

    pub fn push_frame(
        &mut self,
        id: StreamId,
        payload: P,
        pts: Timestamp,
    ) -> Result<Vec<PipelineOutput<P>>> {
        self.push_event(id, Event::frame(payload, pts))
    }

    pub fn push_message(
        &mut self,
        id: StreamId,
        message: serde_json::Value,
    ) -> Result<Vec<PipelineOutput<P>>> {
        self.push_event(id, Event::message(message))
    }

    pub fn retire(&mut self, id: StreamId) -> Result<Vec<PipelineOutput<P>>> {
        let outputs = self.engine.retire(id)?;
        Ok(self.compose_all(outputs))
    }

    pub fn remove(&mut self, id: StreamId) -> Result<Vec<PipelineOutput<P>>> {
        let outputs = self.engine.remove(id)?;
        Ok(self.compose_all(outputs))
    }

    fn compose_all(&mut self, outputs: Vec<EngineOutput<P>>) -> Vec<PipelineOutput<P>> {
        outputs
            .into_iter()
            .map(|output| self.compose_one(output))
            .collect()
    }

    fn compose_one(&mut self, output: EngineOutput<P>) -> PipelineOutput<P> {
        let tick = match output {
            EngineOutput::Tick(tick) => tick,
            other => {
                self.track(&other);
                return PipelineOutput::Notification(other);
            }
        };

        let ctx = CompositionContext {
            output: self.engine.output_format(),
            formats: &self.formats,
            scene: &self.scene,
        };
        match self.compositor.compose(&tick, &ctx) {
            Ok(payload) => PipelineOutput::Composed(ComposedFrame {
                index: tick.index,
                pts: tick.pts,
                payload,
            }),
            Err(source) => {
                tracing::warn!(
                    "Compositor failed on tick {} (pts {}): {:#}",
                    tick.index,
                    tick.pts,
                    source
                );
                PipelineOutput::Failed(SyncError::Compositor {
                    index: tick.index,
                    pts: tick.pts,
                    source,
                })
            }
        }
    }

    fn track(&mut self, output: &EngineOutput<P>) {
        match output {
            EngineOutput::FormatChanged { stream, format } => {
                self.formats.insert(*stream, *format);
            }
            EngineOutput::StreamFinished(stream) => {
                self.formats.remove(stream);
            }
            EngineOutput::SceneChanged(scene) => {
                self.scene = scene.clone();
            }
            EngineOutput::Message { .. } | EngineOutput::Tick(_) | EngineOutput::EndOfStream => {}
        }
    }
}

impl<P, C> std::fmt::Debug for CompositionPipeline<P, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositionPipeline")
            .field("engine", &self.engine)
            .field("formats", &self.formats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SyncConfig;
    use crate::core::format::{FrameRate, PixelFormat};
    use crate::core::scene::GridLayout;

    fn engine() -> SyncEngine<String> {
        let mut config = SyncConfig::default();
        config.output.framerate = FrameRate::new(1, 1);
        config.time_base = 1;
        SyncEngine::new(&config, GridLayout).unwrap()
    }

    fn join(tick: &ComposedTick<String>, ctx: &CompositionContext<'_>) -> anyhow::Result<String> {
        let parts: Vec<String> = tick
            .frames
            .iter()
            .map(|(id, frame)| match ctx.formats.get(id) {
                Some(format) => format!(
                    "{}:{}@{}x{}",
                    id, frame.payload, format.width, format.height
                ),
                None => format!("{}:{}", id, frame.payload),
            })
            .collect();
        Ok(parts.join(","))
    }

    fn composed(outputs: &[PipelineOutput<String>]) -> Vec<String> {
        outputs
            .iter()
            .filter_map(PipelineOutput::as_composed)
            .map(|frame| frame.payload.clone())
            .collect()
    }

    #[test]
    fn test_each_tick_sees_its_own_formats() {
        let mut pipeline = CompositionPipeline::new(engine(), join);
        let (main, gate) = (StreamId(1), StreamId(2));
        pipeline.admit(main, 0).unwrap();
        pipeline.admit(gate, 0).unwrap();

        // The gate stream holds every tick back, so the backlog drains in one
        // call across two format changes.
        pipeline.push_frame(main, "a".into(), 0).unwrap();
        pipeline
            .update_format(main, VideoFormat::new(320, 240, PixelFormat::I420))
            .unwrap();
        pipeline.push_frame(main, "b".into(), 1).unwrap();
        pipeline
            .update_format(main, VideoFormat::new(640, 480, PixelFormat::I420))
            .unwrap();
        pipeline.push_frame(main, "c".into(), 2).unwrap();

        let out = pipeline.remove(gate).unwrap();
        assert_eq!(composed(&out), vec!["1:a", "1:b@320x240", "1:c@640x480"]);
        assert!(matches!(
            out[0],
            PipelineOutput::Notification(EngineOutput::StreamFinished(StreamId(2)))
        ));

        let out = pipeline.push_frame(main, "d".into(), 3).unwrap();
        assert_eq!(composed(&out), vec!["1:d@640x480"]);
    }

    #[test]
    fn test_compositor_failure_does_not_stop_later_ticks() {
        let failing = |tick: &ComposedTick<String>, _: &CompositionContext<'_>| {
            if tick.index == 1 {
                anyhow::bail!("bad frame");
            }
            Ok(format!("tick{}", tick.index))
        };
        let mut pipeline = CompositionPipeline::new(engine(), failing);
        let id = StreamId(7);
        pipeline.admit(id, 0).unwrap();
        let mut outputs = Vec::new();
        for pts in 0..3 {
            outputs.extend(pipeline.push_frame(id, format!("f{}", pts), pts).unwrap());
        }

        assert_eq!(composed(&outputs), vec!["tick0", "tick2"]);
        let failure = outputs
            .iter()
            .find_map(|output| match output {
                PipelineOutput::Failed(err) => Some(err),
                _ => None,
            })
            .unwrap();
        assert!(matches!(failure, SyncError::Compositor { index: 1, pts: 1, .. }));
    }
}

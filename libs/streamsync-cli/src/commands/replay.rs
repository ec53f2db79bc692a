// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Scenario replay.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;
use streamsync::{
    ComposedTick, CompositionContext, CompositionPipeline, GridLayout, PipelineOutput, StreamId,
    SyncEngine,
};

use crate::scenario::Scenario;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayOptions {
    pub pretty: bool,
    pub strict: bool,
    pub snapshot: bool,
}

/// Totals of one replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub steps: usize,
    pub rejected: usize,
    pub composed: usize,
    pub failed: usize,
    pub terminated: bool,
}

pub fn run(path: &Path, options: ReplayOptions) -> Result<()> {
    let scenario = Scenario::load(path)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = replay(&scenario, options, &mut out)?;
    out.flush()?;

    tracing::info!(
        "Replayed {} step(s): {} frame(s) composed, {} rejected, {} compositor failure(s){}",
        summary.steps,
        summary.composed,
        summary.rejected,
        summary.failed,
        if summary.terminated { ", terminated" } else { "" }
    );
    Ok(())
}

pub fn replay(
    scenario: &Scenario,
    options: ReplayOptions,
    out: &mut impl Write,
) -> Result<ReplaySummary> {
    let engine =
        SyncEngine::new(&scenario.engine, GridLayout).context("Failed to build engine")?;
    let mut pipeline = CompositionPipeline::new(engine, manifest);
    let mut summary = ReplaySummary::default();

    for (index, step) in scenario.steps.iter().enumerate() {
        summary.steps += 1;
        let outputs = match step.apply(&mut pipeline) {
            Ok(outputs) => outputs,
            Err(e) if options.strict => {
                return Err(e).with_context(|| {
                    format!("Step {} ({} stream {}) rejected", index, step.op(), step.stream())
                });
            }
            Err(e) => {
                tracing::warn!(
                    "Step {} ({} stream {}) rejected: {}",
                    index,
                    step.op(),
                    step.stream(),
                    e
                );
                summary.rejected += 1;
                let line = json!({
                    "type": "rejected",
                    "step": index,
                    "op": step.op(),
                    "stream": step.stream(),
                    "error": e.to_string(),
                });
                write_line(out, &line, options.pretty)?;
                continue;
            }
        };

        for output in outputs {
            let line = match output {
                PipelineOutput::Composed(frame) => {
                    summary.composed += 1;
                    json!({
                        "type": "composed",
                        "index": frame.index,
                        "pts": frame.pts,
                        "frame": frame.payload,
                    })
                }
                PipelineOutput::Failed(e) => {
                    summary.failed += 1;
                    json!({ "type": "compositor_failed", "error": e.to_string() })
                }
                PipelineOutput::Notification(notification) => serde_json::to_value(&notification)?,
            };
            write_line(out, &line, options.pretty)?;
        }
    }

    summary.terminated = pipeline.engine().is_terminated();
    if options.snapshot {
        let snapshot = serde_json::to_value(pipeline.engine().snapshot())?;
        write_line(out, &json!({ "type": "snapshot", "data": snapshot }), options.pretty)?;
    }
    Ok(summary)
}

fn write_line(out: &mut impl Write, value: &serde_json::Value, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value)?;
    } else {
        serde_json::to_writer(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}

/// Lists `stream:payload` for every frame of the tick, in scene order first.
fn manifest(tick: &ComposedTick<String>, ctx: &CompositionContext<'_>) -> anyhow::Result<String> {
    let mut order: Vec<StreamId> = ctx.scene.as_value()["videos"]
        .as_array()
        .map(|videos| {
            videos
                .iter()
                .filter_map(|video| video["stream"].as_u64())
                .filter_map(|id| u32::try_from(id).ok())
                .map(StreamId)
                .filter(|id| tick.contains(*id))
                .collect()
        })
        .unwrap_or_default();
    let unplaced: Vec<StreamId> = tick.stream_ids().filter(|id| !order.contains(id)).collect();
    order.extend(unplaced);

    let parts: Vec<String> = order
        .iter()
        .filter_map(|id| tick.frames.get(id).map(|frame| format!("{}:{}", id, frame.payload)))
        .collect();
    Ok(parts.join(","))
}

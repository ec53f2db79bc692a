// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Config and scenario validation.

use std::path::Path;

use anyhow::{Context, Result};
use streamsync::SyncConfig;

use super::replay::{self, ReplayOptions};
use crate::scenario::Scenario;

pub fn run(path: &Path) -> Result<()> {
    if path.is_dir() {
        let config = SyncConfig::load(path)
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        println!(
            "{}: ok ({})",
            path.join(SyncConfig::FILE_NAME).display(),
            describe(&config)
        );
        return Ok(());
    }

    let scenario = Scenario::load(path)?;
    let summary = check_steps(&scenario)
        .with_context(|| format!("Invalid scenario {}", path.display()))?;
    println!(
        "{}: ok ({}, {} step(s){})",
        path.display(),
        describe(&scenario.engine),
        summary.steps,
        if summary.terminated { ", terminates" } else { "" }
    );
    Ok(())
}

/// Dry-run every step; the first rejected one fails validation.
pub fn check_steps(scenario: &Scenario) -> Result<replay::ReplaySummary> {
    let options = ReplayOptions {
        strict: true,
        ..Default::default()
    };
    replay::replay(scenario, options, &mut std::io::sink())
}

fn describe(config: &SyncConfig) -> String {
    let output = &config.output;
    format!(
        "{}x{} {} @ {} fps, time base {}",
        output.width, output.height, output.pixel_format, output.framerate, config.time_base
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_directory_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(SyncConfig::FILE_NAME),
            "output: { width: 1280, height: 720 }\n",
        )
        .unwrap();
        assert!(run(dir.path()).is_ok());

        let empty = TempDir::new().unwrap();
        assert!(run(empty.path()).is_err());
    }

    #[test]
    fn test_scenario_with_bad_step_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scenario.yaml");
        std::fs::write(
            &path,
            concat!(
                "steps:\n",
                "  - { op: admit, stream: 1 }\n",
                "  - { op: retire, stream: 1 }\n",
                "  - { op: retire, stream: 1 }\n",
            ),
        )
        .unwrap();
        assert!(run(&path).is_err());

        std::fs::write(
            &path,
            "steps:\n  - { op: admit, stream: 1 }\n  - { op: retire, stream: 1 }\n",
        )
        .unwrap();
        assert!(run(&path).is_ok());
    }
}

// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use streamsync::{FrameRate, PixelFormat, SyncConfig, SyncEngine, SyncError};
use tempfile::TempDir;

#[test]
fn test_load_from_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(SyncConfig::FILE_NAME),
        concat!(
            "output:\n  width: 1280\n  height: 720\n  pixel_format: nv12\n",
            "  framerate: { num: 25, den: 1 }\n",
            "time_base: 1000\n",
        ),
    )
    .unwrap();

    let config = SyncConfig::load(dir.path()).unwrap();
    assert_eq!(config.output.pixel_format, PixelFormat::Nv12);
    assert_eq!(config.output.framerate, FrameRate::new(25, 1));

    let engine: SyncEngine<()> = SyncEngine::new(&config, streamsync::GridLayout).unwrap();
    assert_eq!(engine.output_format().width, 1280);
    assert_eq!(config.clock().unwrap().pts_at(1), 40);
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        SyncConfig::load(dir.path()),
        Err(SyncError::Configuration(_))
    ));
    assert_eq!(SyncConfig::load_or_default(dir.path()), SyncConfig::default());
}

#[test]
fn test_invalid_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(SyncConfig::FILE_NAME),
        "output:\n  width: 641\n  height: 480\n",
    )
    .unwrap();

    assert!(matches!(
        SyncConfig::load(dir.path()),
        Err(SyncError::Format(_))
    ));
    assert_eq!(SyncConfig::load_or_default(dir.path()), SyncConfig::default());
}

// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Raw video format descriptions for inputs and the composed output.
//!
//! The engine never looks inside payloads; these types only describe their
//! shape so the scene handler and compositor can lay streams out.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("bad framerate")]
    BadFramerate,

    #[error("bad video resolution: {0}x{1}")]
    BadResolution(u32, u32),
}

/// Pixel layout of raw frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    #[default]
    I420,
    Nv12,
    Rgba,
}

impl PixelFormat {
    /// Chroma planes are subsampled by two in both directions, so width and
    /// height must be even.
    pub fn is_chroma_subsampled(self) -> bool {
        matches!(self, PixelFormat::I420 | PixelFormat::Nv12)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelFormat::I420 => "I420",
            PixelFormat::Nv12 => "NV12",
            PixelFormat::Rgba => "RGBA",
        };
        f.write_str(name)
    }
}

/// Rational frame rate, `num / den` frames per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRate {
    pub num: u32,
    pub den: u32,
}

impl FrameRate {
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    pub fn validate(&self) -> Result<(), FormatError> {
        if self.num == 0 || self.den == 0 {
            return Err(FormatError::BadFramerate);
        }
        Ok(())
    }

    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self { num: 30, den: 1 }
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

fn validate_resolution(
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
) -> Result<(), FormatError> {
    if width == 0 || height == 0 {
        return Err(FormatError::BadResolution(width, height));
    }
    if pixel_format.is_chroma_subsampled() && (width % 2 != 0 || height % 2 != 0) {
        return Err(FormatError::BadResolution(width, height));
    }
    Ok(())
}

/// Shape of one input stream's frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoFormat {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub pixel_format: PixelFormat,
    /// Nominal input rate, informational only.
    #[serde(default)]
    pub framerate: Option<FrameRate>,
}

impl VideoFormat {
    pub fn new(width: u32, height: u32, pixel_format: PixelFormat) -> Self {
        Self {
            width,
            height,
            pixel_format,
            framerate: None,
        }
    }

    pub fn with_framerate(mut self, framerate: FrameRate) -> Self {
        self.framerate = Some(framerate);
        self
    }

    pub fn validate(&self) -> Result<(), FormatError> {
        validate_resolution(self.width, self.height, self.pixel_format)?;
        if let Some(framerate) = &self.framerate {
            framerate.validate()?;
        }
        Ok(())
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} {}", self.width, self.height, self.pixel_format)?;
        if let Some(framerate) = &self.framerate {
            write!(f, " @ {}", framerate)?;
        }
        Ok(())
    }
}

/// Shape and rate of the composed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFormat {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub pixel_format: PixelFormat,
    #[serde(default)]
    pub framerate: FrameRate,
}

impl OutputFormat {
    pub fn validate(&self) -> Result<(), FormatError> {
        validate_resolution(self.width, self.height, self.pixel_format)?;
        self.framerate.validate()
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            pixel_format: PixelFormat::I420,
            framerate: FrameRate::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framerate_validation() {
        assert!(FrameRate::new(30, 1).validate().is_ok());
        assert!(FrameRate::new(30000, 1001).validate().is_ok());
        assert_eq!(FrameRate::new(0, 1).validate(), Err(FormatError::BadFramerate));
        assert_eq!(FrameRate::new(25, 0).validate(), Err(FormatError::BadFramerate));
    }

    #[test]
    fn test_odd_resolution_rejected_for_subsampled_formats() {
        let odd = VideoFormat::new(641, 480, PixelFormat::I420);
        assert_eq!(odd.validate(), Err(FormatError::BadResolution(641, 480)));

        let odd_rgba = VideoFormat::new(641, 481, PixelFormat::Rgba);
        assert!(odd_rgba.validate().is_ok());

        let empty = VideoFormat::new(0, 480, PixelFormat::Rgba);
        assert_eq!(empty.validate(), Err(FormatError::BadResolution(0, 480)));
    }

    #[test]
    fn test_input_framerate_is_checked() {
        let format =
            VideoFormat::new(640, 480, PixelFormat::Nv12).with_framerate(FrameRate::new(0, 1));
        assert_eq!(format.validate(), Err(FormatError::BadFramerate));
    }

    #[test]
    fn test_format_yaml_defaults() {
        let format: VideoFormat = serde_yaml::from_str("width: 1280\nheight: 720\n").unwrap();
        assert_eq!(format.pixel_format, PixelFormat::I420);
        assert_eq!(format.framerate, None);
        assert_eq!(format.to_string(), "1280x720 I420");

        let output: OutputFormat =
            serde_yaml::from_str("width: 640\nheight: 360\npixel_format: rgba\n").unwrap();
        assert_eq!(output.framerate, FrameRate::new(30, 1));
        assert_eq!(output.pixel_format, PixelFormat::Rgba);
    }
}

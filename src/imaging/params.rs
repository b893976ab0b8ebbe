//! Parameter types for image operations.
//!
//! These types describe *what* to do, not *how* to do it. They are the
//! interface between the transforms (which decide what the image should
//! become) and the [`backend`](super::backend) (which does the pixel work).
//! This separation allows swapping backends (e.g. for testing with a mock)
//! without changing transform logic.
//!
//! ## Types
//!
//! - [`Operation`]: One pixel or metadata step applied to the in-flight image.
//! - [`LoadMode`]: Decoder selection, picked from the source extension.
//! - [`OutputFormat`] / [`FormatOptions`]: Output format override and encoder options.
//! - [`Quality`]: Lossy encoding quality (1–100, default 75). Clamped on construction.
//! - [`ConvolutionMask`]: Integer convolution mask with a normalisation scale.
//! - [`Writer`]: Write-time settings the output stage hands to the backend.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(75)
    }
}

/// How the backend should decode the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Sequential JPEG decode.
    Jpeg,
    /// Sequential PNG decode.
    Png,
    /// Let the backend work out the format.
    Generic,
}

impl LoadMode {
    /// Pick a decoder from the path's extension (case-insensitive).
    ///
    /// `.jpg`/`.jpeg` → [`LoadMode::Jpeg`], `.png` → [`LoadMode::Png`],
    /// anything else → [`LoadMode::Generic`]. File contents are not sniffed.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "jpg" | "jpeg" => LoadMode::Jpeg,
            "png" => LoadMode::Png,
            _ => LoadMode::Generic,
        }
    }
}

/// Output formats a version can be converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    pub const ALLOWED: &'static [&'static str] = &["jpeg", "png"];

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "jpeg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            other => Err(format!(
                "format must be one of: {} (got '{}')",
                Self::ALLOWED.join(","),
                other
            )),
        }
    }
}

/// Encoder options passed to the writer.
///
/// `quality` applies to JPEG output, `compression` (0–9) and `interlace`
/// to PNG output. Options that don't apply to the chosen format are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatOptions {
    pub quality: Option<Quality>,
    pub compression: Option<u8>,
    pub interlace: bool,
}

impl FormatOptions {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Resampling kernel for a ratio resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Nearest,
    Bicubic,
}

/// Clockwise rotation by a multiple of 90 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Rotate90,
    Rotate180,
    Rotate270,
}

/// An integer convolution mask.
///
/// Each output pixel is `sum(coefficient * pixel) / scale + offset`.
/// A mask with `height == 1` is a 1-D row used for separable convolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvolutionMask {
    pub width: usize,
    pub height: usize,
    pub coefficients: Vec<i32>,
    pub scale: i32,
    pub offset: i32,
}

impl ConvolutionMask {
    /// Build a 1-D row mask.
    pub fn row(coefficients: Vec<i32>, scale: i32) -> Self {
        Self {
            width: coefficients.len(),
            height: 1,
            coefficients,
            scale,
            offset: 0,
        }
    }

    /// Sum of all coefficients.
    pub fn sum(&self) -> i32 {
        self.coefficients.iter().sum()
    }

    /// Coefficients divided by the scale, ready for a float convolution.
    pub fn normalised(&self) -> Vec<f32> {
        let scale = if self.scale == 0 { 1.0 } else { self.scale as f32 };
        self.coefficients
            .iter()
            .map(|&c| c as f32 / scale)
            .collect()
    }
}

/// A single step applied to the in-flight image.
///
/// Every variant is pure from the caller's point of view: the backend
/// consumes an image value and returns a new one.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Scale both axes by `ratio`.
    Resample {
        interpolation: Interpolation,
        ratio: f64,
    },
    /// Integer box-average shrink; output is `floor(dimension / factor)`.
    Shrink { factor: u32 },
    /// Hint that the previous result should be cached in horizontal strips.
    TileCache {
        tile_width: u32,
        tile_height: u32,
        max_tiles: u32,
    },
    /// 2-D convolution.
    Convolve(ConvolutionMask),
    /// Two 1-D passes with the same row mask: horizontal, then vertical.
    ConvolveSeparable(ConvolutionMask),
    /// Extract the rectangle `[left, left+width) × [top, top+height)`.
    Extract {
        left: u32,
        top: u32,
        width: u32,
        height: u32,
    },
    Rotate(Rotation),
    /// Drop a metadata field (e.g. `exif-Orientation`).
    RemoveMetadata(String),
}

/// Write-time settings for one output file.
///
/// Built by the output stage from the handle's format override and options;
/// writer effects (e.g. `strip`) mutate it before the backend writes.
#[derive(Debug, Clone, PartialEq)]
pub struct Writer {
    /// `None` means the generic writer, which infers the format from the path.
    pub format: Option<OutputFormat>,
    pub options: FormatOptions,
    pub keep_exif: bool,
    pub keep_icc: bool,
}

impl Writer {
    pub fn new(format: Option<OutputFormat>, options: FormatOptions) -> Self {
        Self {
            format,
            options,
            keep_exif: true,
            keep_icc: true,
        }
    }

    pub fn remove_exif(&mut self) {
        self.keep_exif = false;
    }

    pub fn remove_icc(&mut self) {
        self.keep_icc = false;
    }
}

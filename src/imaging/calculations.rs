//! Pure calculation functions for resizing and cropping.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! ## Resize strategy
//!
//! ```text
//! ratio == 1          → nothing to do
//! ratio  > 1          → nearest-neighbour upsample
//! 0.5 < ratio < 1     → bicubic, then 3×3 sharpen
//! ratio <= 0.5        → integer box shrink by floor(1/ratio), re-plan against
//!                       the shrunk size, then bicubic + sharpen
//! ```
//!
//! Large single-pass bicubic reductions alias and go soft; the cheap box
//! shrink gets close first, and the bicubic step only has to cover the
//! remaining factor.

use super::backend::Dimensions;
use super::kernels::sharpen_mask;
use super::params::{Interpolation, Operation};
use serde::{Deserialize, Serialize};

/// Ratios at or below this pre-shrink with an integer box filter.
pub const SHRINK_THRESHOLD: f64 = 0.5;

/// Strip cache kept behind the shrink step: `max_tiles` rows of one line each.
const SHRINK_CACHE_TILES: u32 = 30;

/// How the width and height ratios are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    /// Smaller ratio: the result fits within the target.
    Min,
    /// Larger ratio: the result covers the target.
    Max,
}

/// Scale factor taking `source` to `target` under `mode`.
pub fn resize_ratio(source: Dimensions, target: Dimensions, mode: FitMode) -> f64 {
    let width_ratio = target.width as f64 / source.width as f64;
    let height_ratio = target.height as f64 / source.height as f64;
    match mode {
        FitMode::Min => width_ratio.min(height_ratio),
        FitMode::Max => width_ratio.max(height_ratio),
    }
}

/// Integer pre-shrink factor for large reductions, `None` above the threshold.
pub fn shrink_factor(ratio: f64) -> Option<u32> {
    if ratio <= SHRINK_THRESHOLD {
        Some(((1.0 / ratio).floor() as u32).max(1))
    } else {
        None
    }
}

/// Size after an integer box shrink (floor division, never below 1px).
pub fn shrunk_dimensions(source: Dimensions, factor: u32) -> Dimensions {
    Dimensions::new(
        (source.width / factor).max(1),
        (source.height / factor).max(1),
    )
}

/// Size after scaling both axes by `ratio` (rounded, never below 1px).
pub fn resampled_dimensions(source: Dimensions, ratio: f64) -> Dimensions {
    Dimensions::new(
        ((source.width as f64 * ratio).round() as u32).max(1),
        ((source.height as f64 * ratio).round() as u32).max(1),
    )
}

/// Plan the operations that resize `source` towards `target`.
///
/// Returns an empty plan when no resampling is needed. The ratio after a
/// pre-shrink is recomputed against [`shrunk_dimensions`], which is the
/// size every backend must produce for [`Operation::Shrink`].
pub fn plan_resize(source: Dimensions, target: Dimensions, mode: FitMode) -> Vec<Operation> {
    let mut ratio = resize_ratio(source, target, mode);

    if ratio == 1.0 {
        return Vec::new();
    }

    if ratio > 1.0 {
        return vec![Operation::Resample {
            interpolation: Interpolation::Nearest,
            ratio,
        }];
    }

    let mut ops = Vec::with_capacity(4);
    if let Some(factor) = shrink_factor(ratio) {
        let shrunk = shrunk_dimensions(source, factor);
        ops.push(Operation::Shrink { factor });
        ops.push(Operation::TileCache {
            tile_width: shrunk.width,
            tile_height: 1,
            max_tiles: SHRINK_CACHE_TILES,
        });
        ratio = resize_ratio(shrunk, target, mode);
    }
    ops.push(Operation::Resample {
        interpolation: Interpolation::Bicubic,
        ratio,
    });
    ops.push(Operation::Convolve(sharpen_mask()));
    ops
}

/// Whether `source` is larger than `target` in either dimension.
pub fn exceeds(source: Dimensions, target: Dimensions) -> bool {
    source.width > target.width || source.height > target.height
}

/// Centre-crop offsets `(left, top)` for trimming a cover-resized image.
///
/// Only one axis can overshoot after a [`FitMode::Max`] resize; the other
/// offset stays 0.
pub fn fill_crop_offsets(actual: Dimensions, target: Dimensions) -> (u32, u32) {
    if actual.width > target.width {
        ((actual.width - target.width) / 2, 0)
    } else if actual.height > target.height {
        (0, (actual.height - target.height) / 2)
    } else {
        (0, 0)
    }
}

/// Position of a crop rectangle along one axis.
///
/// TOML integers deserialize as [`CropOffset::Pixels`], floats as
/// [`CropOffset::Fraction`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CropOffset {
    /// Absolute offset from the left/top edge.
    Pixels(u32),
    /// Position of the band within the free space, `0.0..=1.0`.
    /// Values outside that range are treated as absolute pixels.
    Fraction(f64),
}

impl CropOffset {
    /// Resolve to an absolute pixel offset for a crop of `crop` pixels out of `full`.
    pub fn resolve(self, full: u32, crop: u32) -> u32 {
        match self {
            CropOffset::Pixels(px) => px,
            CropOffset::Fraction(f) if (0.0..=1.0).contains(&f) => {
                (full.saturating_sub(crop) as f64 * f) as u32
            }
            CropOffset::Fraction(f) => f.max(0.0) as u32,
        }
    }
}

impl Default for CropOffset {
    fn default() -> Self {
        CropOffset::Pixels(0)
    }
}

impl From<u32> for CropOffset {
    fn from(px: u32) -> Self {
        CropOffset::Pixels(px)
    }
}

impl From<f64> for CropOffset {
    fn from(fraction: f64) -> Self {
        CropOffset::Fraction(fraction)
    }
}

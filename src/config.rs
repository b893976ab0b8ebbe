//! Versions configuration.
//!
//! Versions can be declared in a `versions.toml` instead of in code. Each
//! `[versions.NAME]` table lists the versions it builds on and the steps it
//! runs itself:
//!
//! ```toml
//! [versions.thumb]
//! steps = [{ op = "resize_to_fit", width = 150, height = 150 }]
//!
//! [versions.blurred]
//! steps = [{ op = "gaussian_blur", sigma = 10.0 }]
//!
//! [versions.blurred_thumb]
//! dependencies = ["thumb", "blurred"]
//! ```
//!
//! ## Steps
//!
//! | `op` | Fields |
//! |------|--------|
//! | `resize_to_fit` / `resize_to_fill` / `resize_to_limit` | `width`, `height` |
//! | `crop` | `left`, `top` (pixels, or a `0.0..=1.0` fraction), optional `width`, `height` |
//! | `gaussian_blur` | `sigma` (default 1.0), `min_amplitude` (default 0.2) |
//! | `quality` | `percent` (default 75) |
//! | `convert` | `format` (`jpeg`/`png`), optional `quality`, `compression`, `interlace` |
//! | `strip` | |
//! | `auto_orient` | |
//!
//! Unknown keys are rejected to catch typos early.

use crate::handle::ImageHandle;
use crate::imaging::calculations::CropOffset;
use crate::imaging::kernels::DEFAULT_MIN_AMPLITUDE;
use crate::imaging::{FormatOptions, ImageBackend, OutputFormat, Quality, gaussian_mask};
use crate::transform::blur::DEFAULT_SIGMA;
use crate::versions::{Recipe, VersionRegistry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// The whole versions file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VersionsConfig {
    pub versions: BTreeMap<String, VersionConfig>,
}

/// One `[versions.NAME]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VersionConfig {
    /// Versions whose steps run first, in this order.
    pub dependencies: Vec<String>,
    /// This version's own steps.
    pub steps: Vec<Step>,
}

fn default_sigma() -> f64 {
    DEFAULT_SIGMA
}

fn default_min_amplitude() -> f64 {
    DEFAULT_MIN_AMPLITUDE
}

fn default_quality() -> u32 {
    Quality::default().value()
}

/// A single transform step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum Step {
    ResizeToFit {
        width: u32,
        height: u32,
    },
    ResizeToFill {
        width: u32,
        height: u32,
    },
    ResizeToLimit {
        width: u32,
        height: u32,
    },
    Crop {
        #[serde(default)]
        left: CropOffset,
        #[serde(default)]
        top: CropOffset,
        width: Option<u32>,
        height: Option<u32>,
    },
    GaussianBlur {
        #[serde(default = "default_sigma")]
        sigma: f64,
        #[serde(default = "default_min_amplitude")]
        min_amplitude: f64,
    },
    Quality {
        #[serde(default = "default_quality")]
        percent: u32,
    },
    Convert {
        format: String,
        quality: Option<u32>,
        compression: Option<u8>,
        #[serde(default)]
        interlace: bool,
    },
    Strip,
    AutoOrient,
}

impl Step {
    /// Run this step on `handle`.
    pub fn apply<B: ImageBackend>(&self, handle: &mut ImageHandle<B>) -> crate::error::Result<()> {
        match self {
            Step::ResizeToFit { width, height } => handle.resize_to_fit(*width, *height)?,
            Step::ResizeToFill { width, height } => handle.resize_to_fill(*width, *height)?,
            Step::ResizeToLimit { width, height } => handle.resize_to_limit(*width, *height)?,
            Step::Crop {
                left,
                top,
                width,
                height,
            } => handle.crop(*left, *top, *width, *height)?,
            Step::GaussianBlur {
                sigma,
                min_amplitude,
            } => handle.gaussian_blur_with_cutoff(*sigma, *min_amplitude)?,
            Step::Quality { percent } => handle.quality(*percent)?,
            Step::Convert {
                format,
                quality,
                compression,
                interlace,
            } => {
                let options = FormatOptions {
                    quality: quality.map(Quality::new),
                    compression: *compression,
                    interlace: *interlace,
                };
                handle.convert(format, options)?
            }
            Step::Strip => handle.strip()?,
            Step::AutoOrient => handle.auto_orient()?,
        };
        Ok(())
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            Step::ResizeToFit { width, height }
            | Step::ResizeToFill { width, height }
            | Step::ResizeToLimit { width, height } => {
                if *width == 0 || *height == 0 {
                    return Err(format!("resize target must be non-zero (got {width}x{height})"));
                }
            }
            Step::Crop { width, height, .. } => {
                if *width == Some(0) || *height == Some(0) {
                    return Err("crop width and height must be non-zero".into());
                }
            }
            Step::GaussianBlur {
                sigma,
                min_amplitude,
            } => {
                if !(sigma.is_finite() && *sigma > 0.0) {
                    return Err(format!("sigma must be positive (got {sigma})"));
                }
                if !(*min_amplitude > 0.0 && *min_amplitude < 1.0) {
                    return Err(format!(
                        "min_amplitude must be between 0 and 1 (got {min_amplitude})"
                    ));
                }
                gaussian_mask(*sigma, *min_amplitude).map_err(|_| {
                    format!("sigma {sigma} is too large for min_amplitude {min_amplitude}")
                })?;
            }
            Step::Quality { percent } => validate_quality(*percent)?,
            Step::Convert {
                format,
                quality,
                compression,
                ..
            } => {
                format.parse::<OutputFormat>()?;
                if let Some(q) = quality {
                    validate_quality(*q)?;
                }
                if let Some(level) = compression {
                    if *level > 9 {
                        return Err(format!("compression must be 0-9 (got {level})"));
                    }
                }
            }
            Step::Strip | Step::AutoOrient => {}
        }
        Ok(())
    }
}

fn validate_quality(percent: u32) -> Result<(), String> {
    if !(1..=100).contains(&percent) {
        return Err(format!("quality must be 1-100 (got {percent})"));
    }
    Ok(())
}

impl fmt::Display for CropOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CropOffset::Pixels(px) => write!(f, "{px}"),
            CropOffset::Fraction(fraction) => write!(f, "{fraction}"),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let or_full = |v: &Option<u32>| v.map(|v| v.to_string()).unwrap_or_else(|| "full".into());
        match self {
            Step::ResizeToFit { width, height } => write!(f, "resize_to_fit {width}x{height}"),
            Step::ResizeToFill { width, height } => write!(f, "resize_to_fill {width}x{height}"),
            Step::ResizeToLimit { width, height } => {
                write!(f, "resize_to_limit {width}x{height}")
            }
            Step::Crop {
                left,
                top,
                width,
                height,
            } => write!(
                f,
                "crop {}x{} at left={} top={}",
                or_full(width),
                or_full(height),
                left,
                top
            ),
            Step::GaussianBlur {
                sigma,
                min_amplitude,
            } => write!(f, "gaussian_blur sigma={sigma} min_amplitude={min_amplitude}"),
            Step::Quality { percent } => write!(f, "quality {percent}"),
            Step::Convert { format, .. } => write!(f, "convert {format}"),
            Step::Strip => f.write_str("strip"),
            Step::AutoOrient => f.write_str("auto_orient"),
        }
    }
}

impl VersionsConfig {
    /// Check the file describes a usable set of versions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, version) in &self.versions {
            if version.steps.is_empty() && version.dependencies.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "version '{name}' has neither steps nor dependencies"
                )));
            }
            for dependency in &version.dependencies {
                if !self.versions.contains_key(dependency) {
                    return Err(ConfigError::Validation(format!(
                        "version '{name}' depends on unknown version '{dependency}'"
                    )));
                }
            }
            for (i, step) in version.steps.iter().enumerate() {
                step.validate().map_err(|e| {
                    ConfigError::Validation(format!("version '{name}' step {}: {e}", i + 1))
                })?;
            }
        }

        let mut done = BTreeSet::new();
        for name in self.versions.keys() {
            self.check_cycles(name, &mut Vec::new(), &mut done)?;
        }
        Ok(())
    }

    fn check_cycles<'a>(
        &'a self,
        name: &'a str,
        path: &mut Vec<&'a str>,
        done: &mut BTreeSet<&'a str>,
    ) -> Result<(), ConfigError> {
        if done.contains(name) {
            return Ok(());
        }
        if path.contains(&name) {
            path.push(name);
            return Err(ConfigError::Validation(format!(
                "cyclic version dependency: {}",
                path.join(" -> ")
            )));
        }
        path.push(name);
        if let Some(version) = self.versions.get(name) {
            for dependency in &version.dependencies {
                self.check_cycles(dependency, path, done)?;
            }
        }
        path.pop();
        done.insert(name);
        Ok(())
    }

    /// Build a registry with one version per table.
    pub fn to_registry<B: ImageBackend + 'static>(&self) -> Result<VersionRegistry<B>, ConfigError> {
        self.validate()?;
        let mut registry = VersionRegistry::new();
        for (name, version) in &self.versions {
            let recipe: Option<Recipe<B>> = if version.steps.is_empty() {
                None
            } else {
                let steps = version.steps.clone();
                Some(Arc::new(move |handle: &mut ImageHandle<B>| {
                    steps.iter().try_for_each(|step| step.apply(handle))
                }))
            };
            registry
                .register(name.clone(), version.dependencies.clone(), recipe)
                .map_err(|e| ConfigError::Validation(e.to_string()))?;
        }
        Ok(registry)
    }
}

/// Parse and validate versions from TOML text.
pub fn parse_config(content: &str) -> Result<VersionsConfig, ConfigError> {
    let config: VersionsConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load and validate a versions file.
pub fn load_config(path: &Path) -> Result<VersionsConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Returns a fully-commented example `versions.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Image Versions Configuration
# ============================
# Each [versions.NAME] table declares one output version.
#
#   dependencies = [...]  versions whose steps run first, in order
#   steps = [...]         this version's own steps, run after its dependencies
#
# A version needs steps, dependencies, or both. Unknown keys cause an error.
#
# Outputs are named after the version:
#   run --config versions.toml photo.jpg          -> photo-thumb.jpg, ...
#   run --config versions.toml -o out/ photo.jpg  -> out/thumb.jpg, ...

# ---------------------------------------------------------------------------
# Available steps
# ---------------------------------------------------------------------------
#   { op = "resize_to_fit",   width = W, height = H }  fit inside WxH
#   { op = "resize_to_fill",  width = W, height = H }  cover WxH, centre crop
#   { op = "resize_to_limit", width = W, height = H }  fit, but never enlarge
#   { op = "crop", left = 0, top = 0.5, height = 200 } pixels, or a 0.0-1.0
#                                                       fraction of free space
#   { op = "gaussian_blur", sigma = 1.0, min_amplitude = 0.2 }
#   { op = "quality", percent = 75 }                   JPEG output only
#   { op = "convert", format = "png", compression = 6 }
#   { op = "convert", format = "jpeg", quality = 85 }
#   { op = "strip" }                                   drop EXIF and ICC
#   { op = "auto_orient" }                             apply EXIF rotation

[versions.thumb]
steps = [
    { op = "auto_orient" },
    { op = "resize_to_fill", width = 150, height = 150 },
    { op = "strip" },
]

[versions.large]
steps = [
    { op = "auto_orient" },
    { op = "resize_to_limit", width = 2048, height = 2048 },
    { op = "quality", percent = 85 },
]

[versions.blurred]
steps = [{ op = "gaussian_blur", sigma = 10.0 }]

# Composite: runs thumb's steps, then blurred's, then writes once.
[versions.blurred_thumb]
dependencies = ["thumb", "blurred"]
"##
}

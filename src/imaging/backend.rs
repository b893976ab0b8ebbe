//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the only place pixels are touched. The
//! pipeline above it (handle, transforms, versions) only ever decides which
//! [`Operation`]s to run and in what order.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): pure Rust, built on the
//! `image` and `imageproc` crates.

use super::params::{LoadMode, Operation, Writer};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Trait for image processing backends.
///
/// Images are values: [`apply`](ImageBackend::apply) consumes one and
/// returns a new one, so the caller always holds exactly one current image.
pub trait ImageBackend {
    /// The decoded, in-memory image type.
    type Image;

    /// Decode the file at `path` using the given decoder mode.
    fn load(&self, path: &Path, mode: LoadMode) -> Result<Self::Image, BackendError>;

    /// Run one operation, returning the new image.
    fn apply(&self, image: Self::Image, op: &Operation) -> Result<Self::Image, BackendError>;

    fn dimensions(&self, image: &Self::Image) -> Dimensions;

    /// Read a metadata field such as `exif-ifd0-Orientation`.
    fn metadata(&self, image: &Self::Image, key: &str) -> Option<String>;

    /// Encode `image` with the writer's settings and write it to `path`.
    fn write(&self, image: &Self::Image, writer: &Writer, path: &Path) -> Result<(), BackendError>;
}

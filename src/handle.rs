//! The image handle and its manipulation accumulator.
//!
//! A handle owns one logical image: where it is read from, where it is
//! written to, and the mutable state of the current processing cycle.
//!
//! ```text
//! None ──first transform──▶ Some(image) ──transforms──▶ Some(image') ──write──▶ None
//!       (lazy load)                                     (reset, may load again)
//! ```
//!
//! Every transform funnels through [`ImageHandle::manipulate`]: it loads the
//! source if nothing is loaded yet, then replaces the current image with the
//! transform's result. Write-time side effects (see [`WriterEffect`]) are
//! queued instead and only run in [`write`](crate::write).

use crate::error::{ProcessError, Result};
use crate::imaging::{Dimensions, FormatOptions, ImageBackend, LoadMode, OutputFormat};
use crate::write::WriterEffect;
use std::path::{Path, PathBuf};

/// One logical image being processed into versions.
pub struct ImageHandle<B: ImageBackend> {
    backend: B,
    source: PathBuf,
    destination: PathBuf,
    pub(crate) current: Option<B::Image>,
    pub(crate) writer_effects: Vec<WriterEffect>,
    pub(crate) output_format: Option<OutputFormat>,
    pub(crate) format_options: FormatOptions,
}

impl<B: ImageBackend> ImageHandle<B> {
    /// New handle that writes back over its source unless told otherwise.
    pub fn new(backend: B, source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        Self {
            backend,
            destination: source.clone(),
            source,
            current: None,
            writer_effects: Vec::new(),
            output_format: None,
            format_options: FormatOptions::default(),
        }
    }

    pub fn with_destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination = destination.into();
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Change the source and keep chaining.
    pub fn set_source(&mut self, source: impl Into<PathBuf>) -> &mut Self {
        self.source = source.into();
        self
    }

    /// Change the destination and keep chaining.
    pub fn set_destination(&mut self, destination: impl Into<PathBuf>) -> &mut Self {
        self.destination = destination.into();
        self
    }

    /// Swap in a new destination, handing back the old one.
    pub(crate) fn replace_destination(&mut self, destination: PathBuf) -> PathBuf {
        std::mem::replace(&mut self.destination, destination)
    }

    pub fn is_loaded(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&B::Image> {
        self.current.as_ref()
    }

    /// Dimensions of the current image, if one is loaded.
    pub fn dimensions(&self) -> Option<Dimensions> {
        self.current.as_ref().map(|img| self.backend.dimensions(img))
    }

    pub fn pending_writer_effects(&self) -> &[WriterEffect] {
        &self.writer_effects
    }

    pub fn output_format(&self) -> Option<OutputFormat> {
        self.output_format
    }

    pub fn format_options(&self) -> &FormatOptions {
        &self.format_options
    }

    /// Load the source if no image is current. Idempotent.
    pub fn ensure_loaded(&mut self) -> Result<()> {
        if self.current.is_some() {
            return Ok(());
        }
        let mode = LoadMode::from_path(&self.source);
        let image = self
            .backend
            .load(&self.source, mode)
            .map_err(|source| ProcessError::Load {
                path: self.source.clone(),
                source,
            })?;
        log::debug!("loaded {} as {:?}", self.source.display(), mode);
        self.current = Some(image);
        Ok(())
    }

    /// Replace the current image with `transform(current)`.
    ///
    /// The transform receives the backend so it can run operations and
    /// inspect the image. If it fails the handle is reset: there is no
    /// half-transformed image to continue from.
    pub fn manipulate<F>(&mut self, transform: F) -> Result<&mut Self>
    where
        F: FnOnce(&B, B::Image) -> Result<B::Image>,
    {
        self.ensure_loaded()?;
        let Some(image) = self.current.take() else {
            return Err(ProcessError::Configuration(
                "no image loaded after load".into(),
            ));
        };
        match transform(&self.backend, image) {
            Ok(next) => {
                self.current = Some(next);
                Ok(self)
            }
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    /// Clear all per-cycle state. The next transform loads afresh.
    pub(crate) fn reset(&mut self) {
        self.current = None;
        self.writer_effects.clear();
        self.output_format = None;
        self.format_options = FormatOptions::default();
    }
}

impl<B: ImageBackend> std::fmt::Debug for ImageHandle<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageHandle")
            .field("source", &self.source)
            .field("destination", &self.destination)
            .field("loaded", &self.current.is_some())
            .field("writer_effects", &self.writer_effects)
            .field("output_format", &self.output_format)
            .field("format_options", &self.format_options)
            .finish()
    }
}

//! Output stage: encode the accumulated image and reset the handle.
//!
//! The backend always writes to a temporary sibling (`photo_tmp.jpg` for
//! `photo.jpg`), which is then renamed onto the destination. A failed encode
//! leaves the destination untouched.

use crate::error::{ProcessError, Result};
use crate::handle::ImageHandle;
use crate::imaging::{BackendError, ImageBackend, Writer};
use crate::naming::temp_path;
use std::path::PathBuf;

/// A side effect applied to the [`Writer`] at write time rather than to pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterEffect {
    RemoveExif,
    RemoveIcc,
}

impl WriterEffect {
    pub fn apply(self, writer: &mut Writer) {
        match self {
            WriterEffect::RemoveExif => writer.remove_exif(),
            WriterEffect::RemoveIcc => writer.remove_icc(),
        }
    }
}

impl<B: ImageBackend> ImageHandle<B> {
    /// Queue a write-time effect for the current cycle.
    pub fn on_write(&mut self, effect: WriterEffect) -> &mut Self {
        self.writer_effects.push(effect);
        self
    }

    /// Write the current image to the destination and reset the handle.
    ///
    /// Returns `Ok(None)` without touching the filesystem when nothing has
    /// been loaded this cycle.
    pub fn write(&mut self) -> Result<Option<PathBuf>> {
        let Some(image) = self.current.as_ref() else {
            return Ok(None);
        };

        let mut writer = Writer::new(self.output_format, self.format_options.clone());
        for effect in &self.writer_effects {
            effect.apply(&mut writer);
        }

        let destination = self.destination().to_path_buf();
        let tmp = temp_path(&destination);

        if let Err(source) = self.backend().write(image, &writer, &tmp) {
            discard(&tmp);
            return Err(ProcessError::Write {
                path: destination,
                source,
            });
        }
        if let Err(e) = std::fs::rename(&tmp, &destination) {
            discard(&tmp);
            return Err(ProcessError::Write {
                path: destination,
                source: BackendError::Io(e),
            });
        }

        log::debug!("wrote {}", destination.display());
        self.reset();
        Ok(Some(destination))
    }
}

/// Best-effort removal of a leftover temporary file.
fn discard(tmp: &std::path::Path) {
    if tmp.exists() {
        if let Err(e) = std::fs::remove_file(tmp) {
            log::warn!("could not remove {}: {}", tmp.display(), e);
        }
    }
}

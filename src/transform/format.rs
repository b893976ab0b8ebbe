//! Write-time transforms: encoder quality, output format, metadata stripping.
//!
//! None of these touch pixels. They load the source (so a version made of
//! only these steps still has something to write) and then record settings
//! the output stage picks up.

use crate::error::{ProcessError, Result};
use crate::handle::ImageHandle;
use crate::imaging::{FormatOptions, ImageBackend, LoadMode, OutputFormat, Quality};
use crate::write::WriterEffect;

impl<B: ImageBackend> ImageHandle<B> {
    /// Whether the next write produces JPEG: an explicit convert wins,
    /// otherwise the source extension decides.
    fn writes_jpeg(&self) -> bool {
        match self.output_format {
            Some(format) => format == OutputFormat::Jpeg,
            None => LoadMode::from_path(self.source()) == LoadMode::Jpeg,
        }
    }

    /// Set the JPEG encoding quality (clamped to 1..=100).
    ///
    /// Ignored for any other output format.
    pub fn quality(&mut self, percent: u32) -> Result<&mut Self> {
        self.ensure_loaded()?;
        if self.writes_jpeg() {
            self.format_options.quality = Some(Quality::new(percent));
        } else {
            log::debug!(
                "quality {} ignored: {} is not written as jpeg",
                percent,
                self.destination().display()
            );
        }
        Ok(self)
    }

    /// Write the output as `format` (`"jpeg"` or `"png"`, any case) with the
    /// given encoder options.
    ///
    /// A quality set earlier in the cycle survives unless `options` sets its own.
    pub fn convert(&mut self, format: &str, options: FormatOptions) -> Result<&mut Self> {
        let format: OutputFormat = format.parse().map_err(ProcessError::Configuration)?;
        self.ensure_loaded()?;

        let quality = options.quality.or(self.format_options.quality);
        self.output_format = Some(format);
        self.format_options = options;
        self.format_options.quality = quality.filter(|_| format == OutputFormat::Jpeg);
        Ok(self)
    }

    /// Drop EXIF and ICC metadata from the written file.
    pub fn strip(&mut self) -> Result<&mut Self> {
        self.ensure_loaded()?;
        Ok(self
            .on_write(WriterEffect::RemoveExif)
            .on_write(WriterEffect::RemoveIcc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn quality_applies_to_jpeg_source() {
        let mut h = ImageHandle::new(MockBackend::new(10, 10), "a.JPG");
        h.quality(60).unwrap();

        assert!(h.is_loaded());
        assert_eq!(h.format_options().quality, Some(Quality::new(60)));
    }

    #[test]
    fn quality_ignored_for_png_source() {
        let mut h = ImageHandle::new(MockBackend::new(10, 10), "a.png");
        h.quality(60).unwrap();
        assert_eq!(h.format_options().quality, None);
    }

    #[test]
    fn quality_after_convert_to_jpeg() {
        let mut h = ImageHandle::new(MockBackend::new(10, 10), "a.png");
        h.convert("jpeg", FormatOptions::default())
            .unwrap()
            .quality(40)
            .unwrap();
        assert_eq!(h.format_options().quality, Some(Quality::new(40)));
    }

    #[test]
    fn quality_survives_convert_to_jpeg() {
        let mut h = ImageHandle::new(MockBackend::new(10, 10), "a.jpg");
        h.quality(40)
            .unwrap()
            .convert("JPEG", FormatOptions::default())
            .unwrap();
        assert_eq!(h.format_options().quality, Some(Quality::new(40)));
    }

    #[test]
    fn convert_rejects_unknown_format() {
        let mut h = ImageHandle::new(MockBackend::new(10, 10), "a.jpg");
        let err = h.convert("gif", FormatOptions::default()).unwrap_err();

        assert!(matches!(err, ProcessError::Configuration(ref msg) if msg.contains("jpeg,png")));
        assert_eq!(h.output_format(), None);
        assert_eq!(h.backend().loads(), 0);
    }

    #[test]
    fn convert_to_png_reaches_writer() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("a.jpg");
        fs::write(&source, "x").unwrap();
        let mut h = ImageHandle::new(MockBackend::new(10, 10), &source)
            .with_destination(tmp.path().join("a.png"));
        let options = FormatOptions {
            compression: Some(9),
            ..FormatOptions::default()
        };

        h.quality(80).unwrap().convert("png", options.clone()).unwrap();
        h.write().unwrap();

        let writes = h.backend().writes();
        assert!(matches!(
            &writes[0],
            RecordedOp::Write { format: Some(OutputFormat::Png), options: o, .. } if *o == options
        ));
    }

    #[test]
    fn strip_queues_both_effects() {
        let mut h = ImageHandle::new(MockBackend::new(10, 10), "a.jpg");
        h.strip().unwrap();

        assert!(h.is_loaded());
        assert_eq!(
            h.pending_writer_effects(),
            &[WriterEffect::RemoveExif, WriterEffect::RemoveIcc]
        );
        assert_eq!(h.dimensions().map(|d| d.width), Some(10));
    }
}

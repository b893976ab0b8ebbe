//! Rectangle extraction with pixel or fractional offsets.

use crate::error::Result;
use crate::handle::ImageHandle;
use crate::imaging::calculations::CropOffset;
use crate::imaging::{ImageBackend, Operation};

impl<B: ImageBackend> ImageHandle<B> {
    /// Extract a rectangle from the current image.
    ///
    /// `left`/`top` are absolute pixels or, as a fraction in `0.0..=1.0`, a
    /// position within the free space: `top = 0.5` centres the band
    /// vertically. Missing `width`/`height` default to the full image size.
    ///
    /// The rectangle is not clamped; one that leaves the image fails in the
    /// backend.
    pub fn crop(
        &mut self,
        left: impl Into<CropOffset>,
        top: impl Into<CropOffset>,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<&mut Self> {
        let (left, top) = (left.into(), top.into());
        self.manipulate(|backend, image| {
            let full = backend.dimensions(&image);
            let width = width.unwrap_or(full.width);
            let height = height.unwrap_or(full.height);
            let op = Operation::Extract {
                left: left.resolve(full.width, width),
                top: top.resolve(full.height, height),
                width,
                height,
            };
            log::debug!("apply {:?}", op);
            Ok(backend.apply(image, &op)?)
        })
    }
}

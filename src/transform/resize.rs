//! Resize transforms: fit inside, fill exactly, or only ever shrink.
//!
//! All three delegate the operation sequence to
//! [`plan_resize`](crate::imaging::calculations::plan_resize).

use super::run_operations;
use crate::error::{ProcessError, Result};
use crate::handle::ImageHandle;
use crate::imaging::calculations::{exceeds, fill_crop_offsets, plan_resize};
use crate::imaging::{Dimensions, FitMode, ImageBackend, Operation};

fn target(width: u32, height: u32) -> Result<Dimensions> {
    if width == 0 || height == 0 {
        return Err(ProcessError::Configuration(format!(
            "resize target must be non-zero (got {width}x{height})"
        )));
    }
    Ok(Dimensions::new(width, height))
}

impl<B: ImageBackend> ImageHandle<B> {
    /// Scale to fit within `width × height`, preserving aspect ratio.
    ///
    /// One dimension ends up equal to its target, the other at most its target.
    /// Smaller images are scaled up.
    pub fn resize_to_fit(&mut self, width: u32, height: u32) -> Result<&mut Self> {
        let target = target(width, height)?;
        self.manipulate(|backend, image| {
            let plan = plan_resize(backend.dimensions(&image), target, FitMode::Min);
            run_operations(backend, image, &plan)
        })
    }

    /// Scale to cover `width × height`, then centre-crop to exactly that size.
    pub fn resize_to_fill(&mut self, width: u32, height: u32) -> Result<&mut Self> {
        let target = target(width, height)?;
        self.manipulate(|backend, image| {
            let plan = plan_resize(backend.dimensions(&image), target, FitMode::Max);
            let image = run_operations(backend, image, &plan)?;

            let actual = backend.dimensions(&image);
            if actual == target {
                return Ok(image);
            }
            let (left, top) = fill_crop_offsets(actual, target);
            let extract = Operation::Extract {
                left,
                top,
                width: target.width.min(actual.width),
                height: target.height.min(actual.height),
            };
            run_operations(backend, image, &[extract])
        })
    }

    /// Like [`resize_to_fit`](Self::resize_to_fit), but never upsamples:
    /// an image already within `width × height` passes through untouched.
    pub fn resize_to_limit(&mut self, width: u32, height: u32) -> Result<&mut Self> {
        let target = target(width, height)?;
        self.manipulate(|backend, image| {
            let source = backend.dimensions(&image);
            if !exceeds(source, target) {
                return Ok(image);
            }
            let plan = plan_resize(source, target, FitMode::Min);
            run_operations(backend, image, &plan)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::{Interpolation, sharpen_mask};

    fn handle(width: u32, height: u32) -> ImageHandle<MockBackend> {
        ImageHandle::new(MockBackend::new(width, height), "/src/photo.jpg")
    }

    fn applied(handle: &ImageHandle<MockBackend>) -> Vec<Operation> {
        handle
            .backend()
            .get_operations()
            .into_iter()
            .filter_map(|op| match op {
                RecordedOp::Apply(op) => Some(op),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn fit_large_reduction_shrinks_first() {
        let mut h = handle(3000, 2000);
        h.resize_to_fit(150, 150).unwrap();

        assert_eq!(h.dimensions(), Some(Dimensions::new(150, 100)));
        let ops = applied(&h);
        assert_eq!(ops[0], Operation::Shrink { factor: 20 });
        assert!(matches!(ops[1], Operation::TileCache { tile_width: 150, tile_height: 1, max_tiles: 30 }));
        assert!(matches!(
            ops[2],
            Operation::Resample { interpolation: Interpolation::Bicubic, .. }
        ));
        assert_eq!(ops[3], Operation::Convolve(sharpen_mask()));
    }

    #[test]
    fn fit_same_size_is_noop() {
        let mut h = handle(200, 100);
        h.resize_to_fit(400, 100).unwrap();

        assert_eq!(h.dimensions(), Some(Dimensions::new(200, 100)));
        assert!(applied(&h).is_empty());
        assert!(h.is_loaded());
    }

    #[test]
    fn fit_upsamples_with_nearest() {
        let mut h = handle(100, 50);
        h.resize_to_fit(400, 400).unwrap();

        assert_eq!(h.dimensions(), Some(Dimensions::new(400, 200)));
        assert_eq!(
            applied(&h),
            vec![Operation::Resample {
                interpolation: Interpolation::Nearest,
                ratio: 4.0
            }]
        );
    }

    #[test]
    fn fill_produces_exact_size() {
        for (w, h, tw, th) in [(3000, 2000, 150, 150), (640, 480, 300, 400), (101, 333, 50, 50)] {
            let mut handle = handle(w, h);
            handle.resize_to_fill(tw, th).unwrap();
            assert_eq!(
                handle.dimensions(),
                Some(Dimensions::new(tw, th)),
                "{w}x{h} -> {tw}x{th}"
            );
        }
    }

    #[test]
    fn fill_crops_the_centre() {
        let mut h = handle(400, 200);
        h.resize_to_fill(100, 100).unwrap();

        let ops = applied(&h);
        assert_eq!(
            ops.last(),
            Some(&Operation::Extract {
                left: 50,
                top: 0,
                width: 100,
                height: 100
            })
        );
    }

    #[test]
    fn limit_passes_small_images_through() {
        let mut h = handle(100, 80);
        h.resize_to_limit(200, 200).unwrap();

        assert_eq!(h.dimensions(), Some(Dimensions::new(100, 80)));
        assert!(applied(&h).is_empty());
    }

    #[test]
    fn limit_shrinks_large_images() {
        let mut h = handle(800, 400);
        h.resize_to_limit(200, 200).unwrap();
        assert_eq!(h.dimensions(), Some(Dimensions::new(200, 100)));
    }

    #[test]
    fn zero_target_is_rejected_before_loading() {
        let mut h = handle(800, 400);
        let err = h.resize_to_fit(0, 100).unwrap_err();
        assert!(matches!(err, ProcessError::Configuration(_)));
        assert_eq!(h.backend().loads(), 0);
    }

    #[test]
    fn resizes_chain() {
        let mut h = handle(3000, 2000);
        h.resize_to_fit(1500, 1500)
            .unwrap()
            .resize_to_fill(100, 100)
            .unwrap();
        assert_eq!(h.dimensions(), Some(Dimensions::new(100, 100)));
        assert_eq!(h.backend().loads(), 1);
    }
}

//! Named transforms on an [`ImageHandle`](crate::handle::ImageHandle).
//!
//! Each submodule adds methods to the handle. They all go through
//! [`manipulate`](crate::handle::ImageHandle::manipulate) (or queue a writer
//! effect / write option) and return `&mut Self` so calls chain:
//!
//! ```ignore
//! handle.resize_to_fill(400, 500)?.gaussian_blur(2.0)?.strip()?;
//! ```
//!
//! | Module | Methods |
//! |--------|---------|
//! | [`resize`] | `resize_to_fit`, `resize_to_fill`, `resize_to_limit` |
//! | [`crop`] | `crop` |
//! | [`blur`] | `gaussian_blur`, `gaussian_blur_with_cutoff` |
//! | [`format`] | `quality`, `convert`, `strip` |
//! | [`orient`] | `auto_orient` |

pub mod blur;
pub mod crop;
pub mod format;
pub mod orient;
pub mod resize;

use crate::error::Result;
use crate::imaging::{ImageBackend, Operation};

/// Run `operations` in order, threading the image through each.
pub(crate) fn run_operations<B: ImageBackend>(
    backend: &B,
    image: B::Image,
    operations: &[Operation],
) -> Result<B::Image> {
    operations.iter().try_fold(image, |image, op| {
        log::debug!("apply {:?}", op);
        Ok(backend.apply(image, op)?)
    })
}

//! Image processing primitives: the backend seam and the pure math around it.
//!
//! | Concern | Where |
//! |---|---|
//! | **Backend contract** | [`ImageBackend`]: load, apply an [`Operation`], read metadata, write |
//! | **Resize planning** | [`calculations`]: ratio, integer pre-shrink, bicubic + sharpen |
//! | **Kernels** | [`kernels`]: integer gaussian mask, 3×3 sharpen mask |
//! | **EXIF** | [`metadata`]: orientation tags from the decoder's EXIF block (`kamadak-exif`) |
//! | **Production backend** | [`RustBackend`]: `image` + `imageproc` |
//!
//! The module is split into:
//! - **Calculations / Kernels**: Pure functions (unit testable, no pixels involved)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
pub mod calculations;
pub mod metadata;
pub mod kernels;
pub mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::FitMode;
pub use kernels::{gaussian_mask, sharpen_mask};
pub use params::{
    ConvolutionMask, FormatOptions, Interpolation, LoadMode, Operation, OutputFormat, Quality,
    Rotation, Writer,
};
pub use rust_backend::{RustBackend, RustImage};

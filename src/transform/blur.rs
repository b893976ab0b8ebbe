//! Gaussian blur as two separable passes of an integer mask.

use crate::error::{ProcessError, Result};
use crate::handle::ImageHandle;
use crate::imaging::kernels::DEFAULT_MIN_AMPLITUDE;
use crate::imaging::{ImageBackend, Operation, gaussian_mask};

/// Sigma used when a blur step does not name one.
pub const DEFAULT_SIGMA: f64 = 1.0;

impl<B: ImageBackend> ImageHandle<B> {
    /// Blur with the default amplitude cutoff.
    pub fn gaussian_blur(&mut self, sigma: f64) -> Result<&mut Self> {
        self.gaussian_blur_with_cutoff(sigma, DEFAULT_MIN_AMPLITUDE)
    }

    /// Blur with an explicit cutoff: mask weights below `min_amplitude` of
    /// the peak are dropped, so a lower cutoff gives a wider mask.
    ///
    /// The mask is built before the source is loaded. A sigma too large for
    /// the cutoff fails without touching the handle.
    pub fn gaussian_blur_with_cutoff(&mut self, sigma: f64, min_amplitude: f64) -> Result<&mut Self> {
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(ProcessError::Configuration(format!(
                "blur sigma must be positive (got {sigma})"
            )));
        }
        if !(min_amplitude > 0.0 && min_amplitude < 1.0) {
            return Err(ProcessError::Configuration(format!(
                "blur min_amplitude must be between 0 and 1 (got {min_amplitude})"
            )));
        }

        let mask = gaussian_mask(sigma, min_amplitude)?;
        log::debug!("gaussian blur sigma={} width={}", sigma, mask.width);
        let op = Operation::ConvolveSeparable(mask);
        self.manipulate(|backend, image| Ok(backend.apply(image, &op)?))
    }
}

//! Convolution kernel generators.

use super::params::ConvolutionMask;

/// Weights are scaled so the peak is 20; keeps the mask sum under 255 for
/// sigmas up to about 5, where backends can stay on 8-bit integer paths.
pub const NORMALISE_TO: f64 = 20.0;

/// Largest half-width a gaussian mask may have.
pub const MAX_RADIUS: u32 = 10_000;

/// Default amplitude cut-off for [`gaussian_mask`].
pub const DEFAULT_MIN_AMPLITUDE: f64 = 0.2;

/// Mask generation failed: no half-width within [`MAX_RADIUS`] drops below
/// the requested amplitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelTooLarge {
    pub sigma: f64,
    pub min_amplitude: f64,
}

/// 1-D integer gaussian mask for a separable convolution.
///
/// The half-width is the smallest `x` in `1..=MAX_RADIUS` with
/// `exp(-x² / 2σ²) < min_amplitude`; the mask is `2x + 1` wide and its
/// scale is the sum of its weights.
pub fn gaussian_mask(sigma: f64, min_amplitude: f64) -> Result<ConvolutionMask, KernelTooLarge> {
    let sigma2 = 2.0 * sigma * sigma;
    let amplitude = |d: f64| (-(d * d) / sigma2).exp();

    let radius = (1..=MAX_RADIUS)
        .find(|&x| amplitude(x as f64) < min_amplitude)
        .ok_or(KernelTooLarge {
            sigma,
            min_amplitude,
        })?;

    let width = radius as i64 * 2 + 1;
    let coefficients: Vec<i32> = (0..width)
        .map(|x| (NORMALISE_TO * amplitude((x - width / 2) as f64)).round() as i32)
        .collect();
    let sum = coefficients.iter().sum();

    Ok(ConvolutionMask::row(coefficients, sum))
}

/// Fixed 3×3 sharpen applied after bicubic reductions.
pub fn sharpen_mask() -> ConvolutionMask {
    #[rustfmt::skip]
    let coefficients = vec![
        -1, -1, -1,
        -1, 24, -1,
        -1, -1, -1,
    ];
    ConvolutionMask {
        width: 3,
        height: 3,
        coefficients,
        scale: 16,
        offset: 0,
    }
}

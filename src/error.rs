//! Error taxonomy for loading, transforming and writing versions.

use crate::imaging::BackendError;
use crate::imaging::kernels::KernelTooLarge;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    /// Caller bug: bad registration, unknown version, bad format argument.
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error(
        "Failed to manipulate {}, maybe it is not a supported image? Original error: {source}",
        path.display()
    )]
    Load {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    /// A pixel operation was rejected (e.g. a crop outside the image).
    #[error("Image processing failed: {0}")]
    Backend(#[from] BackendError),
    #[error("Invalid value for Orientation: {0}")]
    InvalidOrientation(String),
    #[error("Gaussian mask too large for sigma {sigma} at minimum amplitude {min_amplitude}")]
    KernelTooLarge { sigma: f64, min_amplitude: f64 },
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<KernelTooLarge> for ProcessError {
    fn from(err: KernelTooLarge) -> Self {
        ProcessError::KernelTooLarge {
            sigma: err.sigma,
            min_amplitude: err.min_amplitude,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProcessError>;

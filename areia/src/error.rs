//! Error taxonomy for redshift simulation.

use shared::image_proc::detection::SegmentationError;
use shared::image_proc::{ConvolveError, GridError, NoiseError};
use thiserror::Error;

/// Errors returned by the resampler and the artificial-redshift pipeline
#[derive(Error, Debug)]
pub enum AreiaError {
    /// Cosmological parameters are non-physical or produce unusable distances
    #[error("invalid cosmology: {0}")]
    InvalidCosmology(String),
    /// The image grid (or a companion grid such as a PSF) is malformed
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
    /// Requested feature is outside single-band redshifting
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("invalid redshift {value}: {reason}")]
    InvalidRedshift { value: f64, reason: &'static str },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("missing input: {0}")]
    MissingInput(&'static str),
    #[error("no source detected: {0}")]
    NoSourceDetected(String),
    #[error("background {background:?} is smaller than the image {image:?}")]
    BackgroundTooSmall {
        background: (usize, usize),
        image: (usize, usize),
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<GridError> for AreiaError {
    fn from(err: GridError) -> Self {
        match err {
            GridError::InvalidZoomFactor(_) => AreiaError::InvalidParameter(err.to_string()),
            _ => AreiaError::DimensionMismatch(err.to_string()),
        }
    }
}

impl From<ConvolveError> for AreiaError {
    fn from(err: ConvolveError) -> Self {
        match err {
            ConvolveError::EvenKernel { .. } | ConvolveError::EmptyKernel => {
                AreiaError::DimensionMismatch(format!("PSF {err}"))
            }
            _ => AreiaError::InvalidParameter(format!("PSF {err}")),
        }
    }
}

impl From<NoiseError> for AreiaError {
    fn from(err: NoiseError) -> Self {
        AreiaError::InvalidParameter(err.to_string())
    }
}

impl From<SegmentationError> for AreiaError {
    fn from(err: SegmentationError) -> Self {
        AreiaError::NoSourceDetected(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AreiaError>;

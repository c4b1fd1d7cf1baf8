//! Image processing primitives for simulated galaxy observations.
//!
//! # Module Organization
//!
//! ## Geometry
//! - **interpolate**: nearest/bilinear/bicubic sampling and centred zoom
//! - **section**: crops and bounded sub-array views
//!
//! ## Instrument effects
//! - **convolve2d**: 2D convolution with normalised PSF kernels
//! - **noise**: seeded sky and photon shot noise
//!
//! ## Source extraction
//! - **detection**: thresholding, connected components, central segmentation
//!
//! All operations work on `ndarray` views and return owned arrays; inputs are
//! never modified in place.

pub mod convolve2d;
pub mod detection;
pub mod interpolate;
pub mod noise;
pub mod section;

pub use convolve2d::{
    convolve2d, gaussian_kernel, gaussian_kernel_from_fwhm, normalize_kernel, ConvolveError,
    ConvolveMode, ConvolveOptions,
};
pub use detection::{central_segmentation, Connectivity, SegmentationConfig, SegmentationError};
pub use interpolate::{
    zoom, FluxMode, GridError, GridMode, GridSampler, Interpolation, ZoomOptions,
};
pub use noise::{NoiseError, ShotNoiseModel};
pub use section::{centered_offset, crop_center, extract_section};

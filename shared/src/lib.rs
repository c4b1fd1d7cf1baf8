//! Shared image-processing components for the areia workspace.
//!
//! Domain-agnostic building blocks on `ndarray` grids: interpolation and
//! regridding, convolution, seeded noise, robust statistics and source
//! segmentation. The cosmology and redshift pipeline live in `areia`.

pub mod algo;
pub mod image_proc;

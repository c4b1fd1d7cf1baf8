//! Noise generation utilities for simulated observations.
//!
//! Provides the seeded noise primitives used when degrading a redshifted
//! image to a target exposure:
//! - Gaussian sky fields with a given standard deviation
//! - Photon shot noise, either as the Gaussian approximation
//!   `sqrt(|I t|) N(0, 1) / t` or by Poisson resampling of `I t`
//!
//! All functions utilise parallel processing via rayon. Each 64-row chunk gets
//! its own RNG derived from the caller's seed, so output depends only on the
//! seed and the input.

use ndarray::{Array2, ArrayView2, Axis};
use rand_distr::{Distribution, Normal, Poisson, StandardNormal};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algo::{process_array_in_parallel_chunks, DEFAULT_CHUNK_ROWS};

/// Means above this use the normal approximation to Poisson sampling.
const POISSON_NORMAL_CUTOVER: f64 = 20.0;

/// Errors raised for invalid noise parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NoiseError {
    #[error("exposure time must be finite and positive, got {0} s")]
    InvalidExposure(f64),
    #[error("standard deviation must be finite and non-negative, got {0}")]
    InvalidStdDev(f64),
}

/// How photon shot noise is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShotNoiseModel {
    /// Additive `sqrt(|I t|) N(0, 1) / t`
    #[default]
    Gaussian,
    /// Replace each pixel by `Poisson(I t) / t` (negative means give zero)
    Poisson,
}

/// Generate a 2D array of normally distributed values.
///
/// # Arguments
/// * `size` - Tuple of (height, width) for the output array dimensions
/// * `mean` - Mean value of the normal distribution
/// * `std_dev` - Standard deviation of the normal distribution
/// * `seed` - Random seed for deterministic output
pub fn simple_normal_array(
    size: (usize, usize),
    mean: f64,
    std_dev: f64,
    seed: u64,
) -> Result<Array2<f64>, NoiseError> {
    let normal_dist = Normal::new(mean, std_dev).map_err(|_| NoiseError::InvalidStdDev(std_dev))?;

    Ok(process_array_in_parallel_chunks(
        Array2::zeros(size),
        seed,
        Some(DEFAULT_CHUNK_ROWS),
        |chunk, _, rng| {
            chunk
                .iter_mut()
                .for_each(|pixel| *pixel = normal_dist.sample(rng));
        },
    ))
}

/// Zero-mean Gaussian sky with standard deviation `std_dev`.
pub fn gaussian_sky(
    size: (usize, usize),
    std_dev: f64,
    seed: u64,
) -> Result<Array2<f64>, NoiseError> {
    if !std_dev.is_finite() || std_dev < 0.0 {
        return Err(NoiseError::InvalidStdDev(std_dev));
    }
    simple_normal_array(size, 0.0, std_dev, seed)
}

/// Shot noise field to be added to `image` for an exposure of `exposure_s`.
///
/// Implements the Gaussian approximation `sqrt(|I t|) N(0, 1) / t`, so the
/// noise is in the same units as the image (flux per second).
pub fn shot_noise_field(
    image: &ArrayView2<f64>,
    exposure_s: f64,
    seed: u64,
) -> Result<Array2<f64>, NoiseError> {
    if !exposure_s.is_finite() || exposure_s <= 0.0 {
        return Err(NoiseError::InvalidExposure(exposure_s));
    }

    Ok(process_array_in_parallel_chunks(
        Array2::zeros(image.dim()),
        seed,
        Some(DEFAULT_CHUNK_ROWS),
        |chunk, first_row, rng| {
            let rows = chunk.nrows();
            let source = image.slice_axis(
                Axis(0),
                ndarray::Slice::from(first_row..first_row + rows),
            );

            for (pixel, &flux) in chunk.iter_mut().zip(source.iter()) {
                let z: f64 = StandardNormal.sample(rng);
                *pixel = (flux * exposure_s).abs().sqrt() * z / exposure_s;
            }
        },
    ))
}

/// Resample `image` as Poisson photon counts over `exposure_s`, returned as a rate.
pub fn poisson_resample(
    image: &ArrayView2<f64>,
    exposure_s: f64,
    seed: u64,
) -> Result<Array2<f64>, NoiseError> {
    if !exposure_s.is_finite() || exposure_s <= 0.0 {
        return Err(NoiseError::InvalidExposure(exposure_s));
    }

    Ok(process_array_in_parallel_chunks(
        image.mapv(|flux| flux * exposure_s),
        seed,
        Some(DEFAULT_CHUNK_ROWS),
        |chunk, _, rng| {
            chunk.iter_mut().for_each(|pixel| {
                let mean_counts = *pixel;
                let counts = if mean_counts.is_nan() || mean_counts <= 0.0 {
                    0.0
                } else if mean_counts < POISSON_NORMAL_CUTOVER {
                    match Poisson::new(mean_counts) {
                        Ok(poisson) => poisson.sample(rng),
                        Err(_) => 0.0,
                    }
                } else {
                    let z: f64 = StandardNormal.sample(rng);
                    (mean_counts + mean_counts.sqrt() * z).max(0.0)
                };
                *pixel = counts / exposure_s;
            });
        },
    ))
}

/// Apply shot noise to `image` with the chosen model.
pub fn apply_shot_noise(
    image: &ArrayView2<f64>,
    exposure_s: f64,
    model: ShotNoiseModel,
    seed: u64,
) -> Result<Array2<f64>, NoiseError> {
    match model {
        ShotNoiseModel::Gaussian => {
            let noise = shot_noise_field(image, exposure_s, seed)?;
            Ok(&noise + image)
        }
        ShotNoiseModel::Poisson => poisson_resample(image, exposure_s, seed),
    }
}

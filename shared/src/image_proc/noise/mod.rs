//! Noise generation for simulated observations
//!
//! - **generate**: seeded Gaussian sky and photon shot noise

pub mod generate;

pub use generate::{
    apply_shot_noise, gaussian_sky, poisson_resample, shot_noise_field, simple_normal_array,
    NoiseError, ShotNoiseModel,
};

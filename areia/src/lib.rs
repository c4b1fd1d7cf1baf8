//! # areia: Artificial Redshift Effects for Image Analysis
//!
//! Simulates how a galaxy observed at one redshift would look at another,
//! in the spirit of FERENGI (Barden et al. 2008).
//!
//! ## Module Organization
//!
//! - **cosmology**: ΛCDM distances (comoving, angular-diameter, luminosity)
//! - **frame**: source images, observation setups and resampled outputs
//! - **transform**: angular scale and dimming factors between two redshifts
//! - **resampler**: the single-band redshift resampling stage
//! - **evolution**: luminosity evolution with look-back time
//! - **pipeline**: cutout, redshift, evolution, PSF, noise, sky and crop
//! - **config**: serde-backed pipeline configuration
//! - **provenance**: header-style record of the applied factors
//!
//! ## Quick start
//!
//! ```rust
//! use areia::{resample, CosmologyModel, SourceImage};
//! use ndarray::Array2;
//!
//! let cosmo = CosmologyModel::flat_lambda_cdm(70.0, 0.3).unwrap();
//! let image = SourceImage::new(Array2::from_elem((32, 32), 1.0), 0.396, 0.05).unwrap();
//!
//! let out = resample(&image, 0.5, &cosmo, 0.396).unwrap();
//! let ratio = out.total_flux() / image.total_flux();
//! assert!((ratio - (1.05f64 / 1.5).powi(4)).abs() < 1e-9);
//! ```
//!
//! Multi-band redshifting, k-corrections and PSF reconstruction are not
//! implemented and are rejected with [`AreiaError::UnsupportedOperation`].

pub mod config;
pub mod cosmology;
pub mod error;
pub mod evolution;
pub mod frame;
pub mod pipeline;
pub mod provenance;
pub mod resampler;
pub mod transform;

pub use config::PipelineConfig;
pub use cosmology::{CosmologyModel, CosmologyParams, MAX_REDSHIFT};
pub use error::{AreiaError, Result};
pub use evolution::EvolutionModel;
pub use frame::{ObservationFrame, OutputImage, SourceImage};
pub use pipeline::{ArtificialRedshift, PipelineInput, PipelineResult, PsfModel};
pub use provenance::Provenance;
pub use resampler::{resample, PsfReconstruction, RedshiftResampler, ResampleOptions};
pub use transform::{DimmingLaw, RedshiftTransform, SizeEvolution};

pub use shared::image_proc::{FluxMode, GridMode, Interpolation};

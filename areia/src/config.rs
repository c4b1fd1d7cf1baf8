//! Pipeline configuration.
//!
//! Every field has a default, so a JSON file only needs the values it
//! changes:
//!
//! ```json
//! { "shot_noise": false, "output_size": 64, "cosmology": { "h0": 67.7 } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use shared::image_proc::{Interpolation, SegmentationConfig, ShotNoiseModel};

use crate::cosmology::CosmologyModel;
use crate::error::Result;
use crate::evolution::EvolutionModel;
use crate::transform::SizeEvolution;

/// Default side of the final square crop
pub const DEFAULT_OUTPUT_SIZE: usize = 101;

/// Stage switches and parameters for [`crate::pipeline::ArtificialRedshift`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub cosmology: CosmologyModel,

    /// Keep only the central source before redshifting
    pub make_cutout: bool,
    pub segmentation: SegmentationConfig,

    /// Zoom by the angular-diameter distance ratio
    pub rebinning: bool,
    /// Include intrinsic size evolution in the zoom
    pub size_correction: bool,
    pub size_evolution: SizeEvolution,
    /// Scale flux by the luminosity-distance ratio
    pub dimming: bool,
    /// Keep the input frame size when zooming (otherwise resize the grid)
    pub fixed_grid: bool,
    pub interpolation: Interpolation,

    /// Apply luminosity evolution
    pub evolution: bool,
    pub evolution_model: EvolutionModel,

    pub convolve_with_psf: bool,

    pub shot_noise: bool,
    pub shot_noise_model: ShotNoiseModel,

    pub add_background: bool,
    /// Take the background section from the centre of the supplied field
    pub bg_centered: bool,

    /// Side of the final square crop; None keeps the full frame
    pub output_size: Option<usize>,

    /// Seed for every random draw in the run
    pub seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cosmology: CosmologyModel::default(),
            make_cutout: true,
            segmentation: SegmentationConfig::default(),
            rebinning: true,
            size_correction: true,
            size_evolution: SizeEvolution::default(),
            dimming: true,
            fixed_grid: true,
            interpolation: Interpolation::Bilinear,
            evolution: true,
            evolution_model: EvolutionModel::default(),
            convolve_with_psf: true,
            shot_noise: true,
            shot_noise_model: ShotNoiseModel::Gaussian,
            add_background: true,
            bg_centered: false,
            output_size: Some(DEFAULT_OUTPUT_SIZE),
            seed: 0,
        }
    }
}

impl PipelineConfig {
    /// Geometry and flux only: every stage that needs extra inputs or
    /// draws random numbers is off.
    pub fn geometric_only() -> Self {
        Self {
            make_cutout: false,
            evolution: false,
            convolve_with_psf: false,
            shot_noise: false,
            add_background: false,
            output_size: None,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::debug!("Loaded pipeline configuration from {}", path.display());
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

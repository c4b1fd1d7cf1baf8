//! Luminosity evolution between the source and target epochs.

use serde::{Deserialize, Serialize};

use crate::error::{AreiaError, Result};

/// Default evolution slope
pub const DEFAULT_EVOLUTION_ALPHA: f64 = -0.13;

/// Brightening applied to galaxies observed at earlier epochs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvolutionModel {
    /// Magnitude change linear in redshift: factor `10^(-0.4 alpha z_t)`
    Flat { alpha: f64 },
    /// Scales the absolute magnitude: `ΔM = M - M (1+z_t)^alpha`,
    /// factor `10^(-0.4 ΔM)`
    Luminosity { alpha: f64 },
}

impl Default for EvolutionModel {
    fn default() -> Self {
        EvolutionModel::Luminosity {
            alpha: DEFAULT_EVOLUTION_ALPHA,
        }
    }
}

impl EvolutionModel {
    pub fn alpha(&self) -> f64 {
        match *self {
            EvolutionModel::Flat { alpha } | EvolutionModel::Luminosity { alpha } => alpha,
        }
    }

    /// Multiplicative flux factor at `target_z`.
    ///
    /// `absolute_magnitude` is required by the luminosity form.
    pub fn factor(&self, target_z: f64, absolute_magnitude: Option<f64>) -> Result<f64> {
        let alpha = self.alpha();
        if !alpha.is_finite() {
            return Err(AreiaError::InvalidParameter(format!(
                "evolution alpha must be finite, got {alpha}"
            )));
        }

        let delta_mag = match *self {
            EvolutionModel::Flat { alpha } => alpha * target_z,
            EvolutionModel::Luminosity { alpha } => {
                let magnitude = absolute_magnitude.ok_or(AreiaError::MissingInput(
                    "absolute magnitude for luminosity evolution",
                ))?;
                if !magnitude.is_finite() {
                    return Err(AreiaError::InvalidParameter(format!(
                        "absolute magnitude must be finite, got {magnitude}"
                    )));
                }
                magnitude - magnitude * (1.0 + target_z).powf(alpha)
            }
        };

        Ok(10f64.powf(-0.4 * delta_mag))
    }
}

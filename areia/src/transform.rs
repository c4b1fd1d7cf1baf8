//! Angular-size and flux factors relating two redshifts.
//!
//! A galaxy of fixed physical size subtends an angle inversely proportional
//! to its angular-diameter distance, so moving it from `z_s` to `z_t` scales
//! its image by `D_A(z_s) / D_A(z_t)`. Its surface brightness dims either by
//! the bolometric Tolman law `[(1+z_s)/(1+z_t)]^4` or, in flux terms, by the
//! luminosity-distance ratio `[D_L(z_s)/D_L(z_t)]^2`.

use serde::{Deserialize, Serialize};

use crate::cosmology::{check_redshift, CosmologyModel};
use crate::error::{AreiaError, Result};

/// Default size-evolution exponent, `r ∝ (1+z)^-0.97`
pub const DEFAULT_SIZE_EXPONENT: f64 = -0.97;

/// How flux dims between the two redshifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimmingLaw {
    /// `[(1+z_s)/(1+z_t)]^4`
    #[default]
    SurfaceBrightness,
    /// `[D_L(z_s)/D_L(z_t)]^2`
    LuminosityDistance,
}

/// Intrinsic size evolution, `r ∝ (1+z)^exponent`.
///
/// Applied relative to the source epoch: the scale factor gains
/// `((1+z_t)/(1+z_s))^exponent`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeEvolution {
    pub exponent: f64,
}

impl Default for SizeEvolution {
    fn default() -> Self {
        Self {
            exponent: DEFAULT_SIZE_EXPONENT,
        }
    }
}

/// Factors for moving an image from `source_z` to `target_z`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RedshiftTransform {
    pub source_z: f64,
    pub target_z: f64,
    /// Angular-diameter distances in Mpc
    pub source_da: f64,
    pub target_da: f64,
    /// Luminosity distances in Mpc
    pub source_dl: f64,
    pub target_dl: f64,
    /// `D_A(z_s) / D_A(z_t)` alone
    pub angular_scale: f64,
    /// Multiplicative size-evolution term (1 when disabled)
    pub size_evolution: f64,
    /// Linear zoom applied to the image: `angular_scale * size_evolution`
    pub scale_factor: f64,
    pub dimming_law: DimmingLaw,
    /// Multiplier applied to every output pixel
    pub dimming_factor: f64,
}

impl RedshiftTransform {
    /// Compute the transform for one source/target pair.
    ///
    /// Equal redshifts give the identity (all factors exactly 1). Otherwise
    /// both angular-diameter distances must be finite and positive, so a
    /// zero-redshift endpoint fails with `InvalidCosmology`.
    pub fn compute(
        cosmology: &CosmologyModel,
        source_z: f64,
        target_z: f64,
        dimming_law: DimmingLaw,
        size_evolution: Option<SizeEvolution>,
    ) -> Result<Self> {
        check_redshift(source_z)?;
        check_redshift(target_z)?;

        let source_da = cosmology.angular_diameter_distance(source_z)?;
        let source_dl = cosmology.luminosity_distance(source_z)?;

        if source_z == target_z {
            return Ok(Self {
                source_z,
                target_z,
                source_da,
                target_da: source_da,
                source_dl,
                target_dl: source_dl,
                angular_scale: 1.0,
                size_evolution: 1.0,
                scale_factor: 1.0,
                dimming_law,
                dimming_factor: 1.0,
            });
        }

        let target_da = cosmology.angular_diameter_distance(target_z)?;
        let target_dl = cosmology.luminosity_distance(target_z)?;

        for (label, z, distance) in [
            ("source", source_z, source_da),
            ("target", target_z, target_da),
        ] {
            if !distance.is_finite() || distance <= 0.0 {
                return Err(AreiaError::InvalidCosmology(format!(
                    "{label} angular-diameter distance at z = {z} is {distance} Mpc; \
                     it must be finite and positive"
                )));
            }
        }

        let angular_scale = source_da / target_da;

        let size_evolution = match size_evolution {
            Some(evolution) => {
                if !evolution.exponent.is_finite() {
                    return Err(AreiaError::InvalidParameter(format!(
                        "size evolution exponent must be finite, got {}",
                        evolution.exponent
                    )));
                }
                ((1.0 + target_z) / (1.0 + source_z)).powf(evolution.exponent)
            }
            None => 1.0,
        };

        let dimming_factor = match dimming_law {
            DimmingLaw::SurfaceBrightness => ((1.0 + source_z) / (1.0 + target_z)).powi(4),
            DimmingLaw::LuminosityDistance => (source_dl / target_dl).powi(2),
        };

        let transform = Self {
            source_z,
            target_z,
            source_da,
            target_da,
            source_dl,
            target_dl,
            angular_scale,
            size_evolution,
            scale_factor: angular_scale * size_evolution,
            dimming_law,
            dimming_factor,
        };

        log::debug!(
            "z {source_z} -> {target_z}: D_A {source_da:.3} -> {target_da:.3} Mpc, \
             scale {:.6}, dimming {:.6e} ({dimming_law:?})",
            transform.scale_factor,
            transform.dimming_factor
        );

        Ok(transform)
    }

    /// True when the transform leaves the image untouched.
    pub fn is_identity(&self) -> bool {
        self.scale_factor == 1.0 && self.dimming_factor == 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn concordance() -> CosmologyModel {
        CosmologyModel::flat_lambda_cdm(70.0, 0.3).unwrap()
    }

    #[test]
    fn test_reference_pair() {
        let t = RedshiftTransform::compute(
            &concordance(),
            0.05,
            0.5,
            DimmingLaw::SurfaceBrightness,
            None,
        )
        .unwrap();

        assert_relative_eq!(t.dimming_factor, 0.2401, max_relative = 1e-12);
        assert_relative_eq!(t.scale_factor, 0.160135, max_relative = 1e-5);
        assert_relative_eq!(t.scale_factor, t.source_da / t.target_da);
    }

    #[test]
    fn test_luminosity_distance_law() {
        let t = RedshiftTransform::compute(
            &concordance(),
            0.05,
            0.5,
            DimmingLaw::LuminosityDistance,
            None,
        )
        .unwrap();

        assert_relative_eq!(t.dimming_factor, 0.0061569, max_relative = 1e-4);
        assert_relative_eq!(
            t.dimming_factor,
            (t.source_dl / t.target_dl).powi(2),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_equal_redshifts_are_identity() {
        let t = RedshiftTransform::compute(
            &concordance(),
            0.3,
            0.3,
            DimmingLaw::LuminosityDistance,
            Some(SizeEvolution::default()),
        )
        .unwrap();
        assert!(t.is_identity());

        let at_zero =
            RedshiftTransform::compute(&concordance(), 0.0, 0.0, DimmingLaw::default(), None)
                .unwrap();
        assert!(at_zero.is_identity());
    }

    #[test]
    fn test_zero_redshift_endpoint_is_invalid() {
        let result =
            RedshiftTransform::compute(&concordance(), 0.0, 1.0, DimmingLaw::default(), None);
        assert!(matches!(result, Err(AreiaError::InvalidCosmology(_))));
    }

    #[test]
    fn test_size_evolution_shrinks_further() {
        let cosmo = concordance();
        let plain = RedshiftTransform::compute(&cosmo, 0.1, 2.0, DimmingLaw::default(), None)
            .unwrap();
        let evolved = RedshiftTransform::compute(
            &cosmo,
            0.1,
            2.0,
            DimmingLaw::default(),
            Some(SizeEvolution::default()),
        )
        .unwrap();

        assert!(evolved.scale_factor < plain.scale_factor);
        assert_relative_eq!(
            evolved.size_evolution,
            (3.0f64 / 1.1).powf(-0.97),
            max_relative = 1e-12
        );
        assert_eq!(evolved.angular_scale, plain.angular_scale);
    }

    #[test]
    fn test_factors_invert_on_reverse() {
        let cosmo = concordance();
        for law in [DimmingLaw::SurfaceBrightness, DimmingLaw::LuminosityDistance] {
            let forward = RedshiftTransform::compute(&cosmo, 0.1, 0.8, law, None).unwrap();
            let back = RedshiftTransform::compute(&cosmo, 0.8, 0.1, law, None).unwrap();

            assert_relative_eq!(forward.scale_factor * back.scale_factor, 1.0, epsilon = 1e-12);
            assert_relative_eq!(
                forward.dimming_factor * back.dimming_factor,
                1.0,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let cosmo = concordance();
        assert!(matches!(
            RedshiftTransform::compute(&cosmo, 0.1, -1.0, DimmingLaw::default(), None),
            Err(AreiaError::InvalidRedshift { .. })
        ));
        assert!(matches!(
            RedshiftTransform::compute(
                &cosmo,
                0.1,
                1.0,
                DimmingLaw::default(),
                Some(SizeEvolution {
                    exponent: f64::NAN
                })
            ),
            Err(AreiaError::InvalidParameter(_))
        ));
    }
}

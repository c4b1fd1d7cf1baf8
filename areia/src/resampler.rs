//! Single-band redshift resampling.
//!
//! Moves an image from its observed redshift to a target redshift:
//! 1. [`RedshiftTransform`] gives the angular zoom and dimming factors
//! 2. The grid is zoomed about its centre by the scale factor
//! 3. Every pixel is multiplied by the dimming factor
//! 4. A second zoom regrids onto the requested output pixel scale
//!
//! With [`ResampleOptions::single_pass`] steps 2 and 4 collapse into one zoom
//! by the product of both factors, so the image is interpolated only once.
//!
//! Bandpass shifting, k-corrections and PSF reconstruction are outside this
//! stage and rejected with [`AreiaError::UnsupportedOperation`].

use std::time::Instant;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use shared::image_proc::{zoom, FluxMode, GridMode, Interpolation, ZoomOptions};

use crate::cosmology::CosmologyModel;
use crate::error::{AreiaError, Result};
use crate::frame::{check_pixel_scale, OutputImage, SourceImage};
use crate::transform::{DimmingLaw, RedshiftTransform, SizeEvolution};

/// Request to match the source PSF to a target PSF before redshifting.
///
/// Not supported; passing one makes the resampler fail.
#[derive(Debug, Clone, PartialEq)]
pub struct PsfReconstruction {
    pub source_psf: Array2<f64>,
    pub target_psf: Array2<f64>,
}

/// Options for [`RedshiftResampler`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResampleOptions {
    pub interpolation: Interpolation,
    pub grid: GridMode,
    pub flux: FluxMode,
    pub dimming_law: DimmingLaw,
    /// Zoom by the angular scale factor
    pub apply_rebinning: bool,
    /// Multiply by the dimming factor
    pub apply_dimming: bool,
    /// Zoom once by the angular factor times `source_ps / output_ps`
    pub single_pass: bool,
    /// Extra `(1+z)^exponent` size term in the scale factor
    pub size_evolution: Option<SizeEvolution>,
    /// Band to observe in; must match the source band
    pub target_band: Option<String>,
    #[serde(skip)]
    pub psf_reconstruction: Option<PsfReconstruction>,
}

impl Default for ResampleOptions {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::Bilinear,
            grid: GridMode::Fixed,
            flux: FluxMode::ConserveFlux,
            dimming_law: DimmingLaw::SurfaceBrightness,
            apply_rebinning: true,
            apply_dimming: true,
            single_pass: false,
            size_evolution: None,
            target_band: None,
            psf_reconstruction: None,
        }
    }
}

impl ResampleOptions {
    fn zoom_options(&self) -> ZoomOptions {
        ZoomOptions {
            interpolation: self.interpolation,
            grid: self.grid,
            flux: self.flux,
            fill_value: 0.0,
        }
    }
}

/// Resamples single-band images to a new redshift under a fixed cosmology.
#[derive(Debug, Clone, Default)]
pub struct RedshiftResampler {
    cosmology: CosmologyModel,
    options: ResampleOptions,
}

impl RedshiftResampler {
    pub fn new(cosmology: CosmologyModel) -> Self {
        Self {
            cosmology,
            options: ResampleOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ResampleOptions) -> Self {
        self.options = options;
        self
    }

    pub fn cosmology(&self) -> &CosmologyModel {
        &self.cosmology
    }

    pub fn options(&self) -> &ResampleOptions {
        &self.options
    }

    fn check_supported(&self, image: &SourceImage) -> Result<()> {
        if self.options.psf_reconstruction.is_some() {
            return Err(AreiaError::UnsupportedOperation(
                "PSF reconstruction is not implemented".to_string(),
            ));
        }
        if let Some(target) = &self.options.target_band {
            if image.band() != Some(target.as_str()) {
                return Err(AreiaError::UnsupportedOperation(format!(
                    "bandpass shift from {:?} to {target:?} needs a k-correction",
                    image.band()
                )));
            }
        }
        Ok(())
    }

    /// Factors this resampler would apply to move `source_z` to `target_z`.
    pub fn transform(&self, source_z: f64, target_z: f64) -> Result<RedshiftTransform> {
        RedshiftTransform::compute(
            &self.cosmology,
            source_z,
            target_z,
            self.options.dimming_law,
            self.options.size_evolution,
        )
    }

    /// Resample `image` to `target_z`, sampled at `output_pixel_scale` arcsec/px.
    pub fn resample(
        &self,
        image: &SourceImage,
        target_z: f64,
        output_pixel_scale: f64,
    ) -> Result<OutputImage> {
        self.check_supported(image)?;
        check_pixel_scale(output_pixel_scale)?;

        let start = Instant::now();
        let transform = self.transform(image.redshift(), target_z)?;
        let zoom_options = self.options.zoom_options();

        let angular = if self.options.apply_rebinning {
            transform.scale_factor
        } else {
            1.0
        };
        let regrid = image.pixel_scale() / output_pixel_scale;

        let mut data = if self.options.single_pass {
            let factor = angular * regrid;
            if factor != 1.0 {
                log::debug!("Single-pass zoom by {factor:.6} (angular {angular:.6})");
                zoom(&image.data(), factor, &zoom_options)?
            } else {
                image.data().to_owned()
            }
        } else if angular != 1.0 {
            zoom(&image.data(), angular, &zoom_options)?
        } else {
            image.data().to_owned()
        };

        if self.options.apply_dimming && transform.dimming_factor != 1.0 {
            let dimming = transform.dimming_factor;
            data.mapv_inplace(|v| v * dimming);
        }

        if !self.options.single_pass && regrid != 1.0 {
            data = zoom(&data.view(), regrid, &zoom_options)?;
            log::debug!(
                "Regridded {} -> {} arcsec/px (factor {regrid:.6})",
                image.pixel_scale(),
                output_pixel_scale
            );
        }

        log::debug!(
            "Resampled {:?} image z={} -> z={target_z} into {:?} in {:?}",
            image.dim(),
            image.redshift(),
            data.dim(),
            start.elapsed()
        );

        Ok(OutputImage {
            data,
            pixel_scale: output_pixel_scale,
            redshift: target_z,
            transform,
        })
    }

    /// Resample a set of band images.
    ///
    /// Only single-band input is supported: more than one image fails with
    /// `UnsupportedOperation`.
    pub fn resample_bands(
        &self,
        images: &[SourceImage],
        target_z: f64,
        output_pixel_scale: f64,
    ) -> Result<Vec<OutputImage>> {
        match images {
            [] => Err(AreiaError::MissingInput("at least one band image")),
            [image] => Ok(vec![self.resample(image, target_z, output_pixel_scale)?]),
            _ => Err(AreiaError::UnsupportedOperation(format!(
                "multi-band redshifting ({} bands) is not implemented",
                images.len()
            ))),
        }
    }
}

/// Resample with default options: bilinear, fixed grid, flux-conserving
/// zoom and `[(1+z_s)/(1+z_t)]^4` dimming.
pub fn resample(
    image: &SourceImage,
    target_z: f64,
    cosmology: &CosmologyModel,
    output_pixel_scale: f64,
) -> Result<OutputImage> {
    RedshiftResampler::new(cosmology.clone()).resample(image, target_z, output_pixel_scale)
}

//! Full single-band artificial-redshift pipeline.
//!
//! Stages run in a fixed order, each behind a [`PipelineConfig`] switch:
//!
//! | Stage       | Switch                 | Effect                                   |
//! |-------------|------------------------|------------------------------------------|
//! | cutout      | `make_cutout`          | zero everything but the central source   |
//! | redshift    | `rebinning`, `dimming` | one zoom to target scale, D_L² dimming   |
//! | evolution   | `evolution`            | luminosity evolution factor              |
//! | PSF         | `convolve_with_psf`    | convolve with the target PSF             |
//! | shot noise  | `shot_noise`           | photon noise for the target exposure     |
//! | background  | `add_background`       | add a real or generated sky              |
//! | crop        | `output_size`          | central square crop                      |
//!
//! Every random draw is seeded from `PipelineConfig::seed`, so a run is
//! reproducible bit for bit.

use std::time::Instant;

use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::algo::image_background_stats;
use shared::image_proc::detection::apply_mask;
use shared::image_proc::noise::{apply_shot_noise, gaussian_sky};
use shared::image_proc::{
    central_segmentation, centered_offset, convolve2d, crop_center, extract_section,
    gaussian_kernel_from_fwhm, normalize_kernel, ConvolveMode, ConvolveOptions, FluxMode,
    GridMode,
};

use crate::config::PipelineConfig;
use crate::error::{AreiaError, Result};
use crate::frame::{ObservationFrame, SourceImage};
use crate::provenance::Provenance;
use crate::resampler::{RedshiftResampler, ResampleOptions};
use crate::transform::{DimmingLaw, RedshiftTransform};

/// Offsets separating the random streams of different stages
const SHOT_NOISE_STREAM: u64 = 0;
const SKY_STREAM: u64 = 1;
const PLACEMENT_STREAM: u64 = 2;

/// Point spread function of the target observation.
#[derive(Debug, Clone, PartialEq)]
pub enum PsfModel {
    /// Sampled PSF at the target pixel scale; odd dimensions
    Image(Array2<f64>),
    /// Circular Gaussian with the given FWHM in target pixels
    Gaussian { fwhm_px: f64 },
}

impl PsfModel {
    /// Unit-sum convolution kernel.
    pub fn kernel(&self) -> Result<Array2<f64>> {
        let kernel = match self {
            PsfModel::Image(psf) => normalize_kernel(&psf.view())?,
            PsfModel::Gaussian { fwhm_px } => gaussian_kernel_from_fwhm(*fwhm_px)?,
        };
        Ok(kernel)
    }
}

/// Where the background section is taken from.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Placement {
    Centered,
    At(usize, usize),
    Random,
}

/// Everything a run needs besides the configuration.
#[derive(Debug, Clone)]
pub struct PipelineInput {
    pub image: SourceImage,
    /// Redshift, pixel scale and exposure to simulate
    pub target: ObservationFrame,
    pub psf: Option<PsfModel>,
    /// Sky field at the target pixel scale to draw a section from
    pub background: Option<Array2<f64>>,
    /// Top-left corner of the background section
    pub background_position: Option<(usize, usize)>,
    /// Absolute magnitude of the galaxy, for luminosity evolution
    pub absolute_magnitude: Option<f64>,
}

impl PipelineInput {
    pub fn new(image: SourceImage, target: ObservationFrame) -> Self {
        Self {
            image,
            target,
            psf: None,
            background: None,
            background_position: None,
            absolute_magnitude: None,
        }
    }

    pub fn with_psf(mut self, psf: PsfModel) -> Self {
        self.psf = Some(psf);
        self
    }

    pub fn with_background(mut self, background: Array2<f64>) -> Self {
        self.background = Some(background);
        self
    }

    pub fn with_background_position(mut self, top: usize, left: usize) -> Self {
        self.background_position = Some((top, left));
        self
    }

    pub fn with_absolute_magnitude(mut self, magnitude: f64) -> Self {
        self.absolute_magnitude = Some(magnitude);
        self
    }
}

/// Intermediate grids, one per stage that ran.
#[derive(Debug, Clone, Default)]
pub struct StageSnapshots {
    pub cutout: Option<Array2<f64>>,
    /// After zoom and dimming
    pub redshifted: Option<Array2<f64>>,
    pub evolved: Option<Array2<f64>>,
    pub convolved: Option<Array2<f64>>,
    pub noisy: Option<Array2<f64>>,
    pub with_background: Option<Array2<f64>>,
}

/// Output of [`ArtificialRedshift::run`].
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Full-frame image after the last stage, before cropping
    pub image: Array2<f64>,
    /// Central crop (equal to `image` when no crop was requested)
    pub cropped: Array2<f64>,
    /// Arcsec per pixel of the output
    pub pixel_scale: f64,
    pub redshift: f64,
    pub transform: RedshiftTransform,
    pub evolution_factor: Option<f64>,
    /// Source mask from the cutout stage
    pub source_mask: Option<Array2<bool>>,
    pub snapshots: StageSnapshots,
    pub provenance: Provenance,
}

/// Runs the artificial-redshift stages configured in [`PipelineConfig`].
#[derive(Debug, Clone, Default)]
pub struct ArtificialRedshift {
    config: PipelineConfig,
}

impl ArtificialRedshift {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn stage_seed(&self, stream: u64) -> u64 {
        self.config.seed.wrapping_add(stream)
    }

    /// Redshift `input.image` to `input.target`.
    pub fn run(&self, input: &PipelineInput) -> Result<PipelineResult> {
        let config = &self.config;
        let source = &input.image;
        let target = &input.target;
        let start = Instant::now();

        log::info!(
            "Artificial redshift z={} -> z={} ({:?} px at {} arcsec/px)",
            source.redshift(),
            target.redshift,
            source.dim(),
            source.pixel_scale()
        );

        let mut provenance = Provenance::new();
        let mut snapshots = StageSnapshots::default();

        let mut source_mask = None;
        let working = if config.make_cutout {
            log::info!("Stage: central source cutout");
            let segmentation = central_segmentation(&source.data(), &config.segmentation)?;
            let cutout = apply_mask(&source.data(), &segmentation.mask.view());
            provenance.add_history(format!(
                "Central source cutout above {:.4e} ({} px)",
                segmentation.threshold,
                segmentation.mask.iter().filter(|&&m| m).count()
            ));
            source_mask = Some(segmentation.mask);
            snapshots.cutout = Some(cutout.clone());
            cutout
        } else {
            source.data().to_owned()
        };

        log::info!("Stage: rebinning and dimming");
        let resampler = RedshiftResampler::new(config.cosmology.clone()).with_options(
            ResampleOptions {
                interpolation: config.interpolation,
                grid: if config.fixed_grid {
                    GridMode::Fixed
                } else {
                    GridMode::Resize
                },
                flux: FluxMode::ConserveFlux,
                dimming_law: DimmingLaw::LuminosityDistance,
                apply_rebinning: config.rebinning,
                apply_dimming: config.dimming,
                single_pass: true,
                size_evolution: config.size_correction.then_some(config.size_evolution),
                ..Default::default()
            },
        );
        let output_pixel_scale = if config.rebinning {
            target.pixel_scale
        } else {
            source.pixel_scale()
        };
        let redshifted = resampler.resample(
            &SourceImage::new(working, source.pixel_scale(), source.redshift())?,
            target.redshift,
            output_pixel_scale,
        )?;
        let transform = redshifted.transform;
        let mut image = redshifted.data;

        if config.rebinning {
            provenance.rebin =
                Some(transform.scale_factor * (source.pixel_scale() / target.pixel_scale));
        }
        if config.dimming {
            provenance.dimming_factor = Some(transform.dimming_factor);
        }
        provenance.add_history(format!(
            "From z = {} to z = {}",
            source.redshift(),
            target.redshift
        ));
        snapshots.redshifted = Some(image.clone());

        let mut evolution_factor = None;
        if config.evolution {
            log::info!("Stage: luminosity evolution");
            let factor = config
                .evolution_model
                .factor(target.redshift, input.absolute_magnitude)?;
            image.mapv_inplace(|v| v * factor);
            evolution_factor = Some(factor);
            provenance.evolution_factor = Some(factor);
            provenance.evolution_alpha = Some(config.evolution_model.alpha());
            snapshots.evolved = Some(image.clone());
        }

        if config.convolve_with_psf {
            log::info!("Stage: PSF convolution");
            let psf = input
                .psf
                .as_ref()
                .ok_or(AreiaError::MissingInput("PSF for convolution"))?;
            let kernel = psf.kernel()?;
            image = convolve2d(
                &image.view(),
                &kernel.view(),
                Some(ConvolveOptions {
                    mode: ConvolveMode::Same,
                }),
            );
            provenance.add_history(format!("Convolved with {:?} PSF", kernel.dim()));
            snapshots.convolved = Some(image.clone());
        }

        if config.shot_noise {
            log::info!("Stage: shot noise");
            let exposure = target.exposure_secs()?;
            image = apply_shot_noise(
                &image.view(),
                exposure,
                config.shot_noise_model,
                self.stage_seed(SHOT_NOISE_STREAM),
            )?;
            provenance.add_history(format!(
                "{:?} shot noise for {exposure} s",
                config.shot_noise_model
            ));
            snapshots.noisy = Some(image.clone());
        }

        if config.add_background {
            log::info!("Stage: sky background");
            let sky = match &input.background {
                Some(background) => {
                    let placement = if config.bg_centered {
                        Placement::Centered
                    } else if let Some((top, left)) = input.background_position {
                        Placement::At(top, left)
                    } else {
                        Placement::Random
                    };
                    let section = self.background_section(
                        &background.view(),
                        image.dim(),
                        placement,
                    )?;
                    provenance.add_history(format!("Added background section ({placement:?})"));
                    section
                }
                None => {
                    let sky = self.generated_sky(&image.view())?;
                    provenance.add_history("Added generated Gaussian background");
                    sky
                }
            };
            image += &sky;
            snapshots.with_background = Some(image.clone());
        }

        let cropped = match config.output_size {
            Some(size) => crop_center(&image.view(), size, size),
            None => image.clone(),
        };

        log::debug!(
            "Pipeline finished in {:?}; output {:?}, crop {:?}",
            start.elapsed(),
            image.dim(),
            cropped.dim()
        );

        Ok(PipelineResult {
            image,
            cropped,
            pixel_scale: output_pixel_scale,
            redshift: target.redshift,
            transform,
            evolution_factor,
            source_mask,
            snapshots,
            provenance,
        })
    }

    /// Cut a section of `shape` out of a supplied sky field.
    fn background_section<'a>(
        &self,
        background: &'a ArrayView2<'a, f64>,
        shape: (usize, usize),
        placement: Placement,
    ) -> Result<Array2<f64>> {
        let (rows, cols) = shape;
        let (bg_rows, bg_cols) = background.dim();
        if rows > bg_rows || cols > bg_cols {
            return Err(AreiaError::BackgroundTooSmall {
                background: (bg_rows, bg_cols),
                image: (rows, cols),
            });
        }

        let (top, left) = match placement {
            Placement::Centered => (
                centered_offset(bg_rows, rows),
                centered_offset(bg_cols, cols),
            ),
            Placement::At(top, left) => (top, left),
            Placement::Random => {
                let mut rng = StdRng::seed_from_u64(self.stage_seed(PLACEMENT_STREAM));
                (
                    rng.gen_range(0..=bg_rows - rows),
                    rng.gen_range(0..=bg_cols - cols),
                )
            }
        };

        log::debug!("Background section {rows}x{cols} at ({top}, {left}) of {bg_rows}x{bg_cols}");
        Ok(extract_section(background, top, left, rows, cols)?.to_owned())
    }

    /// Gaussian sky matching the clipped noise of the image as redshifted so far.
    fn generated_sky(&self, image: &ArrayView2<f64>) -> Result<Array2<f64>> {
        let seg = &self.config.segmentation;
        let stats = image_background_stats(image, None, seg.clip_sigma, seg.clip_iters)
            .ok_or_else(|| {
                AreiaError::InvalidParameter(
                    "no finite background pixels to measure the sky noise from".to_string(),
                )
            })?;

        log::debug!(
            "Generated sky: std {:.4e} from {} background pixels",
            stats.std_dev,
            stats.count
        );
        Ok(gaussian_sky(
            image.dim(),
            stats.std_dev,
            self.stage_seed(SKY_STREAM),
        )?)
    }
}

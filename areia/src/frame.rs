//! Images and observation setups at a given redshift.

use std::time::Duration;

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use shared::image_proc::GridError;

use crate::cosmology::check_redshift;
use crate::error::{AreiaError, Result};
use crate::transform::RedshiftTransform;

/// Pixel scales must be finite and positive (arcsec/pixel).
pub(crate) fn check_pixel_scale(pixel_scale: f64) -> Result<()> {
    if !pixel_scale.is_finite() || pixel_scale <= 0.0 {
        return Err(AreiaError::InvalidParameter(format!(
            "pixel scale must be finite and positive, got {pixel_scale} arcsec/px"
        )));
    }
    Ok(())
}

/// A galaxy image observed at a known redshift.
///
/// The grid holds flux density per pixel. Construction validates the grid,
/// pixel scale and redshift; the image is read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    data: Array2<f64>,
    pixel_scale: f64,
    redshift: f64,
    band: Option<String>,
}

impl SourceImage {
    /// Wrap an existing grid.
    ///
    /// # Arguments
    /// * `data` - Flux-density samples, indexed `[row, col]`
    /// * `pixel_scale` - Angular size of one pixel in arcsec
    /// * `redshift` - Redshift at which the image was observed
    pub fn new(data: Array2<f64>, pixel_scale: f64, redshift: f64) -> Result<Self> {
        let (rows, cols) = data.dim();
        if rows == 0 || cols == 0 {
            return Err(GridError::Empty { rows, cols }.into());
        }
        check_pixel_scale(pixel_scale)?;
        check_redshift(redshift)?;

        Ok(Self {
            data,
            pixel_scale,
            redshift,
            band: None,
        })
    }

    /// Build from nested rows; every row must have the same length.
    pub fn from_rows(rows: &[Vec<f64>], pixel_scale: f64, redshift: f64) -> Result<Self> {
        let expected = rows.first().map_or(0, Vec::len);
        if let Some((row, actual)) = rows
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|&(_, len)| len != expected)
        {
            return Err(GridError::RaggedRow {
                row,
                expected,
                actual,
            }
            .into());
        }

        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        Self::from_shape_vec((rows.len(), expected), flat, pixel_scale, redshift)
    }

    /// Build from row-major samples and an explicit `(rows, cols)` shape.
    pub fn from_shape_vec(
        shape: (usize, usize),
        data: Vec<f64>,
        pixel_scale: f64,
        redshift: f64,
    ) -> Result<Self> {
        let (rows, cols) = shape;
        if rows * cols != data.len() {
            return Err(GridError::ShapeMismatch {
                rows,
                cols,
                actual: data.len(),
            }
            .into());
        }

        let actual = data.len();
        let grid = Array2::from_shape_vec(shape, data).map_err(|_| GridError::ShapeMismatch {
            rows,
            cols,
            actual,
        })?;
        Self::new(grid, pixel_scale, redshift)
    }

    /// Attach the photometric band the image was taken in.
    pub fn with_band(mut self, band: impl Into<String>) -> Self {
        self.band = Some(band.into());
        self
    }

    pub fn data(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn into_data(self) -> Array2<f64> {
        self.data
    }

    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Arcsec per pixel
    pub fn pixel_scale(&self) -> f64 {
        self.pixel_scale
    }

    pub fn redshift(&self) -> f64 {
        self.redshift
    }

    pub fn band(&self) -> Option<&str> {
        self.band.as_deref()
    }

    /// Sum of all pixel values
    pub fn total_flux(&self) -> f64 {
        self.data.sum()
    }
}

/// Instrument setup for an observation at one redshift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationFrame {
    pub redshift: f64,
    /// Arcsec per pixel
    pub pixel_scale: f64,
    pub exposure: Duration,
}

impl ObservationFrame {
    pub fn new(redshift: f64, pixel_scale: f64, exposure: Duration) -> Result<Self> {
        check_redshift(redshift)?;
        check_pixel_scale(pixel_scale)?;
        Ok(Self {
            redshift,
            pixel_scale,
            exposure,
        })
    }

    /// Exposure in seconds, rejecting zero-length exposures.
    pub fn exposure_secs(&self) -> Result<f64> {
        let secs = self.exposure.as_secs_f64();
        if secs <= 0.0 {
            return Err(AreiaError::InvalidParameter(format!(
                "exposure must be positive, got {secs} s"
            )));
        }
        Ok(secs)
    }
}

/// A resampled image at the target redshift.
#[derive(Debug, Clone)]
pub struct OutputImage {
    pub data: Array2<f64>,
    /// Arcsec per pixel
    pub pixel_scale: f64,
    pub redshift: f64,
    /// Factors that produced this image
    pub transform: RedshiftTransform,
}

impl OutputImage {
    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn total_flux(&self) -> f64 {
        self.data.sum()
    }

    /// Reinterpret as a source image, e.g. to resample it again.
    pub fn into_source(self) -> Result<SourceImage> {
        SourceImage::new(self.data, self.pixel_scale, self.redshift)
    }
}

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algo::{image_background_stats, ClippedStats};

use super::thresholding::{apply_threshold, component_stats, connected_components, Connectivity};

/// Errors from source segmentation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SegmentationError {
    #[error("image has no finite pixels to estimate the background from")]
    NoFiniteData,
    #[error("no source with at least {min_pixels} pixels above {threshold}")]
    NoSource { threshold: f64, min_pixels: usize },
}

/// Parameters of the central-source segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Detection threshold above the background median, in background sigmas
    pub nsigma: f64,
    /// Smallest component kept as a source
    pub min_pixels: usize,
    /// Clipping limit for the background estimate
    pub clip_sigma: f64,
    pub clip_iters: usize,
    pub connectivity: Connectivity,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            nsigma: 1.5,
            min_pixels: 5,
            clip_sigma: 3.0,
            clip_iters: 5,
            connectivity: Connectivity::Eight,
        }
    }
}

/// Result of [`central_segmentation`].
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// True for pixels belonging to the central source
    pub mask: Array2<bool>,
    pub background: ClippedStats,
    pub threshold: f64,
}

/// Segments the source closest to the image centre.
///
/// 1. Estimates the sky with sigma-clipped statistics over the whole frame
/// 2. Thresholds at `median + nsigma * std_dev`
/// 3. Labels connected regions and drops those below `min_pixels`
/// 4. Keeps the region covering the centre pixel, or else the one whose
///    centroid is nearest to the centre
pub fn central_segmentation(
    image: &ArrayView2<f64>,
    config: &SegmentationConfig,
) -> Result<Segmentation, SegmentationError> {
    let background = image_background_stats(image, None, config.clip_sigma, config.clip_iters)
        .ok_or(SegmentationError::NoFiniteData)?;
    let threshold = background.median + config.nsigma * background.std_dev;

    let binary = apply_threshold(image, threshold);
    let (labels, count) = connected_components(&binary.view(), config.connectivity);

    let candidates: Vec<_> = component_stats(&labels.view(), count)
        .into_iter()
        .filter(|c| c.pixel_count >= config.min_pixels)
        .collect();

    let (rows, cols) = image.dim();
    let center = ((rows as f64 - 1.0) / 2.0, (cols as f64 - 1.0) / 2.0);
    let center_label = labels[[rows / 2, cols / 2]];

    let chosen = candidates
        .iter()
        .find(|c| c.label == center_label)
        .or_else(|| {
            candidates.iter().min_by(|a, b| {
                let da = (a.centroid_row - center.0).hypot(a.centroid_col - center.1);
                let db = (b.centroid_row - center.0).hypot(b.centroid_col - center.1);
                da.total_cmp(&db)
            })
        })
        .ok_or(SegmentationError::NoSource {
            threshold,
            min_pixels: config.min_pixels,
        })?;

    log::debug!(
        "Central segmentation: threshold={threshold:.4e}, components={count}, \
         kept label {} ({} px)",
        chosen.label,
        chosen.pixel_count
    );

    let label = chosen.label;
    Ok(Segmentation {
        mask: labels.mapv(|l| l == label),
        background,
        threshold,
    })
}

/// Zero every pixel outside `mask`.
pub fn apply_mask(image: &ArrayView2<f64>, mask: &ArrayView2<bool>) -> Array2<f64> {
    let mut output = image.to_owned();
    output.zip_mut_with(mask, |value, &keep| {
        if !keep {
            *value = 0.0;
        }
    });
    output
}

//! Robust statistics for sky background estimation

use ndarray::ArrayView2;

/// Summary statistics of the pixels that survived clipping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClippedStats {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    /// Number of pixels left after the final iteration
    pub count: usize,
}

/// Calculate median of a slice of f64 values
///
/// NaN values are filtered out; infinities are kept. For even-length data,
/// returns the average of the two middle values.
///
/// # Returns
///
/// * `Ok(median)` - The median value
/// * `Err(message)` - If no valid values remain after filtering NaN
pub fn median(values: &[f64]) -> Result<f64, String> {
    let mut valid_values: Vec<f64> = values.iter().filter(|v| !v.is_nan()).copied().collect();

    if valid_values.is_empty() {
        return Err(format!(
            "Insufficient data points to compute median: {} total values, 0 valid (all NaN)",
            values.len()
        ));
    }

    valid_values.sort_by(f64::total_cmp);

    let median_value = if valid_values.len() % 2 == 0 {
        let mid = valid_values.len() / 2;
        (valid_values[mid - 1] + valid_values[mid]) / 2.0
    } else {
        valid_values[valid_values.len() / 2]
    };

    Ok(median_value)
}

fn mean_and_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Iterative sigma clipping about the median.
///
/// Each iteration drops values further than `sigma * std_dev` from the
/// median of the remaining values, stopping when nothing is rejected or after
/// `max_iters` passes. Non-finite values are ignored from the start.
///
/// Returns None when no finite values are available.
pub fn sigma_clipped_stats(values: &[f64], sigma: f64, max_iters: usize) -> Option<ClippedStats> {
    let mut kept: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if kept.is_empty() {
        return None;
    }

    for _ in 0..max_iters {
        let center = median(&kept).ok()?;
        let (_, std_dev) = mean_and_std(&kept);
        let limit = sigma * std_dev;

        let before = kept.len();
        kept.retain(|v| (v - center).abs() <= limit);

        if kept.is_empty() {
            return None;
        }
        if kept.len() == before {
            break;
        }
    }

    let (mean, std_dev) = mean_and_std(&kept);
    Some(ClippedStats {
        mean,
        median: median(&kept).ok()?,
        std_dev,
        count: kept.len(),
    })
}

/// Sigma-clipped statistics of an image, optionally skipping masked pixels.
///
/// `mask` pixels that are `true` are excluded (typically a source
/// segmentation). The mask must have the image's shape.
pub fn image_background_stats(
    image: &ArrayView2<f64>,
    mask: Option<&ArrayView2<bool>>,
    sigma: f64,
    max_iters: usize,
) -> Option<ClippedStats> {
    let values: Vec<f64> = match mask {
        Some(mask) => image
            .iter()
            .zip(mask.iter())
            .filter(|(_, &masked)| !masked)
            .map(|(&v, _)| v)
            .collect(),
        None => image.iter().copied().collect(),
    };

    sigma_clipped_stats(&values, sigma, max_iters)
}

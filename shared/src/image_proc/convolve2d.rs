//! 2D convolution for applying point spread functions
//!
//! Provides true convolution (the kernel is flipped) with either `Valid` or
//! zero-padded `Same` edge handling, plus Gaussian kernel construction and
//! unit-sum kernel normalisation.

use ndarray::{Array2, ArrayView2};
use thiserror::Error;

use crate::algo::fill_rows_in_parallel;

/// Errors raised when preparing a convolution kernel
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvolveError {
    #[error("kernel dimensions must be odd, got {rows}x{cols}")]
    EvenKernel { rows: usize, cols: usize },
    #[error("kernel has no pixels")]
    EmptyKernel,
    #[error("kernel sum is {0}; cannot normalise")]
    DegenerateSum(f64),
    #[error("gaussian width must be finite and positive, got {0}")]
    InvalidWidth(f64),
}

/// Options for controlling the convolution operation
#[derive(Debug, Clone, Copy)]
pub struct ConvolveOptions {
    /// How to handle edges
    pub mode: ConvolveMode,
}

/// Mode for handling edges in convolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConvolveMode {
    /// Only compute output where input and kernel fully overlap
    Valid,
    /// Use zero-padding to maintain input size
    Same,
}

impl Default for ConvolveOptions {
    fn default() -> Self {
        Self {
            mode: ConvolveMode::Valid,
        }
    }
}

/// Perform 2D convolution of an image with a kernel
///
/// Output rows are computed in parallel.
///
/// # Arguments
/// * `image` - Input image as a 2D array
/// * `kernel` - Convolution kernel
/// * `options` - Optional configuration for the convolution
///
/// # Returns
/// * Result of the convolution as a 2D array
pub fn convolve2d(
    image: &ArrayView2<f64>,
    kernel: &ArrayView2<f64>,
    options: Option<ConvolveOptions>,
) -> Array2<f64> {
    let options = options.unwrap_or_default();

    let (img_rows, img_cols) = image.dim();
    let (ker_rows, ker_cols) = kernel.dim();

    if ker_rows == 0 || ker_cols == 0 {
        return Array2::zeros((0, 0));
    }

    let (out_rows, out_cols) = match options.mode {
        ConvolveMode::Valid => {
            if img_rows < ker_rows || img_cols < ker_cols {
                return Array2::zeros((0, 0));
            }
            (img_rows - ker_rows + 1, img_cols - ker_cols + 1)
        }
        ConvolveMode::Same => (img_rows, img_cols),
    };

    if out_rows == 0 || out_cols == 0 {
        return Array2::zeros((0, 0));
    }

    // Offset of the kernel anchor; Valid anchors at the far corner
    let (anchor_row, anchor_col) = match options.mode {
        ConvolveMode::Valid => (ker_rows as isize - 1, ker_cols as isize - 1),
        ConvolveMode::Same => (ker_rows as isize / 2, ker_cols as isize / 2),
    };

    fill_rows_in_parallel((out_rows, out_cols), |i, mut out_row| {
        for (j, value) in out_row.iter_mut().enumerate() {
            let mut sum = 0.0;

            for ki in 0..ker_rows {
                let img_row = i as isize + anchor_row - ki as isize;
                if img_row < 0 || img_row >= img_rows as isize {
                    continue;
                }

                for kj in 0..ker_cols {
                    let img_col = j as isize + anchor_col - kj as isize;
                    if img_col < 0 || img_col >= img_cols as isize {
                        continue;
                    }

                    sum += image[[img_row as usize, img_col as usize]] * kernel[[ki, kj]];
                }
            }

            *value = sum;
        }
    })
}

/// Create a Gaussian kernel with specified size and sigma
///
/// # Arguments
/// * `size` - Size of the kernel (must be odd)
/// * `sigma` - Standard deviation of the Gaussian
///
/// # Returns
/// * Unit-sum Gaussian kernel as a 2D array
pub fn gaussian_kernel(size: usize, sigma: f64) -> Result<Array2<f64>, ConvolveError> {
    if size % 2 == 0 {
        return Err(ConvolveError::EvenKernel {
            rows: size,
            cols: size,
        });
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(ConvolveError::InvalidWidth(sigma));
    }

    let center = size as isize / 2;
    let kernel = Array2::from_shape_fn((size, size), |(i, j)| {
        let x = j as isize - center;
        let y = i as isize - center;
        (-((x * x + y * y) as f64) / (2.0 * sigma * sigma)).exp()
    });

    normalize_kernel(&kernel.view())
}

/// Gaussian kernel from a FWHM in pixels, sized to cover +/- 4 sigma.
pub fn gaussian_kernel_from_fwhm(fwhm: f64) -> Result<Array2<f64>, ConvolveError> {
    if !fwhm.is_finite() || fwhm <= 0.0 {
        return Err(ConvolveError::InvalidWidth(fwhm));
    }

    let sigma = fwhm / (2.0 * (2.0 * std::f64::consts::LN_2).sqrt());
    let half = (4.0 * sigma).ceil() as usize;
    gaussian_kernel(2 * half + 1, sigma)
}

/// Validate a kernel and scale it to unit sum.
pub fn normalize_kernel(kernel: &ArrayView2<f64>) -> Result<Array2<f64>, ConvolveError> {
    let (rows, cols) = kernel.dim();
    if rows == 0 || cols == 0 {
        return Err(ConvolveError::EmptyKernel);
    }
    if rows % 2 == 0 || cols % 2 == 0 {
        return Err(ConvolveError::EvenKernel { rows, cols });
    }

    let sum = kernel.sum();
    if !sum.is_normal() {
        return Err(ConvolveError::DegenerateSum(sum));
    }

    Ok(kernel.mapv(|v| v / sum))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_convolve2d_valid() {
        let image = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];

        let kernel = array![[1.0, 0.0], [0.0, 1.0]];

        let expected = array![[1.0 + 5.0, 2.0 + 6.0], [4.0 + 8.0, 5.0 + 9.0]];

        let result = convolve2d(
            &image.view(),
            &kernel.view(),
            Some(ConvolveOptions {
                mode: ConvolveMode::Valid,
            }),
        );

        assert_eq!(result, expected);
    }

    #[test]
    fn test_convolve2d_same_flips_kernel() {
        let mut image = Array2::<f64>::zeros((5, 5));
        image[[2, 2]] = 1.0;

        // Asymmetric kernel: an impulse reproduces the kernel itself
        let kernel = array![[0.0, 1.0, 0.0], [0.0, 0.0, 2.0], [0.0, 0.0, 0.0]];

        let result = convolve2d(
            &image.view(),
            &kernel.view(),
            Some(ConvolveOptions {
                mode: ConvolveMode::Same,
            }),
        );

        assert_eq!(result.dim(), (5, 5));
        assert_eq!(result[[1, 2]], 1.0);
        assert_eq!(result[[2, 3]], 2.0);
        assert_eq!(result.sum(), 3.0);
    }

    #[test]
    fn test_same_mode_conserves_interior_flux() {
        let mut image = Array2::<f64>::zeros((31, 31));
        image[[15, 15]] = 10.0;
        image[[12, 17]] = 4.0;

        let kernel = gaussian_kernel(7, 1.2).unwrap();
        let result = convolve2d(
            &image.view(),
            &kernel.view(),
            Some(ConvolveOptions {
                mode: ConvolveMode::Same,
            }),
        );

        assert_relative_eq!(result.sum(), 14.0, max_relative = 1e-12);
    }

    #[test]
    fn test_gaussian_kernel() {
        let kernel = gaussian_kernel(3, 1.0).unwrap();

        // Sum should be close to 1.0
        let sum: f64 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-10);

        // Center should have highest value
        for ((i, j), &v) in kernel.indexed_iter() {
            if (i, j) != (1, 1) {
                assert!(kernel[[1, 1]] > v);
            }
        }
    }

    #[test]
    fn test_gaussian_kernel_from_fwhm() {
        let kernel = gaussian_kernel_from_fwhm(2.3548).unwrap();

        // sigma ~= 1 -> half width 4
        assert_eq!(kernel.dim(), (9, 9));
        assert_relative_eq!(kernel.sum(), 1.0, epsilon = 1e-12);
        assert!(gaussian_kernel_from_fwhm(0.0).is_err());
    }

    #[test]
    fn test_normalize_kernel_rejects_bad_kernels() {
        assert_eq!(
            normalize_kernel(&Array2::<f64>::ones((2, 3)).view()),
            Err(ConvolveError::EvenKernel { rows: 2, cols: 3 })
        );
        assert!(matches!(
            normalize_kernel(&array![[1.0, -1.0, 0.0]].view()),
            Err(ConvolveError::DegenerateSum(_))
        ));
        assert_eq!(
            normalize_kernel(&Array2::<f64>::zeros((0, 0)).view()),
            Err(ConvolveError::EmptyKernel)
        );
    }
}

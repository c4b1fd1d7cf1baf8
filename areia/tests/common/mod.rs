//! Synthetic galaxies shared by the integration tests

#![allow(dead_code)]

use ndarray::Array2;
use shared::image_proc::noise::gaussian_sky;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Sérsic profile `I_e exp(-b_n ((r / r_e)^(1/n) - 1))` centred on the grid.
pub fn sersic_galaxy(size: usize, r_eff: f64, n: f64, intensity: f64) -> Array2<f64> {
    let b_n = 2.0 * n - 1.0 / 3.0 + 4.0 / (405.0 * n);
    let c = (size as f64 - 1.0) / 2.0;

    Array2::from_shape_fn((size, size), |(y, x)| {
        let r = (y as f64 - c).hypot(x as f64 - c);
        intensity * (-b_n * ((r / r_eff).powf(1.0 / n) - 1.0)).exp()
    })
}

/// Circular Gaussian centred at `(row, col)`.
pub fn gaussian_blob(
    shape: (usize, usize),
    center: (f64, f64),
    sigma: f64,
    peak: f64,
) -> Array2<f64> {
    Array2::from_shape_fn(shape, |(y, x)| {
        let r2 = (y as f64 - center.0).powi(2) + (x as f64 - center.1).powi(2);
        peak * (-r2 / (2.0 * sigma * sigma)).exp()
    })
}

/// Exponential disk plus a Gaussian sky of standard deviation `sky_std`.
pub fn observed_galaxy(size: usize, sky_std: f64, seed: u64) -> Array2<f64> {
    let galaxy = sersic_galaxy(size, 8.0, 1.0, 50.0);
    let sky = gaussian_sky((size, size), sky_std, seed).unwrap();
    galaxy + sky
}

/// RMS radius about the grid centre, weighted by positive pixels.
pub fn rms_radius(image: &Array2<f64>) -> f64 {
    let (rows, cols) = image.dim();
    let c = ((rows as f64 - 1.0) / 2.0, (cols as f64 - 1.0) / 2.0);

    let (mut weighted, mut total) = (0.0, 0.0);
    for ((y, x), &v) in image.indexed_iter() {
        if v > 0.0 {
            weighted += v * ((y as f64 - c.0).powi(2) + (x as f64 - c.1).powi(2));
            total += v;
        }
    }
    (weighted / total).sqrt()
}

//! Redshift a synthetic Sérsic galaxy from z = 0.05 to several targets.
//!
//! Run with `RUST_LOG=debug cargo run --example redshift_galaxy` to see the
//! factors computed at each stage.

use std::path::PathBuf;
use std::time::Duration;

use areia::{
    resample, ArtificialRedshift, CosmologyModel, ObservationFrame, PipelineConfig,
    PipelineInput, PsfModel, SourceImage,
};
use ndarray::Array2;
use shared::image_proc::noise::gaussian_sky;

const SIZE: usize = 201;
const PIXEL_SCALE: f64 = 0.396;
const SOURCE_Z: f64 = 0.05;

fn sersic(size: usize, r_eff: f64, n: f64, intensity: f64) -> Array2<f64> {
    let b_n = 2.0 * n - 1.0 / 3.0 + 4.0 / (405.0 * n);
    let c = (size as f64 - 1.0) / 2.0;
    Array2::from_shape_fn((size, size), |(y, x)| {
        let r = (y as f64 - c).hypot(x as f64 - c);
        intensity * (-b_n * ((r / r_eff).powf(1.0 / n) - 1.0)).exp()
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let cosmology = CosmologyModel::default();
    let galaxy = sersic(SIZE, 12.0, 2.0, 20.0) + gaussian_sky((SIZE, SIZE), 0.3, 1)?;
    let image = SourceImage::new(galaxy, PIXEL_SCALE, SOURCE_Z)?.with_band("r");

    println!("Core resampler (Tolman dimming), source z = {SOURCE_Z}");
    println!("{:>6} {:>10} {:>12} {:>12}", "z_t", "scale", "dimming", "flux ratio");
    for target_z in [0.1, 0.25, 0.5, 1.0, 2.0] {
        let out = resample(&image, target_z, &cosmology, PIXEL_SCALE)?;
        println!(
            "{:>6.2} {:>10.5} {:>12.5e} {:>12.5e}",
            target_z,
            out.transform.scale_factor,
            out.transform.dimming_factor,
            out.total_flux() / image.total_flux()
        );
    }

    let target = ObservationFrame::new(1.0, 0.03, Duration::from_secs(2028))?;
    let input = PipelineInput::new(image, target)
        .with_psf(PsfModel::Gaussian { fwhm_px: 3.0 })
        .with_absolute_magnitude(-21.5);

    let result = ArtificialRedshift::new(PipelineConfig::default().with_seed(2024)).run(&input)?;

    println!("\nFull pipeline to z = {} at {} arcsec/px", result.redshift, result.pixel_scale);
    println!("Output {:?}, crop {:?}", result.image.dim(), result.cropped.dim());
    for card in result.provenance.cards() {
        println!("{:<8}= {}", card.keyword, card.value);
    }

    let path = PathBuf::from("redshift_galaxy_provenance.json");
    result.provenance.write_json(&path)?;
    println!("Provenance written to {}", path.display());

    Ok(())
}

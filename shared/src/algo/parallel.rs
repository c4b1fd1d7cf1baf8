//! Parallel processing utilities for image and array operations
//!
//! Row-chunked helpers built on rayon. Randomised work gets one RNG per
//! chunk seeded from a base seed plus the chunk index, so a fixed seed gives
//! the same array regardless of how many threads run.

use ndarray::{Array2, ArrayViewMut1, ArrayViewMut2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

/// Default number of rows handed to each rayon task.
pub const DEFAULT_CHUNK_ROWS: usize = 64;

/// Process an Array2 in parallel chunks with deterministic seeding
///
/// Each chunk of `chunk_size` rows gets its own `StdRng` seeded with
/// `seed + chunk_index`. The closure also receives the index of the first
/// row of the chunk so it can address companion arrays.
///
/// # Arguments
/// * `array` - The 2D array to process
/// * `seed` - Base seed for random number generation
/// * `chunk_size` - Rows per chunk, `DEFAULT_CHUNK_ROWS` if None
/// * `processor` - Closure called as `(chunk, first_row, rng)`
///
/// # Returns
/// The processed array
pub fn process_array_in_parallel_chunks<F>(
    mut array: Array2<f64>,
    seed: u64,
    chunk_size: Option<usize>,
    processor: F,
) -> Array2<f64>
where
    F: Fn(&mut ArrayViewMut2<f64>, usize, &mut StdRng) + Send + Sync,
{
    let chunk_size = chunk_size.unwrap_or(DEFAULT_CHUNK_ROWS).max(1);

    array
        .axis_chunks_iter_mut(Axis(0), chunk_size)
        .into_par_iter()
        .enumerate()
        .for_each(|(chunk_idx, mut chunk)| {
            let chunk_seed = seed.wrapping_add(chunk_idx as u64);
            let mut rng = StdRng::seed_from_u64(chunk_seed);

            processor(&mut chunk, chunk_idx * chunk_size, &mut rng);
        });

    array
}

/// Build a new array by computing each output row in parallel.
///
/// `row_fn` receives the row index and a mutable view of that row, which
/// starts zeroed. Rows are independent, so the result is deterministic.
pub fn fill_rows_in_parallel<F>(shape: (usize, usize), row_fn: F) -> Array2<f64>
where
    F: Fn(usize, ArrayViewMut1<f64>) + Send + Sync,
{
    let mut output = Array2::zeros(shape);

    output
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(row, row_view)| row_fn(row, row_view));

    output
}

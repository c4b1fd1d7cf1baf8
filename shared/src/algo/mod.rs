//! General-purpose numeric helpers
//!
//! Parallel row processing with deterministic seeding and the robust
//! statistics used for sky background estimation.

pub mod parallel;
pub mod stats;

pub use parallel::{fill_rows_in_parallel, process_array_in_parallel_chunks, DEFAULT_CHUNK_ROWS};
pub use stats::{image_background_stats, median, sigma_clipped_stats, ClippedStats};

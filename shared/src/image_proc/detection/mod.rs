//! Source detection for galaxy cutouts.
//!
//! - **thresholding**: binary masks and connected component labelling
//! - **segment**: selection of the central source from a labelled frame

pub mod segment;
pub mod thresholding;

pub use segment::{
    apply_mask, central_segmentation, Segmentation, SegmentationConfig, SegmentationError,
};
pub use thresholding::{
    apply_threshold, component_stats, connected_components, ComponentStats, Connectivity,
};

//! Image segmentation primitives for source extraction.
//!
//! Converts grayscale images into binary masks and labelled regions.
//!
//! # Connected Components
//! Two-pass connected component labelling with union-find. Groups connected
//! pixels into distinct objects with unique labels, using either 4- or
//! 8-connectivity.

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// Neighbourhood used when grouping pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// Horizontal and vertical neighbours only
    Four,
    /// Diagonal neighbours as well
    #[default]
    Eight,
}

/// Per-component summary produced by [`component_stats`].
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentStats {
    /// Label in the labelled image (starting at 1)
    pub label: usize,
    pub pixel_count: usize,
    /// Unweighted centroid row
    pub centroid_row: f64,
    /// Unweighted centroid column
    pub centroid_col: f64,
}

/// Binary mask of pixels strictly above `threshold`.
///
/// Non-finite pixels are never part of the mask.
pub fn apply_threshold(image: &ArrayView2<f64>, threshold: f64) -> Array2<bool> {
    image.mapv(|pixel| pixel.is_finite() && pixel > threshold)
}

/// Find the root label in a disjoint-set (union-find) data structure
fn find_root(labels: &mut [usize], label: usize) -> usize {
    let mut current = label;

    while current != labels[current] {
        // Path compression - make the parent point to the grandparent
        labels[current] = labels[labels[current]];
        current = labels[current];
    }

    current
}

/// Union two labels in a disjoint-set data structure
fn union_labels(labels: &mut [usize], label1: usize, label2: usize) -> usize {
    let root1 = find_root(labels, label1);
    let root2 = find_root(labels, label2);

    if root1 != root2 {
        // Make smaller label the parent (canonical form)
        if root1 < root2 {
            labels[root2] = root1;
            root1
        } else {
            labels[root1] = root2;
            root2
        }
    } else {
        root1
    }
}

/// Connected component labelling using a two-pass algorithm with union-find.
///
/// # Algorithm
/// 1. **First pass**: Scan image, assign preliminary labels, track equivalences
/// 2. **Union-find**: Resolve label equivalences with path compression
/// 3. **Second pass**: Relabel image with final consecutive labels
///
/// # Returns
/// `(labels, count)` where background pixels are 0 and objects are labelled
/// `1..=count` in raster order of their first pixel.
pub fn connected_components(
    mask: &ArrayView2<bool>,
    connectivity: Connectivity,
) -> (Array2<usize>, usize) {
    let (height, width) = mask.dim();
    let mut labels = Array2::zeros((height, width));
    let mut label_count = 0;

    // Label 0 is background
    let mut parent_table = vec![0];

    for i in 0..height {
        for j in 0..width {
            if !mask[[i, j]] {
                continue;
            }

            // Already-visited neighbours: up and left, plus the upper diagonals
            let mut neighbor_labels = Vec::with_capacity(4);
            if i > 0 && labels[[i - 1, j]] > 0 {
                neighbor_labels.push(labels[[i - 1, j]]);
            }
            if j > 0 && labels[[i, j - 1]] > 0 {
                neighbor_labels.push(labels[[i, j - 1]]);
            }
            if connectivity == Connectivity::Eight && i > 0 {
                if j > 0 && labels[[i - 1, j - 1]] > 0 {
                    neighbor_labels.push(labels[[i - 1, j - 1]]);
                }
                if j + 1 < width && labels[[i - 1, j + 1]] > 0 {
                    neighbor_labels.push(labels[[i - 1, j + 1]]);
                }
            }

            match neighbor_labels.iter().copied().min() {
                None => {
                    label_count += 1;
                    labels[[i, j]] = label_count;
                    parent_table.push(label_count);
                }
                Some(min_label) => {
                    labels[[i, j]] = min_label;
                    for &neighbor_label in &neighbor_labels {
                        if neighbor_label != min_label {
                            union_labels(&mut parent_table, min_label, neighbor_label);
                        }
                    }
                }
            }
        }
    }

    for i in 1..parent_table.len() {
        find_root(&mut parent_table, i);
    }

    // Map roots to consecutive labels
    let mut relabel_map = vec![0; parent_table.len()];
    let mut next_label = 1;

    for i in 1..parent_table.len() {
        let root = find_root(&mut parent_table, i);
        if relabel_map[root] == 0 {
            relabel_map[root] = next_label;
            next_label += 1;
        }
        relabel_map[i] = relabel_map[root];
    }

    labels.mapv_inplace(|label| relabel_map[label]);

    (labels, next_label - 1)
}

/// Pixel counts and centroids for labels `1..=count`.
pub fn component_stats(labels: &ArrayView2<usize>, count: usize) -> Vec<ComponentStats> {
    let mut sums = vec![(0usize, 0.0f64, 0.0f64); count + 1];

    for ((row, col), &label) in labels.indexed_iter() {
        if label > 0 && label <= count {
            let entry = &mut sums[label];
            entry.0 += 1;
            entry.1 += row as f64;
            entry.2 += col as f64;
        }
    }

    sums.into_iter()
        .enumerate()
        .skip(1)
        .filter(|(_, (n, _, _))| *n > 0)
        .map(|(label, (n, row_sum, col_sum))| ComponentStats {
            label,
            pixel_count: n,
            centroid_row: row_sum / n as f64,
            centroid_col: col_sum / n as f64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_apply_threshold_is_strict() {
        let image = array![[0.0, 1.0], [2.0, f64::NAN]];
        let mask = apply_threshold(&image.view(), 1.0);
        assert_eq!(mask, array![[false, false], [true, false]]);
    }

    #[test]
    fn test_four_vs_eight_connectivity() {
        let mask = array![
            [true, false, false],
            [false, true, false],
            [false, false, true]
        ];

        let (_, four) = connected_components(&mask.view(), Connectivity::Four);
        let (labels, eight) = connected_components(&mask.view(), Connectivity::Eight);

        assert_eq!(four, 3);
        assert_eq!(eight, 1);
        assert_eq!(labels[[2, 2]], 1);
    }

    #[test]
    fn test_u_shape_merges_into_one_label() {
        // Two arms that only join on the bottom row
        let mask = array![
            [true, false, true],
            [true, false, true],
            [true, true, true]
        ];

        let (labels, count) = connected_components(&mask.view(), Connectivity::Four);

        assert_eq!(count, 1);
        assert!(labels.iter().all(|&l| l <= 1));
        assert_eq!(labels[[0, 2]], 1);
    }

    #[test]
    fn test_labels_are_consecutive() {
        let mask = array![
            [true, false, true, false, true],
            [false, false, false, false, false],
            [true, true, false, false, true]
        ];

        let (labels, count) = connected_components(&mask.view(), Connectivity::Four);

        assert_eq!(count, 5);
        let max = labels.iter().copied().max().unwrap();
        assert_eq!(max, 5);
    }

    #[test]
    fn test_component_stats() {
        let mask = array![
            [true, true, false, false],
            [true, true, false, false],
            [false, false, false, true]
        ];
        let (labels, count) = connected_components(&mask.view(), Connectivity::Eight);
        let stats = component_stats(&labels.view(), count);

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].pixel_count, 4);
        assert_eq!(stats[0].centroid_row, 0.5);
        assert_eq!(stats[0].centroid_col, 0.5);
        assert_eq!(stats[1].pixel_count, 1);
        assert_eq!((stats[1].centroid_row, stats[1].centroid_col), (2.0, 3.0));
    }
}

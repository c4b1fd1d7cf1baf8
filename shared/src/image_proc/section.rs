//! Sub-array helpers: centred crops, bounded sections and offsets.

use ndarray::{s, Array2, ArrayView2};

use super::interpolate::GridError;

/// Top-left offset that centres an `inner` extent inside an `outer` one.
///
/// Uses the same convention along both axes: the inner centre pixel
/// `inner / 2` lands on the outer centre pixel `outer / 2`.
pub fn centered_offset(outer: usize, inner: usize) -> usize {
    (outer / 2).saturating_sub(inner / 2)
}

/// Borrow a `rows x cols` section whose top-left corner is `(top, left)`.
pub fn extract_section<'a>(
    image: &'a ArrayView2<'a, f64>,
    top: usize,
    left: usize,
    rows: usize,
    cols: usize,
) -> Result<ArrayView2<'a, f64>, GridError> {
    let (grid_rows, grid_cols) = image.dim();
    if top + rows > grid_rows || left + cols > grid_cols {
        return Err(GridError::SectionOutOfBounds {
            top,
            left,
            rows,
            cols,
            grid_rows,
            grid_cols,
        });
    }

    Ok(image.slice(s![top..top + rows, left..left + cols]))
}

/// Central crop to at most `rows x cols`.
///
/// An axis already shorter than the requested extent is left whole.
pub fn crop_center(image: &ArrayView2<f64>, rows: usize, cols: usize) -> Array2<f64> {
    let (height, width) = image.dim();
    let rows = rows.min(height);
    let cols = cols.min(width);

    let top = centered_offset(height, rows);
    let left = centered_offset(width, cols);

    image
        .slice(s![top..top + rows, left..left + cols])
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(rows: usize, cols: usize) -> Array2<f64> {
        Array2::from_shape_fn((rows, cols), |(r, c)| (r * cols + c) as f64)
    }

    #[test]
    fn test_centered_offset() {
        assert_eq!(centered_offset(10, 4), 3);
        assert_eq!(centered_offset(11, 5), 3);
        assert_eq!(centered_offset(4, 10), 0);
    }

    #[test]
    fn test_crop_center_odd() {
        let image = numbered(7, 7);
        let crop = crop_center(&image.view(), 3, 3);

        assert_eq!(crop.dim(), (3, 3));
        // Centre pixel preserved
        assert_eq!(crop[[1, 1]], image[[3, 3]]);
    }

    #[test]
    fn test_crop_center_keeps_short_axis() {
        let image = numbered(4, 12);
        let crop = crop_center(&image.view(), 6, 6);

        assert_eq!(crop.dim(), (4, 6));
        assert_eq!(crop[[0, 0]], image[[0, 3]]);
    }

    #[test]
    fn test_extract_section_bounds() {
        let image = numbered(5, 5);
        let view = image.view();

        let section = extract_section(&view, 1, 2, 3, 3).unwrap();
        assert_eq!(section[[0, 0]], image[[1, 2]]);
        assert_eq!(section.dim(), (3, 3));

        assert!(matches!(
            extract_section(&view, 3, 0, 3, 3),
            Err(GridError::SectionOutOfBounds { .. })
        ));
    }
}

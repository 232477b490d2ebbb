//! Clip a georeferenced grid to a bounding box

use crate::types::{BoundingBox, GeoTransform, GridF32, TerraError, TerraResult};

/// Clip a grid to the pixels intersecting `bounds`, returning the sub-grid
/// and the geotransform of its new top-left corner.
///
/// Only north-up rasters are supported; rotated geotransforms are an error.
pub fn clip_to_bounds(
    grid: &GridF32,
    transform: &GeoTransform,
    bounds: &BoundingBox,
) -> TerraResult<(GridF32, GeoTransform)> {
    if transform.rotation_x != 0.0
        || transform.rotation_y != 0.0
        || transform.pixel_width <= 0.0
        || transform.pixel_height >= 0.0
    {
        return Err(TerraError::Processing(
            "clip requires a north-up geotransform".to_string(),
        ));
    }
    if bounds.min_x >= bounds.max_x || bounds.min_y >= bounds.max_y {
        return Err(TerraError::Processing(format!(
            "degenerate bounding box: x [{}, {}], y [{}, {}]",
            bounds.min_x, bounds.max_x, bounds.min_y, bounds.max_y
        )));
    }

    let (rows, cols) = grid.dim();
    let px_w = transform.pixel_width;
    let px_h = transform.pixel_height; // negative for north-up rasters

    let col_start = ((bounds.min_x - transform.top_left_x) / px_w)
        .floor()
        .max(0.0) as usize;
    let col_end =
        (((bounds.max_x - transform.top_left_x) / px_w).ceil() as isize).min(cols as isize);
    let row_start = ((bounds.max_y - transform.top_left_y) / px_h)
        .floor()
        .max(0.0) as usize;
    let row_end =
        (((bounds.min_y - transform.top_left_y) / px_h).ceil() as isize).min(rows as isize);

    if col_end <= col_start as isize || row_end <= row_start as isize {
        return Err(TerraError::Processing(
            "bounding box does not intersect the raster".to_string(),
        ));
    }
    let (col_end, row_end) = (col_end as usize, row_end as usize);

    let clipped = grid
        .slice(ndarray::s![row_start..row_end, col_start..col_end])
        .to_owned();

    let (new_x, new_y) = transform.pixel_to_geo(row_start, col_start);
    let new_transform = GeoTransform {
        top_left_x: new_x,
        top_left_y: new_y,
        ..transform.clone()
    };

    log::debug!(
        "Clipped {}x{} raster to rows {}..{}, cols {}..{}",
        rows,
        cols,
        row_start,
        row_end,
        col_start,
        col_end
    );

    Ok((clipped, new_transform))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn test_grid() -> (GridF32, GeoTransform) {
        // 10x10, origin (100, 200), 10m pixels
        let grid = Array2::from_shape_fn((10, 10), |(r, c)| (r * 10 + c) as f32);
        let transform = GeoTransform::north_up(100.0, 200.0, 10.0, -10.0);
        (grid, transform)
    }

    #[test]
    fn test_clip_interior_window() {
        let (grid, transform) = test_grid();
        let bounds = BoundingBox {
            min_x: 120.0,
            max_x: 150.0,
            min_y: 150.0,
            max_y: 180.0,
        };

        let (clipped, new_transform) = clip_to_bounds(&grid, &transform, &bounds).unwrap();
        assert_eq!(clipped.dim(), (3, 3));
        // Rows 2..5, cols 2..5 of the source
        assert_eq!(clipped[[0, 0]], 22.0);
        assert_eq!(new_transform.top_left_x, 120.0);
        assert_eq!(new_transform.top_left_y, 180.0);
        assert_eq!(new_transform.pixel_width, 10.0);
    }

    #[test]
    fn test_clip_overflowing_box_is_trimmed() {
        let (grid, transform) = test_grid();
        let bounds = BoundingBox {
            min_x: 0.0,
            max_x: 10_000.0,
            min_y: 0.0,
            max_y: 10_000.0,
        };

        let (clipped, new_transform) = clip_to_bounds(&grid, &transform, &bounds).unwrap();
        assert_eq!(clipped.dim(), (10, 10));
        assert_eq!(new_transform.top_left_x, 100.0);
        assert_eq!(new_transform.top_left_y, 200.0);
    }

    #[test]
    fn test_clip_disjoint_box_is_error() {
        let (grid, transform) = test_grid();
        let bounds = BoundingBox {
            min_x: 1000.0,
            max_x: 1100.0,
            min_y: 150.0,
            max_y: 180.0,
        };
        assert!(clip_to_bounds(&grid, &transform, &bounds).is_err());
    }

    #[test]
    fn test_clip_rejects_rotated_transform() {
        let (grid, mut transform) = test_grid();
        transform.rotation_x = 0.5;
        let bounds = BoundingBox {
            min_x: 120.0,
            max_x: 150.0,
            min_y: 150.0,
            max_y: 180.0,
        };
        assert!(clip_to_bounds(&grid, &transform, &bounds).is_err());
    }
}

use crate::types::{AreaOfInterest, ExplorerError, ExplorerResult, GeoTransform, RasterGrid};
use ndarray::s;

// Guards pixel snapping against float round-off when an extent boundary
// falls exactly on a pixel edge.
const SNAP_EPS: f64 = 1e-9;

/// Clip a grid to the area of interest.
///
/// The output covers the largest whole-pixel window contained in the
/// intersection of the grid extent and the AOI bounding extent, in the
/// grid's original CRS. Pixel values are copied; the input grid is not
/// touched. Disjoint extents fail with `EmptyIntersection`.
///
/// Snapping is inward, so the output extent never exceeds the
/// intersection, and cropping an already-cropped grid with the same AOI
/// returns an identical grid.
pub fn crop(grid: &RasterGrid, aoi: &AreaOfInterest) -> ExplorerResult<RasterGrid> {
    let gt = &grid.transform;
    if gt.rotation_x != 0.0 || gt.rotation_y != 0.0 {
        return Err(ExplorerError::InvalidGeometry(
            "Cropping rotated grids is not supported".to_string(),
        ));
    }

    let grid_extent = grid.extent();
    let aoi_bbox = aoi.bounding_box();
    let inter = grid_extent.intersection(&aoi_bbox).ok_or_else(|| {
        ExplorerError::EmptyIntersection(format!(
            "AOI {:?} does not intersect grid extent {:?}",
            aoi_bbox, grid_extent
        ))
    })?;

    log::debug!("Crop intersection: {:?}", inter);

    // Fractional pixel coordinates of the intersection bounds. With a
    // north-up transform pixel_height is negative, so the row axis runs
    // from max_lat down.
    let col_of = |x: f64| (x - gt.top_left_x) / gt.pixel_width;
    let row_of = |y: f64| (y - gt.top_left_y) / gt.pixel_height;

    let (c0, c1) = ordered(col_of(inter.min_lon), col_of(inter.max_lon));
    let (r0, r1) = ordered(row_of(inter.min_lat), row_of(inter.max_lat));

    // Snap inward to whole pixels
    let col_start = ((c0 - SNAP_EPS).ceil().max(0.0)) as usize;
    let col_end = ((c1 + SNAP_EPS).floor().min(grid.cols() as f64)) as usize;
    let row_start = ((r0 - SNAP_EPS).ceil().max(0.0)) as usize;
    let row_end = ((r1 + SNAP_EPS).floor().min(grid.rows() as f64)) as usize;

    if col_end <= col_start || row_end <= row_start {
        return Err(ExplorerError::EmptyIntersection(format!(
            "Intersection {:?} is narrower than one pixel",
            inter
        )));
    }

    let data = grid
        .data
        .slice(s![row_start..row_end, col_start..col_end])
        .to_owned();

    let transform = GeoTransform {
        top_left_x: gt.top_left_x + col_start as f64 * gt.pixel_width,
        top_left_y: gt.top_left_y + row_start as f64 * gt.pixel_height,
        ..*gt
    };

    log::debug!(
        "Cropped {}x{} -> {}x{} (rows {}..{}, cols {}..{})",
        grid.rows(),
        grid.cols(),
        data.nrows(),
        data.ncols(),
        row_start,
        row_end,
        col_start,
        col_end
    );

    Ok(RasterGrid {
        data,
        transform,
        crs: grid.crs.clone(),
    })
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoundingBox;
    use ndarray::Array2;

    fn test_grid() -> RasterGrid {
        // 100x100 pixels over [10.0, 45.0, 11.0, 46.0], 0.01 degree pixels
        let data = Array2::from_shape_fn((100, 100), |(r, c)| (r * 100 + c) as f32);
        RasterGrid {
            data,
            transform: GeoTransform {
                top_left_x: 10.0,
                pixel_width: 0.01,
                rotation_x: 0.0,
                top_left_y: 46.0,
                rotation_y: 0.0,
                pixel_height: -0.01,
            },
            crs: "EPSG:4326".to_string(),
        }
    }

    #[test]
    fn test_crop_pixel_aligned_window() {
        let grid = test_grid();
        let aoi =
            AreaOfInterest::from_bbox(BoundingBox::new(10.25, 45.25, 10.75, 45.75).unwrap());
        let cropped = crop(&grid, &aoi).unwrap();
        assert_eq!(cropped.rows(), 50);
        assert_eq!(cropped.cols(), 50);
        let extent = cropped.extent();
        assert!((extent.min_lon - 10.25).abs() < 1e-9);
        assert!((extent.max_lat - 45.75).abs() < 1e-9);
        // top-left value of the window: row 25, col 25 of the source
        assert_eq!(cropped.data[[0, 0]], (25 * 100 + 25) as f32);
        assert_eq!(cropped.crs, grid.crs);
    }

    #[test]
    fn test_crop_extent_never_exceeds_intersection() {
        let grid = test_grid();
        // AOI bound not on a pixel edge: inward snap must shrink, not grow
        let aoi =
            AreaOfInterest::from_bbox(BoundingBox::new(10.204, 45.204, 10.807, 45.807).unwrap());
        let cropped = crop(&grid, &aoi).unwrap();
        let inter = grid.extent().intersection(&aoi.bounding_box()).unwrap();
        assert!(inter.contains(&cropped.extent()));
    }

    #[test]
    fn test_crop_is_idempotent() {
        let grid = test_grid();
        let aoi =
            AreaOfInterest::from_bbox(BoundingBox::new(10.204, 45.204, 10.807, 45.807).unwrap());
        let once = crop(&grid, &aoi).unwrap();
        let twice = crop(&once, &aoi).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_crop_disjoint_aoi_fails() {
        let grid = test_grid();
        let aoi = AreaOfInterest::from_bbox(BoundingBox::new(20.0, 50.0, 21.0, 51.0).unwrap());
        let result = crop(&grid, &aoi);
        assert!(matches!(result, Err(ExplorerError::EmptyIntersection(_))));
    }

    #[test]
    fn test_crop_does_not_mutate_source() {
        let grid = test_grid();
        let original = grid.data.clone();
        let aoi =
            AreaOfInterest::from_bbox(BoundingBox::new(10.25, 45.25, 10.75, 45.75).unwrap());
        let mut cropped = crop(&grid, &aoi).unwrap();
        cropped.data[[0, 0]] = -1.0;
        assert_eq!(grid.data, original);
    }

    #[test]
    fn test_crop_sub_pixel_intersection_fails() {
        let grid = test_grid();
        // overlaps the grid's left edge by far less than one pixel
        let aoi =
            AreaOfInterest::from_bbox(BoundingBox::new(9.0, 45.2, 10.001, 45.8).unwrap());
        let result = crop(&grid, &aoi);
        assert!(matches!(result, Err(ExplorerError::EmptyIntersection(_))));
    }
}

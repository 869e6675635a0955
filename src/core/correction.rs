use crate::io::calibration::LookupTable;
use crate::types::{ExplorerResult, RasterGrid};
use ndarray::Zip;

/// Subtract annotated thermal noise power from a GRD band.
///
/// Per pixel: max(DN^2 - eta, 0), where eta is the noise LUT
/// interpolated onto the full image grid. Negative differences clamp to
/// zero, per the Sentinel-1 thermal denoising note.
pub fn remove_thermal_noise(grid: &RasterGrid, lut: &LookupTable) -> ExplorerResult<RasterGrid> {
    log::info!(
        "Removing thermal noise from {}x{} band",
        grid.rows(),
        grid.cols()
    );

    let noise = lut.interpolate_to(grid.rows(), grid.cols());
    let mut data = grid.data.clone();
    Zip::from(&mut data).and(&noise).for_each(|dn, &eta| {
        let power = *dn * *dn - eta;
        *dn = if power > 0.0 { power } else { 0.0 };
    });

    Ok(RasterGrid {
        data,
        transform: grid.transform,
        crs: grid.crs.clone(),
    })
}

/// Radiometrically calibrate a noise-corrected GRD band.
///
/// Per pixel: value / A^2, where A is the calibration LUT interpolated
/// onto the full image grid. The input is expected to hold
/// noise-corrected power (the output of [`remove_thermal_noise`]), so
/// no further squaring of the numerator is applied.
pub fn radiometric_calibration(grid: &RasterGrid, lut: &LookupTable) -> ExplorerResult<RasterGrid> {
    log::info!(
        "Calibrating {}x{} band",
        grid.rows(),
        grid.cols()
    );

    let coeff = lut.interpolate_to(grid.rows(), grid.cols());
    let mut data = grid.data.clone();
    Zip::from(&mut data).and(&coeff).for_each(|value, &a| {
        *value /= a * a;
    });

    Ok(RasterGrid {
        data,
        transform: grid.transform,
        crs: grid.crs.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::calibration::parse_noise_lut;
    use crate::types::GeoTransform;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    fn flat_lut(value: f32) -> LookupTable {
        let xml = format!(
            r#"<noise><noiseRangeVectorList count="1">
                 <noiseRangeVector>
                   <azimuthTime>t</azimuthTime>
                   <line>0</line>
                   <pixel count="2">0 10</pixel>
                   <noiseRangeLut count="2">{v} {v}</noiseRangeLut>
                 </noiseRangeVector>
               </noiseRangeVectorList></noise>"#,
            v = value
        );
        parse_noise_lut(&xml).unwrap()
    }

    fn grid_of(value: f32, rows: usize, cols: usize) -> RasterGrid {
        RasterGrid {
            data: Array2::from_elem((rows, cols), value),
            transform: GeoTransform {
                top_left_x: 0.0,
                pixel_width: 1.0,
                rotation_x: 0.0,
                top_left_y: 0.0,
                rotation_y: 0.0,
                pixel_height: -1.0,
            },
            crs: "EPSG:4326".to_string(),
        }
    }

    #[test]
    fn test_thermal_noise_subtraction() {
        let grid = grid_of(10.0, 4, 4);
        let lut = flat_lut(19.0);
        let corrected = remove_thermal_noise(&grid, &lut).unwrap();
        // 10^2 - 19 = 81
        assert_relative_eq!(corrected.data[[0, 0]], 81.0);
        assert_relative_eq!(corrected.data[[3, 3]], 81.0);
    }

    #[test]
    fn test_thermal_noise_clamps_to_zero() {
        let grid = grid_of(2.0, 3, 3);
        let lut = flat_lut(100.0);
        let corrected = remove_thermal_noise(&grid, &lut).unwrap();
        assert_relative_eq!(corrected.data[[1, 1]], 0.0);
    }

    #[test]
    fn test_radiometric_calibration_divides_by_squared_coefficient() {
        let grid = grid_of(200.0, 3, 3);
        let lut = flat_lut(10.0);
        let calibrated = radiometric_calibration(&grid, &lut).unwrap();
        // 200 / 10^2 = 2
        assert_relative_eq!(calibrated.data[[2, 2]], 2.0);
    }

    #[test]
    fn test_corrections_preserve_georeferencing() {
        let grid = grid_of(5.0, 3, 3);
        let lut = flat_lut(1.0);
        let corrected = remove_thermal_noise(&grid, &lut).unwrap();
        assert_eq!(corrected.transform, grid.transform);
        assert_eq!(corrected.crs, grid.crs);
    }
}

//! Terrain shading from a digital elevation model

use crate::types::{GeoTransform, GridF32, TerraError, TerraResult};
use rayon::prelude::*;
use std::f32::consts::PI;

/// Parameters for hillshade computation
#[derive(Debug, Clone)]
pub struct HillshadeParams {
    /// Sun azimuth in degrees (0 = North, clockwise)
    pub azimuth: f32,
    /// Sun altitude in degrees above the horizon (0-90)
    pub altitude: f32,
    /// Vertical exaggeration applied to elevations before shading
    pub z_factor: f32,
}

impl Default for HillshadeParams {
    fn default() -> Self {
        Self {
            azimuth: 315.0, // NW illumination (standard)
            altitude: 45.0,
            z_factor: 1.0,
        }
    }
}

/// Compute shaded relief from a DEM using Horn's method over the 3x3
/// neighborhood.
///
/// Output values lie in [0, 1]. Edge pixels and pixels whose neighborhood
/// contains an invalid elevation come back as NaN so they stay masked
/// through later compositing steps.
pub fn hillshade(
    dem: &GridF32,
    transform: &GeoTransform,
    params: &HillshadeParams,
) -> TerraResult<GridF32> {
    let (rows, cols) = dem.dim();
    if rows < 3 || cols < 3 {
        return Err(TerraError::Processing(format!(
            "DEM too small for hillshade: {}x{}",
            rows, cols
        )));
    }
    if !(0.0..=90.0).contains(&params.altitude) {
        return Err(TerraError::Processing(format!(
            "sun altitude {} outside 0-90 degrees",
            params.altitude
        )));
    }

    let cell_x = transform.pixel_width.abs() as f32;
    let cell_y = transform.pixel_height.abs() as f32;
    if cell_x == 0.0 || cell_y == 0.0 {
        return Err(TerraError::Processing(
            "geotransform has zero pixel size".to_string(),
        ));
    }

    log::debug!(
        "Hillshade {}x{}, azimuth {}, altitude {}, z-factor {}",
        rows,
        cols,
        params.azimuth,
        params.altitude,
        params.z_factor
    );

    let azimuth_rad = (360.0 - params.azimuth + 90.0).to_radians();
    let zenith_rad = (90.0 - params.altitude).to_radians();
    let cos_zenith = zenith_rad.cos();
    let sin_zenith = zenith_rad.sin();
    let z = params.z_factor;

    let data: Vec<f32> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f32::NAN; cols];
            if row == 0 || row == rows - 1 {
                return row_data;
            }

            for col in 1..cols - 1 {
                // 3x3 neighborhood, top-left to bottom-right
                let a = dem[[row - 1, col - 1]];
                let b = dem[[row - 1, col]];
                let c = dem[[row - 1, col + 1]];
                let d = dem[[row, col - 1]];
                let e = dem[[row, col]];
                let f = dem[[row, col + 1]];
                let g = dem[[row + 1, col - 1]];
                let h = dem[[row + 1, col]];
                let i = dem[[row + 1, col + 1]];

                if [a, b, c, d, e, f, g, h, i].iter().any(|v| v.is_nan()) {
                    continue;
                }

                let dz_dx = z * ((c + 2.0 * f + i) - (a + 2.0 * d + g)) / (8.0 * cell_x);
                let dz_dy = z * ((g + 2.0 * h + i) - (a + 2.0 * b + c)) / (8.0 * cell_y);

                let slope_rad = (dz_dx * dz_dx + dz_dy * dz_dy).sqrt().atan();
                let aspect_rad = if dz_dx.abs() < 1e-10 && dz_dy.abs() < 1e-10 {
                    0.0
                } else {
                    let aspect = (-dz_dy).atan2(-dz_dx);
                    if aspect < 0.0 {
                        2.0 * PI + aspect
                    } else {
                        aspect
                    }
                };

                let shade = cos_zenith * slope_rad.cos()
                    + sin_zenith * slope_rad.sin() * (azimuth_rad - aspect_rad).cos();

                row_data[col] = shade.clamp(0.0, 1.0);
            }
            row_data
        })
        .collect();

    GridF32::from_shape_vec((rows, cols), data)
        .map_err(|e| TerraError::Processing(format!("failed to assemble hillshade grid: {}", e)))
}

/// Mask pixels at or below a threshold (the `updateMask(dem.gt(0))`
/// pattern), returning a new grid
pub fn mask_below(grid: &GridF32, threshold: f32) -> GridF32 {
    grid.mapv(|v| if v > threshold { v } else { f32::NAN })
}

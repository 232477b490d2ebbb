//! Grid-to-grid visualization helpers
//!
//! Reproduces the usual shaded-relief compositing chain: stretch a band
//! through a color ramp, convert to HSV, swap the value channel for a
//! weighted hillshade blend, convert back. Everything is a pure function
//! over grids; nothing here draws.

use crate::types::{GridF32, TerraError, TerraResult};
use ndarray::Zip;

/// Linear rescale of a grid to [0, 1], clamped.
///
/// Values at or below `low` map to 0, at or above `high` map to 1.
/// NaN pixels stay NaN.
pub fn unit_scale(grid: &GridF32, low: f32, high: f32) -> TerraResult<GridF32> {
    if high <= low {
        return Err(TerraError::Processing(format!(
            "invalid scale range [{}, {}]",
            low, high
        )));
    }
    let span = high - low;
    Ok(grid.mapv(|v| ((v - low) / span).clamp(0.0, 1.0)))
}

/// An RGB color ramp sampled by linear interpolation between stops
#[derive(Debug, Clone)]
pub struct Palette {
    stops: Vec<[f32; 3]>,
}

impl Palette {
    /// Build a palette from 8-bit RGB stops, first stop at 0, last at 1
    pub fn new(colors: &[[u8; 3]]) -> TerraResult<Self> {
        if colors.is_empty() {
            return Err(TerraError::Processing("palette has no colors".to_string()));
        }
        Ok(Self {
            stops: colors
                .iter()
                .map(|c| [c[0] as f32, c[1] as f32, c[2] as f32])
                .collect(),
        })
    }

    /// Black-to-white ramp
    pub fn greyscale() -> Self {
        Self {
            stops: vec![[0.0, 0.0, 0.0], [255.0, 255.0, 255.0]],
        }
    }

    /// Sample the ramp at position `t` in [0, 1], returning 0-255 RGB
    pub fn sample(&self, t: f32) -> [f32; 3] {
        if self.stops.len() == 1 {
            return self.stops[0];
        }
        let t = t.clamp(0.0, 1.0);
        let scaled = t * (self.stops.len() - 1) as f32;
        let lower = (scaled.floor() as usize).min(self.stops.len() - 2);
        let frac = scaled - lower as f32;

        let lo = self.stops[lower];
        let hi = self.stops[lower + 1];
        [
            lo[0] + (hi[0] - lo[0]) * frac,
            lo[1] + (hi[1] - lo[1]) * frac,
            lo[2] + (hi[2] - lo[2]) * frac,
        ]
    }
}

/// Three-channel image as separate grids, all the same shape
#[derive(Debug, Clone)]
pub struct RgbImage {
    pub red: GridF32,
    pub green: GridF32,
    pub blue: GridF32,
}

impl RgbImage {
    /// Rescale 0-255 channels to [0, 1]
    pub fn unit_scale(&self) -> TerraResult<RgbImage> {
        Ok(RgbImage {
            red: unit_scale(&self.red, 0.0, 255.0)?,
            green: unit_scale(&self.green, 0.0, 255.0)?,
            blue: unit_scale(&self.blue, 0.0, 255.0)?,
        })
    }
}

/// Hue/saturation/value image, all channels in [0, 1]
#[derive(Debug, Clone)]
pub struct HsvImage {
    pub hue: GridF32,
    pub saturation: GridF32,
    pub value: GridF32,
}

/// Min/max stretch mapped through a color ramp, producing 0-255 RGB
/// channels (the map-layer `visualize` call). NaN pixels stay NaN in all
/// three channels.
pub fn stretch_to_palette(
    grid: &GridF32,
    min: f32,
    max: f32,
    palette: &Palette,
) -> TerraResult<RgbImage> {
    let scaled = unit_scale(grid, min, max)?;
    let dim = scaled.raw_dim();

    let mut red = GridF32::from_elem(dim.clone(), f32::NAN);
    let mut green = GridF32::from_elem(dim.clone(), f32::NAN);
    let mut blue = GridF32::from_elem(dim, f32::NAN);

    Zip::from(&scaled)
        .and(&mut red)
        .and(&mut green)
        .and(&mut blue)
        .for_each(|&t, r, g, b| {
            if !t.is_nan() {
                let [cr, cg, cb] = palette.sample(t);
                *r = cr;
                *g = cg;
                *b = cb;
            }
        });

    Ok(RgbImage { red, green, blue })
}

/// Per-pixel RGB ([0, 1]) to HSV conversion
pub fn rgb_to_hsv(rgb: &RgbImage) -> TerraResult<HsvImage> {
    check_shapes(&rgb.red, &rgb.green, &rgb.blue)?;
    let dim = rgb.red.raw_dim();

    let mut hue = GridF32::from_elem(dim.clone(), f32::NAN);
    let mut saturation = GridF32::from_elem(dim.clone(), f32::NAN);
    let mut value = GridF32::from_elem(dim, f32::NAN);

    Zip::from(&rgb.red)
        .and(&rgb.green)
        .and(&rgb.blue)
        .and(&mut hue)
        .and(&mut saturation)
        .and(&mut value)
        .for_each(|&r, &g, &b, h, s, v| {
            if r.is_nan() || g.is_nan() || b.is_nan() {
                return;
            }
            let max = r.max(g).max(b);
            let min = r.min(g).min(b);
            let delta = max - min;

            *v = max;
            *s = if max > 0.0 { delta / max } else { 0.0 };
            *h = if delta == 0.0 {
                0.0
            } else {
                let h6 = if max == r {
                    ((g - b) / delta).rem_euclid(6.0)
                } else if max == g {
                    (b - r) / delta + 2.0
                } else {
                    (r - g) / delta + 4.0
                };
                h6 / 6.0
            };
        });

    Ok(HsvImage {
        hue,
        saturation,
        value,
    })
}

/// Per-pixel HSV to RGB conversion, channels in [0, 1]
pub fn hsv_to_rgb(hsv: &HsvImage) -> TerraResult<RgbImage> {
    check_shapes(&hsv.hue, &hsv.saturation, &hsv.value)?;
    let dim = hsv.hue.raw_dim();

    let mut red = GridF32::from_elem(dim.clone(), f32::NAN);
    let mut green = GridF32::from_elem(dim.clone(), f32::NAN);
    let mut blue = GridF32::from_elem(dim, f32::NAN);

    Zip::from(&hsv.hue)
        .and(&hsv.saturation)
        .and(&hsv.value)
        .and(&mut red)
        .and(&mut green)
        .and(&mut blue)
        .for_each(|&h, &s, &v, r, g, b| {
            if h.is_nan() || s.is_nan() || v.is_nan() {
                return;
            }
            let h6 = (h.rem_euclid(1.0)) * 6.0;
            let c = v * s;
            let x = c * (1.0 - ((h6 % 2.0) - 1.0).abs());
            let m = v - c;

            let (r1, g1, b1) = match h6 as u32 {
                0 => (c, x, 0.0),
                1 => (x, c, 0.0),
                2 => (0.0, c, x),
                3 => (0.0, x, c),
                4 => (x, 0.0, c),
                _ => (c, 0.0, x),
            };
            *r = r1 + m;
            *g = g1 + m;
            *b = b1 + m;
        });

    Ok(RgbImage { red, green, blue })
}

/// Weighted blend of a hillshade into an HSV value channel:
///
/// `shade * weight + value * (1 - weight)`
///
/// NaN in either input masks the output pixel.
pub fn blend_value(value: &GridF32, shade: &GridF32, weight: f32) -> TerraResult<GridF32> {
    if !(0.0..=1.0).contains(&weight) {
        return Err(TerraError::Processing(format!(
            "blend weight {} outside [0, 1]",
            weight
        )));
    }
    if value.dim() != shade.dim() {
        return Err(TerraError::Processing(format!(
            "grid shapes differ: {:?} vs {:?}",
            value.dim(),
            shade.dim()
        )));
    }

    let mut out = GridF32::from_elem(value.raw_dim(), f32::NAN);
    Zip::from(value)
        .and(shade)
        .and(&mut out)
        .for_each(|&v, &s, o| {
            if !v.is_nan() && !s.is_nan() {
                *o = s * weight + v * (1.0 - weight);
            }
        });
    Ok(out)
}

fn check_shapes(a: &GridF32, b: &GridF32, c: &GridF32) -> TerraResult<()> {
    if a.dim() != b.dim() || a.dim() != c.dim() {
        return Err(TerraError::Processing(
            "image channels have mismatched shapes".to_string(),
        ));
    }
    Ok(())
}

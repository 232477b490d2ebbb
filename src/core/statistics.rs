//! Per-band summary statistics

use crate::types::{GridF32, TerraError, TerraResult};

/// Summary statistics over the valid (non-NaN) pixels of one band
#[derive(Debug, Clone, PartialEq)]
pub struct BandStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub valid_count: usize,
}

/// Compute min/max/mean/stddev in a single pass (Welford's method).
///
/// Invalid pixels are skipped; a band with no valid pixels is an error
/// rather than a grid of NaN statistics.
pub fn band_statistics(grid: &GridF32) -> TerraResult<BandStatistics> {
    let mut count = 0usize;
    let mut mean = 0.0f64;
    let mut m2 = 0.0f64;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for &v in grid.iter() {
        if v.is_nan() {
            continue;
        }
        let v = v as f64;
        count += 1;
        let delta = v - mean;
        mean += delta / count as f64;
        m2 += delta * (v - mean);
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }

    if count == 0 {
        return Err(TerraError::Processing(
            "band has no valid pixels".to_string(),
        ));
    }

    Ok(BandStatistics {
        min,
        max,
        mean,
        std_dev: (m2 / count as f64).sqrt(),
        valid_count: count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_statistics_simple() {
        let grid = array![[1.0f32, 2.0], [3.0, 4.0]];
        let stats = band_statistics(&grid).unwrap();

        assert_relative_eq!(stats.min, 1.0);
        assert_relative_eq!(stats.max, 4.0);
        assert_relative_eq!(stats.mean, 2.5);
        // Population stddev of 1..4
        assert_relative_eq!(stats.std_dev, 1.118033988749895, epsilon = 1e-12);
        assert_eq!(stats.valid_count, 4);
    }

    #[test]
    fn test_statistics_skip_invalid_pixels() {
        let grid = array![[1.0f32, f32::NAN], [3.0, f32::NAN]];
        let stats = band_statistics(&grid).unwrap();

        assert_eq!(stats.valid_count, 2);
        assert_relative_eq!(stats.mean, 2.0);
    }

    #[test]
    fn test_statistics_all_invalid_is_error() {
        let grid = array![[f32::NAN, f32::NAN]];
        assert!(band_statistics(&grid).is_err());
    }
}

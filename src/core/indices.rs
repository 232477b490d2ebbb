//! Normalized-difference spectral indices
//!
//! Pure functions: inputs are borrowed, the result is a new grid. Invalid
//! pixels are NaN in memory and only become an explicit sentinel when the
//! grid is written to disk.

use crate::types::{GridF32, TerraError, TerraResult};
use rayon::prelude::*;

/// Compute the normalized difference between two bands:
///
/// `(band_a - band_b) / (band_a + band_b)`
///
/// Valid outputs lie in [-1, 1]. A pixel is invalid (NaN) when either
/// input is NaN, either input is negative, or the sum is zero. Negative
/// reflectances would push the quotient outside the index's valid range,
/// so they are masked instead of producing out-of-range values.
pub fn normalized_difference(band_a: &GridF32, band_b: &GridF32) -> TerraResult<GridF32> {
    if band_a.dim() != band_b.dim() {
        return Err(TerraError::Processing(format!(
            "band shapes differ: {:?} vs {:?}",
            band_a.dim(),
            band_b.dim()
        )));
    }

    let (rows, cols) = band_a.dim();

    let data: Vec<f32> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f32::NAN; cols];
            for col in 0..cols {
                let a = band_a[[row, col]];
                let b = band_b[[row, col]];

                if a.is_nan() || b.is_nan() || a < 0.0 || b < 0.0 {
                    continue;
                }

                let sum = a + b;
                if sum == 0.0 {
                    continue;
                }

                row_data[col] = (a - b) / sum;
            }
            row_data
        })
        .collect();

    GridF32::from_shape_vec((rows, cols), data)
        .map_err(|e| TerraError::Processing(format!("failed to assemble index grid: {}", e)))
}

/// Normalized Difference Vegetation Index
///
/// `NDVI = (NIR - Red) / (NIR + Red)`
pub fn ndvi(nir: &GridF32, red: &GridF32) -> TerraResult<GridF32> {
    normalized_difference(nir, red)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_normalized_difference_constant_bands() {
        let a = array![[4.0f32, 4.0], [4.0, 4.0]];
        let b = array![[2.0f32, 2.0], [2.0, 2.0]];

        let result = normalized_difference(&a, &b).unwrap();
        for &v in result.iter() {
            assert_relative_eq!(v, 1.0 / 3.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_zero_sum_is_flagged_not_nan_propagated() {
        let a = array![[0.0f32]];
        let b = array![[0.0f32]];

        let result = normalized_difference(&a, &b).unwrap();
        // Flagged invalid, not silently Inf
        assert!(result[[0, 0]].is_nan());
        assert!(!result[[0, 0]].is_infinite());
    }

    #[test]
    fn test_valid_pixels_within_range() {
        let a = array![[4.0f32, 0.5, 100.0], [0.0, 7.0, 3.0]];
        let b = array![[2.0f32, 8.0, 1.0], [5.0, 7.0, 0.0]];

        let result = normalized_difference(&a, &b).unwrap();
        for &v in result.iter() {
            if !v.is_nan() {
                assert!((-1.0..=1.0).contains(&v), "index {} out of range", v);
            }
        }
    }

    #[test]
    fn test_negative_input_is_masked() {
        let a = array![[-0.1f32, 4.0]];
        let b = array![[2.0f32, 2.0]];

        let result = normalized_difference(&a, &b).unwrap();
        assert!(result[[0, 0]].is_nan());
        assert_relative_eq!(result[[0, 1]], 1.0 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_nan_input_propagates_as_mask() {
        let a = array![[f32::NAN, 4.0]];
        let b = array![[2.0f32, 2.0]];

        let result = normalized_difference(&a, &b).unwrap();
        assert!(result[[0, 0]].is_nan());
        assert!(!result[[0, 1]].is_nan());
    }

    #[test]
    fn test_recomputation_is_bit_identical() {
        let a = array![[4.1f32, 3.3, 0.7], [9.9, 0.0, 2.5]];
        let b = array![[2.0f32, 5.5, 0.7], [0.1, 0.0, 2.5]];

        let first = normalized_difference(&a, &b).unwrap();
        let second = normalized_difference(&a, &b).unwrap();

        for (x, y) in first.iter().zip(second.iter()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }

    #[test]
    fn test_shape_mismatch_is_error() {
        let a = GridF32::zeros((2, 3));
        let b = GridF32::zeros((3, 2));
        assert!(normalized_difference(&a, &b).is_err());
    }

    #[test]
    fn test_ndvi_matches_generic_index() {
        let nir = array![[8.0f32, 6.0]];
        let red = array![[2.0f32, 2.0]];

        let from_ndvi = ndvi(&nir, &red).unwrap();
        let generic = normalized_difference(&nir, &red).unwrap();
        assert_eq!(from_ndvi, generic);
    }
}

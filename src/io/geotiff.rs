use crate::core::statistics::{band_statistics, BandStatistics};
use crate::types::{GeoTransform, GridF32, RasterMetadata, TerraError, TerraResult};
use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager};
use ndarray::Array2;
use std::path::Path;

/// Read-only handle on a raster file.
///
/// The underlying dataset handle is released when the source is dropped,
/// on every exit path.
pub struct RasterSource {
    dataset: Dataset,
    path: String,
}

impl RasterSource {
    /// Open a raster file for reading
    pub fn open<P: AsRef<Path>>(path: P) -> TerraResult<Self> {
        log::info!("Opening raster: {}", path.as_ref().display());
        let dataset = Dataset::open(path.as_ref())?;
        Ok(Self {
            dataset,
            path: path.as_ref().display().to_string(),
        })
    }

    /// Number of bands in the dataset
    pub fn band_count(&self) -> usize {
        self.dataset.raster_count() as usize
    }

    /// Raster dimensions as (width, height)
    pub fn size(&self) -> (usize, usize) {
        self.dataset.raster_size()
    }

    /// Full descriptive metadata: dimensions, band count, datatype,
    /// projection and geotransform
    pub fn metadata(&self) -> TerraResult<RasterMetadata> {
        let (width, height) = self.dataset.raster_size();
        let geo_transform = self.dataset.geo_transform()?;
        let band = self.dataset.rasterband(1)?;

        Ok(RasterMetadata {
            width,
            height,
            band_count: self.dataset.raster_count() as usize,
            data_type: format!("{}", band.band_type()),
            projection: self.dataset.projection(),
            geo_transform: GeoTransform::from_array(&geo_transform),
            no_data: band.no_data_value(),
        })
    }

    /// Read one band (1-based index) into a grid.
    ///
    /// Pixels equal to the band's declared no-data value come back as NaN
    /// so downstream band math can mask them uniformly.
    pub fn read_band(&self, index: usize) -> TerraResult<GridF32> {
        let band_count = self.band_count();
        if index == 0 || index > band_count {
            return Err(TerraError::InvalidFormat(format!(
                "band index {} out of range (dataset has {} bands)",
                index, band_count
            )));
        }

        let (width, height) = self.dataset.raster_size();
        log::debug!(
            "Reading band {} of {} ({}x{})",
            index,
            self.path,
            width,
            height
        );

        let band = self.dataset.rasterband(index as isize)?;
        let no_data = band.no_data_value();
        let buffer = band.read_as::<f32>((0, 0), (width, height), (width, height), None)?;

        let mut grid = Array2::from_shape_vec((height, width), buffer.data)
            .map_err(|e| TerraError::Processing(format!("failed to reshape band data: {}", e)))?;

        if let Some(nd) = no_data {
            let nd = nd as f32;
            grid.mapv_inplace(|v| if v == nd { f32::NAN } else { v });
        }

        Ok(grid)
    }

    /// Read every band of the dataset, in band order
    pub fn read_all_bands(&self) -> TerraResult<Vec<GridF32>> {
        (1..=self.band_count())
            .map(|index| self.read_band(index))
            .collect()
    }

    /// Min/max/mean/stddev of one band, computed over valid pixels
    pub fn band_statistics(&self, index: usize) -> TerraResult<BandStatistics> {
        let grid = self.read_band(index)?;
        band_statistics(&grid)
    }
}

/// Write a single-band GeoTIFF carrying the given projection and
/// geotransform.
///
/// NaN pixels in the grid are written as `no_data`, and the band's no-data
/// value is declared so readers can recognize them. Re-reading the file
/// with [`RasterSource`] reproduces the grid within f32 precision.
pub fn write_geotiff<P: AsRef<Path>>(
    path: P,
    grid: &GridF32,
    projection: &str,
    transform: &GeoTransform,
    no_data: f32,
) -> TerraResult<()> {
    log::info!("Writing GeoTIFF: {}", path.as_ref().display());

    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let (height, width) = grid.dim();

    let mut dataset =
        driver.create_with_band_type::<f32, _>(path.as_ref(), width as isize, height as isize, 1)?;

    dataset.set_projection(projection)?;
    dataset.set_geo_transform(&transform.as_array())?;

    let flat_data: Vec<f32> = grid
        .iter()
        .map(|&v| if v.is_nan() { no_data } else { v })
        .collect();
    let buffer = Buffer::new((width, height), flat_data);

    let mut band = dataset.rasterband(1)?;
    band.write((0, 0), (width, height), &buffer)?;
    band.set_no_data_value(Some(no_data as f64))?;

    Ok(())
}

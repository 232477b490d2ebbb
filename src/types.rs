use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Real-valued pixel data
pub type Pixel = f32;

/// 2D raster band data array (rows x columns)
pub type GridF32 = Array2<Pixel>;

/// No-data sentinel written to disk for invalid pixels.
///
/// In memory, invalid pixels are represented as NaN; the sentinel only
/// appears in files, together with the band's declared no-data value.
pub const NO_DATA: f32 = -9999.0;

/// Geospatial bounding box in the raster's coordinate system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

/// Geospatial transformation parameters (GDAL-style affine)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform with no rotation terms
    pub fn north_up(top_left_x: f64, top_left_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            top_left_x,
            pixel_width,
            rotation_x: 0.0,
            top_left_y,
            rotation_y: 0.0,
            pixel_height,
        }
    }

    pub fn from_array(gt: &[f64; 6]) -> Self {
        Self {
            top_left_x: gt[0],
            pixel_width: gt[1],
            rotation_x: gt[2],
            top_left_y: gt[3],
            rotation_y: gt[4],
            pixel_height: gt[5],
        }
    }

    pub fn as_array(&self) -> [f64; 6] {
        [
            self.top_left_x,
            self.pixel_width,
            self.rotation_x,
            self.top_left_y,
            self.rotation_y,
            self.pixel_height,
        ]
    }

    /// Geographic coordinates of the top-left corner of pixel (row, col)
    pub fn pixel_to_geo(&self, row: usize, col: usize) -> (f64, f64) {
        let x = self.top_left_x + col as f64 * self.pixel_width + row as f64 * self.rotation_x;
        let y = self.top_left_y + col as f64 * self.rotation_y + row as f64 * self.pixel_height;
        (x, y)
    }
}

/// Descriptive metadata of an open raster dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterMetadata {
    pub width: usize,
    pub height: usize,
    pub band_count: usize,
    /// Pixel datatype name as reported by the driver (e.g. "Float32")
    pub data_type: String,
    /// Projection as WKT, empty when the file carries none
    pub projection: String,
    pub geo_transform: GeoTransform,
    /// Declared no-data value of band 1, if any
    pub no_data: Option<f64>,
}

/// Error types for raster and catalog operations
#[derive(Debug, thiserror::Error)]
pub enum TerraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Catalog error: {0}")]
    Catalog(String),
}

/// Result type for toolkit operations
pub type TerraResult<T> = Result<T, TerraError>;

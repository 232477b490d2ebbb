//! Raster file I/O

pub mod geotiff;

pub use geotiff::{write_geotiff, RasterSource};

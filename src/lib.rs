//! terralab: A Small, Modular Remote-Sensing Toolkit
//!
//! This library re-authors a set of remote-sensing classroom workflows as
//! one coherent crate: GeoTIFF I/O with preserved georeferencing,
//! normalized-difference band indices, hillshade and shaded-relief
//! compositing, and an in-memory catalog of image/feature collections
//! queried by filter predicates.

pub mod catalog;
pub mod core;
pub mod io;
pub mod types;

// Re-export main types and functions for easier access
pub use types::{
    BoundingBox, GeoTransform, GridF32, Pixel, RasterMetadata, TerraError, TerraResult, NO_DATA,
};

pub use catalog::{
    Catalog, Feature, FeatureCollection, ImageCollection, PropertyValue, SceneImage,
};
pub use self::core::{
    band_statistics, blend_value, clip_to_bounds, hillshade, hsv_to_rgb, mask_below, ndvi,
    normalized_difference, rgb_to_hsv, stretch_to_palette, unit_scale, BandStatistics,
    HillshadeParams, HsvImage, Palette, RgbImage,
};
pub use io::{write_geotiff, RasterSource};

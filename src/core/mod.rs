//! Core raster processing modules

pub mod clip;
pub mod indices;
pub mod statistics;
pub mod terrain;
pub mod visualize;

// Re-export main types
pub use clip::clip_to_bounds;
pub use indices::{ndvi, normalized_difference};
pub use statistics::{band_statistics, BandStatistics};
pub use terrain::{hillshade, mask_below, HillshadeParams};
pub use visualize::{
    blend_value, hsv_to_rgb, rgb_to_hsv, stretch_to_palette, unit_scale, HsvImage, Palette,
    RgbImage,
};

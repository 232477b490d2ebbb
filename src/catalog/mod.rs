//! In-memory catalog of image and feature collections
//!
//! Datasets are looked up by catalog identifier on an explicit [`Catalog`]
//! value; there is no ambient session. Filters and reducers are pure:
//! they return new collections or scenes and leave their input untouched.

use crate::core::indices;
use crate::types::{GridF32, TerraError, TerraResult};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::collections::HashMap;

/// A scene property or feature attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Number(f64),
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Number(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Number(v as f64)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        PropertyValue::Number(v as f64)
    }
}

/// A single acquisition: named bands over one footprint, plus properties
#[derive(Debug, Clone)]
pub struct SceneImage {
    id: String,
    timestamp: DateTime<Utc>,
    bands: Vec<(String, GridF32)>,
    properties: HashMap<String, PropertyValue>,
}

impl SceneImage {
    pub fn new(id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            timestamp,
            bands: Vec::new(),
            properties: HashMap::new(),
        }
    }

    /// Add a band; all bands of a scene must share one shape
    pub fn with_band(mut self, band_id: impl Into<String>, grid: GridF32) -> TerraResult<Self> {
        let band_id = band_id.into();
        if self.bands.iter().any(|(id, _)| *id == band_id) {
            return Err(TerraError::Catalog(format!(
                "scene {} already has band {}",
                self.id, band_id
            )));
        }
        if let Some((_, first)) = self.bands.first() {
            if first.dim() != grid.dim() {
                return Err(TerraError::Catalog(format!(
                    "band {} shape {:?} differs from scene shape {:?}",
                    band_id,
                    grid.dim(),
                    first.dim()
                )));
            }
        }
        self.bands.push((band_id, grid));
        Ok(self)
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn band_ids(&self) -> Vec<&str> {
        self.bands.iter().map(|(id, _)| id.as_str()).collect()
    }

    /// Borrow one band by id
    pub fn band(&self, band_id: &str) -> TerraResult<&GridF32> {
        self.bands
            .iter()
            .find(|(id, _)| id == band_id)
            .map(|(_, grid)| grid)
            .ok_or_else(|| {
                TerraError::Catalog(format!("scene {} has no band {}", self.id, band_id))
            })
    }

    /// New scene keeping only the named bands, in the order given
    pub fn select(&self, band_ids: &[&str]) -> TerraResult<SceneImage> {
        let mut selected = SceneImage::new(self.id.clone(), self.timestamp);
        selected.properties = self.properties.clone();
        for &band_id in band_ids {
            let grid = self.band(band_id)?.clone();
            selected = selected.with_band(band_id, grid)?;
        }
        Ok(selected)
    }

    /// New scene with every band divided by a scalar (reflectance rescaling)
    pub fn divide(&self, scalar: f32) -> TerraResult<SceneImage> {
        if scalar == 0.0 {
            return Err(TerraError::Processing(
                "division of scene bands by zero".to_string(),
            ));
        }
        let mut scaled = self.clone();
        for (_, grid) in &mut scaled.bands {
            grid.mapv_inplace(|v| v / scalar);
        }
        Ok(scaled)
    }

    /// Normalized difference between two named bands of this scene
    pub fn normalized_difference(&self, band_a: &str, band_b: &str) -> TerraResult<GridF32> {
        indices::normalized_difference(self.band(band_a)?, self.band(band_b)?)
    }
}

/// An ordered set of scenes sharing a footprint and band naming
#[derive(Debug, Clone)]
pub struct ImageCollection {
    id: String,
    scenes: Vec<SceneImage>,
}

impl ImageCollection {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            scenes: Vec::new(),
        }
    }

    pub fn push(&mut self, scene: SceneImage) {
        self.scenes.push(scene);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn count(&self) -> usize {
        self.scenes.len()
    }

    pub fn scenes(&self) -> &[SceneImage] {
        &self.scenes
    }

    /// Keep scenes whose property equals the given value
    pub fn filter_eq(&self, property: &str, value: &PropertyValue) -> ImageCollection {
        let scenes: Vec<SceneImage> = self
            .scenes
            .iter()
            .filter(|scene| scene.property(property) == Some(value))
            .cloned()
            .collect();
        log::debug!(
            "{}: filter {} == {:?} kept {} of {} scenes",
            self.id,
            property,
            value,
            scenes.len(),
            self.scenes.len()
        );
        ImageCollection {
            id: self.id.clone(),
            scenes,
        }
    }

    /// Keep scenes acquired in the half-open interval [start, end)
    pub fn filter_date(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> ImageCollection {
        let scenes: Vec<SceneImage> = self
            .scenes
            .iter()
            .filter(|scene| scene.timestamp >= start && scene.timestamp < end)
            .cloned()
            .collect();
        ImageCollection {
            id: self.id.clone(),
            scenes,
        }
    }

    /// Per-pixel minimum composite over all scenes
    pub fn reduce_min(&self) -> TerraResult<SceneImage> {
        self.reduce("min", |values| {
            values.iter().cloned().fold(f32::INFINITY, f32::min)
        })
    }

    /// Per-pixel median composite over all scenes.
    ///
    /// Even counts average the two central values.
    pub fn reduce_median(&self) -> TerraResult<SceneImage> {
        self.reduce("median", |values| {
            let mut sorted = values.to_vec();
            sorted.sort_by(f32::total_cmp);
            let mid = sorted.len() / 2;
            if sorted.len() % 2 == 1 {
                sorted[mid]
            } else {
                (sorted[mid - 1] + sorted[mid]) / 2.0
            }
        })
    }

    /// Shared reducer plumbing: applies `f` to the valid values of each
    /// pixel stack. Pixels with no valid value in any scene stay NaN.
    fn reduce<F>(&self, name: &str, f: F) -> TerraResult<SceneImage>
    where
        F: Fn(&[f32]) -> f32 + Sync,
    {
        let first = self.scenes.first().ok_or_else(|| {
            TerraError::Catalog(format!("cannot reduce empty collection {}", self.id))
        })?;

        log::debug!(
            "{}: {} composite over {} scenes",
            self.id,
            name,
            self.scenes.len()
        );

        let mut composite = SceneImage::new(format!("{}_{}", self.id, name), first.timestamp);

        for (band_id, first_grid) in &first.bands {
            let (rows, cols) = first_grid.dim();

            let mut stack: Vec<&GridF32> = Vec::with_capacity(self.scenes.len());
            for scene in &self.scenes {
                let grid = scene.band(band_id)?;
                if grid.dim() != (rows, cols) {
                    return Err(TerraError::Catalog(format!(
                        "scene {} band {} shape {:?} differs from {:?}",
                        scene.id,
                        band_id,
                        grid.dim(),
                        (rows, cols)
                    )));
                }
                stack.push(grid);
            }

            let data: Vec<f32> = (0..rows)
                .into_par_iter()
                .flat_map(|row| {
                    let mut row_data = vec![f32::NAN; cols];
                    let mut values = Vec::with_capacity(stack.len());
                    for col in 0..cols {
                        values.clear();
                        for grid in &stack {
                            let v = grid[[row, col]];
                            if !v.is_nan() {
                                values.push(v);
                            }
                        }
                        if !values.is_empty() {
                            row_data[col] = f(&values);
                        }
                    }
                    row_data
                })
                .collect();

            let grid = GridF32::from_shape_vec((rows, cols), data).map_err(|e| {
                TerraError::Processing(format!("failed to assemble composite band: {}", e))
            })?;
            composite = composite.with_band(band_id.clone(), grid)?;
        }

        Ok(composite)
    }
}

/// A vector feature with named attributes
#[derive(Debug, Clone, Default)]
pub struct Feature {
    attributes: HashMap<String, PropertyValue>,
}

impl Feature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&PropertyValue> {
        self.attributes.get(name)
    }
}

/// A named set of features queryable by attribute
#[derive(Debug, Clone)]
pub struct FeatureCollection {
    id: String,
    features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            features: Vec::new(),
        }
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn count(&self) -> usize {
        self.features.len()
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn feature(&self, index: usize) -> TerraResult<&Feature> {
        self.features.get(index).ok_or_else(|| {
            TerraError::Catalog(format!(
                "feature index {} out of range in {} ({} features)",
                index,
                self.id,
                self.features.len()
            ))
        })
    }

    /// Keep features whose attribute equals the given value
    pub fn filter_eq(&self, attribute: &str, value: &PropertyValue) -> FeatureCollection {
        FeatureCollection {
            id: self.id.clone(),
            features: self
                .features
                .iter()
                .filter(|f| f.attribute(attribute) == Some(value))
                .cloned()
                .collect(),
        }
    }
}

/// Named registry of datasets, passed explicitly to whatever needs it
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    images: HashMap<String, SceneImage>,
    image_collections: HashMap<String, ImageCollection>,
    feature_collections: HashMap<String, FeatureCollection>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_image(&mut self, scene: SceneImage) {
        self.images.insert(scene.id.clone(), scene);
    }

    pub fn insert_image_collection(&mut self, collection: ImageCollection) {
        self.image_collections
            .insert(collection.id.clone(), collection);
    }

    pub fn insert_feature_collection(&mut self, collection: FeatureCollection) {
        self.feature_collections
            .insert(collection.id.clone(), collection);
    }

    pub fn image(&self, id: &str) -> TerraResult<&SceneImage> {
        self.images
            .get(id)
            .ok_or_else(|| TerraError::Catalog(format!("unknown image: {}", id)))
    }

    pub fn image_collection(&self, id: &str) -> TerraResult<&ImageCollection> {
        self.image_collections
            .get(id)
            .ok_or_else(|| TerraError::Catalog(format!("unknown image collection: {}", id)))
    }

    pub fn feature_collection(&self, id: &str) -> TerraResult<&FeatureCollection> {
        self.feature_collections
            .get(id)
            .ok_or_else(|| TerraError::Catalog(format!("unknown feature collection: {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ndarray::array;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn scene(id: &str, when: DateTime<Utc>, fill: f32) -> SceneImage {
        SceneImage::new(id, when)
            .with_band("B4", array![[fill, fill]])
            .unwrap()
            .with_band("B5", array![[fill * 2.0, fill * 2.0]])
            .unwrap()
    }

    #[test]
    fn test_filter_eq_on_properties() {
        let mut collection = ImageCollection::new("LANDSAT/LC08/C01/T1_TOA");
        collection.push(scene("a", ts(2020, 1, 5), 1.0).with_property("WRS_PATH", 9));
        collection.push(scene("b", ts(2020, 2, 5), 2.0).with_property("WRS_PATH", 10));
        collection.push(scene("c", ts(2020, 3, 5), 3.0).with_property("WRS_PATH", 9));

        let filtered = collection.filter_eq("WRS_PATH", &PropertyValue::Number(9.0));
        assert_eq!(filtered.count(), 2);
        assert_eq!(filtered.scenes()[0].id(), "a");
    }

    #[test]
    fn test_filter_date_half_open() {
        let mut collection = ImageCollection::new("c");
        collection.push(scene("a", ts(2020, 1, 1), 1.0));
        collection.push(scene("b", ts(2020, 6, 1), 2.0));
        collection.push(scene("c", ts(2020, 9, 1), 3.0));

        let filtered = collection.filter_date(ts(2020, 1, 1), ts(2020, 9, 1));
        // Start inclusive, end exclusive
        assert_eq!(filtered.count(), 2);
    }

    #[test]
    fn test_min_composite() {
        let mut collection = ImageCollection::new("c");
        collection.push(scene("a", ts(2020, 1, 1), 3.0));
        collection.push(scene("b", ts(2020, 2, 1), 1.0));
        collection.push(scene("c", ts(2020, 3, 1), 2.0));

        let composite = collection.reduce_min().unwrap();
        assert_eq!(composite.band("B4").unwrap()[[0, 0]], 1.0);
        assert_eq!(composite.band("B5").unwrap()[[0, 0]], 2.0);
    }

    #[test]
    fn test_median_composite_even_count_averages() {
        let mut collection = ImageCollection::new("c");
        collection.push(scene("a", ts(2020, 1, 1), 1.0));
        collection.push(scene("b", ts(2020, 2, 1), 5.0));

        let composite = collection.reduce_median().unwrap();
        assert_eq!(composite.band("B4").unwrap()[[0, 0]], 3.0);
    }

    #[test]
    fn test_reducer_skips_masked_pixels() {
        let mut collection = ImageCollection::new("c");
        collection.push(
            SceneImage::new("a", ts(2020, 1, 1))
                .with_band("B4", array![[f32::NAN, 4.0]])
                .unwrap(),
        );
        collection.push(
            SceneImage::new("b", ts(2020, 2, 1))
                .with_band("B4", array![[f32::NAN, 2.0]])
                .unwrap(),
        );

        let composite = collection.reduce_min().unwrap();
        let band = composite.band("B4").unwrap();
        assert!(band[[0, 0]].is_nan());
        assert_eq!(band[[0, 1]], 2.0);
    }

    #[test]
    fn test_reduce_empty_collection_is_error() {
        let collection = ImageCollection::new("empty");
        assert!(collection.reduce_min().is_err());
    }

    #[test]
    fn test_scene_select_and_divide() {
        let s = scene("a", ts(2017, 1, 1), 5000.0);

        let selected = s.select(&["B5"]).unwrap();
        assert_eq!(selected.band_ids(), vec!["B5"]);
        assert!(selected.band("B4").is_err());

        let scaled = s.divide(10_000.0).unwrap();
        assert_eq!(scaled.band("B4").unwrap()[[0, 0]], 0.5);
        assert!(s.divide(0.0).is_err());
    }

    #[test]
    fn test_scene_normalized_difference() {
        let s = SceneImage::new("l8", ts(2019, 9, 3))
            .with_band("B4", array![[2.0f32]])
            .unwrap()
            .with_band("B5", array![[4.0f32]])
            .unwrap();

        let ndvi = s.normalized_difference("B5", "B4").unwrap();
        assert!((ndvi[[0, 0]] - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_scene_rejects_mismatched_band_shape() {
        let result = SceneImage::new("a", ts(2020, 1, 1))
            .with_band("B1", array![[1.0f32, 2.0]])
            .unwrap()
            .with_band("B2", array![[1.0f32], [2.0]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_feature_collection_filter() {
        let mut countries = FeatureCollection::new("USDOS/LSIB_SIMPLE/2017");
        countries.push(Feature::new().with_attribute("country_na", "Colombia"));
        countries.push(Feature::new().with_attribute("country_na", "Peru"));

        let colombia = countries.filter_eq("country_na", &PropertyValue::from("Colombia"));
        assert_eq!(colombia.count(), 1);
        assert_eq!(
            colombia.feature(0).unwrap().attribute("country_na"),
            Some(&PropertyValue::from("Colombia"))
        );
        assert!(colombia.feature(3).is_err());
    }

    #[test]
    fn test_catalog_lookup() {
        let mut catalog = Catalog::new();
        catalog.insert_feature_collection(FeatureCollection::new("USDOS/LSIB_SIMPLE/2017"));
        catalog.insert_image_collection(ImageCollection::new("COPERNICUS/S2"));

        assert!(catalog.feature_collection("USDOS/LSIB_SIMPLE/2017").is_ok());
        assert!(catalog.image_collection("COPERNICUS/S2").is_ok());
        assert!(catalog.image("USGS/SRTMGL1_003").is_err());
    }
}

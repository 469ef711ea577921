//! Vector features with attribute bags

use geo_types::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::crs::CRS;

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    /// Numeric view of the value.
    ///
    /// Strings are parsed after trimming; bools map to 1.0/0.0; anything
    /// non-numeric is `None`. A `Float(NaN)` stays NaN for the caller to
    /// handle.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::String(s) => s.trim().parse().ok(),
        }
    }
}

/// A geographic feature with geometry and attributes
#[derive(Debug, Clone)]
pub struct Feature {
    /// Feature geometry
    pub geometry: Option<Geometry<f64>>,
    /// Feature attributes
    pub properties: HashMap<String, AttributeValue>,
    /// Optional feature ID
    pub id: Option<String>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry: Some(geometry),
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Create a feature with no geometry
    pub fn empty() -> Self {
        Self {
            geometry: None,
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Set an attribute
    pub fn set_property(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.properties.insert(key.into(), value);
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }
}

/// Ordered collection of features sharing one reference system
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
    crs: CRS,
}

impl FeatureCollection {
    /// Empty collection in the default CRS (WGS84)
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty collection in the given CRS
    pub fn with_crs(crs: CRS) -> Self {
        Self {
            features: Vec::new(),
            crs,
        }
    }

    pub fn crs(&self) -> &CRS {
        &self.crs
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::point;

    #[test]
    fn test_as_f64_coercion() {
        assert_eq!(AttributeValue::Float(12.5).as_f64(), Some(12.5));
        assert_eq!(AttributeValue::Int(-3).as_f64(), Some(-3.0));
        assert_eq!(AttributeValue::Bool(true).as_f64(), Some(1.0));
        assert_eq!(AttributeValue::Bool(false).as_f64(), Some(0.0));
        assert_eq!(AttributeValue::String(" 42.5 ".into()).as_f64(), Some(42.5));
        assert_eq!(AttributeValue::String("n/a".into()).as_f64(), None);
        assert_eq!(AttributeValue::Null.as_f64(), None);
    }

    #[test]
    fn test_as_f64_nan_passthrough() {
        let v = AttributeValue::Float(f64::NAN).as_f64().unwrap();
        assert!(v.is_nan());
    }

    #[test]
    fn test_feature_properties() {
        let mut f = Feature::new(point! { x: 1.0, y: 2.0 }.into());
        f.set_property("height", AttributeValue::Float(9.0));
        assert_eq!(f.get_property("height"), Some(&AttributeValue::Float(9.0)));
        assert_eq!(f.get_property("missing"), None);
    }

    #[test]
    fn test_collection_crs() {
        let fc = FeatureCollection::with_crs(CRS::web_mercator());
        assert!(fc.crs().is_equivalent(&CRS::web_mercator()));
        assert!(fc.is_empty());

        let default = FeatureCollection::new();
        assert!(default.crs().is_equivalent(&CRS::wgs84()));
    }
}

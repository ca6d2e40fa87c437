//! Vector data structures: polygon features and ordered collections

use geo_types::Polygon;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

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
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(v) => Some(*v as f64),
            AttributeValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Stable text key, used to group features by attribute value
    pub fn group_key(&self) -> String {
        match self {
            AttributeValue::Null => "null".to_string(),
            AttributeValue::Bool(b) => b.to_string(),
            AttributeValue::Int(v) => v.to_string(),
            AttributeValue::Float(v) => v.to_string(),
            AttributeValue::String(s) => s.clone(),
        }
    }
}

/// Opaque feature identifier, carried through smoothing unchanged
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    Number(u64),
    Name(String),
}

impl From<u64> for FeatureId {
    fn from(v: u64) -> Self {
        FeatureId::Number(v)
    }
}

impl From<&str> for FeatureId {
    fn from(v: &str) -> Self {
        FeatureId::Name(v.to_string())
    }
}

impl From<String> for FeatureId {
    fn from(v: String) -> Self {
        FeatureId::Name(v)
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureId::Number(n) => write!(f, "{}", n),
            FeatureId::Name(s) => f.write_str(s),
        }
    }
}

/// A polygon feature with attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: FeatureId,
    /// Outer ring plus zero or more hole rings
    pub geometry: Polygon<f64>,
    pub properties: HashMap<String, AttributeValue>,
}

impl Feature {
    /// Create a new feature with no attributes
    pub fn new(id: impl Into<FeatureId>, geometry: Polygon<f64>) -> Self {
        Self {
            id: id.into(),
            geometry,
            properties: HashMap::new(),
        }
    }

    /// Same id and attributes, different geometry
    pub fn with_geometry(&self, geometry: Polygon<f64>) -> Self {
        Self {
            id: self.id.clone(),
            geometry,
            properties: self.properties.clone(),
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

/// Ordered collection of polygon features.
///
/// Order matters for partitioning and for id assignment, not for smoothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self { features: Vec::new() }
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

    /// Build a collection from bare polygons, numbering ids from 1
    pub fn from_polygons(polygons: impl IntoIterator<Item = Polygon<f64>>) -> Self {
        polygons
            .into_iter()
            .enumerate()
            .map(|(i, p)| Feature::new(i as u64 + 1, p))
            .collect()
    }

    /// Append all features of `other`, preserving order
    pub fn extend(&mut self, other: FeatureCollection) {
        self.features.extend(other.features);
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

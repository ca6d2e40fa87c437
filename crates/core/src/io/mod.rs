//! Input feature source and output sink collaborators
//!
//! Only GeoJSON is supported. Both sides are simple adapters around the
//! `geojson` crate; the smoothing pipeline itself only sees
//! `FeatureCollection` values.

mod geojson_io;

pub use geojson_io::{
    features_to_geojson, read_features, read_features_from_str, GeoJsonSink, ReadOutcome,
};

use crate::crs::CRS;
use crate::error::Result;
use crate::vector::FeatureCollection;

/// Output sink for the final feature collection
pub trait FeatureSink {
    /// Short name used in stage-tagged error messages
    fn name(&self) -> &str;

    /// Persist the final features. Attributes (id, area) are already set.
    fn write(&mut self, features: &FeatureCollection, crs: &CRS) -> Result<()>;
}

/// Sink that keeps the last written collection in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub written: Option<FeatureCollection>,
}

impl FeatureSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn write(&mut self, features: &FeatureCollection, _crs: &CRS) -> Result<()> {
        self.written = Some(features.clone());
        Ok(())
    }
}

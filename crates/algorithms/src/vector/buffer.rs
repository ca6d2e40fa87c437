//! Buffer operations
//!
//! Offsets polygon boundaries outward (positive distance) or inward
//! (negative). Corners are rounded. A polygon can split into several
//! parts when shrunk, or lose holes when grown, so results are
//! multipolygons and collections are re-exploded to single parts.

use super::dissolve::explode;
use crate::maybe_rayon::*;
use geo::{Buffer, MultiPolygon, Polygon};
use ivmsmooth_core::{Feature, FeatureCollection};

/// Buffer a single polygon by `distance`
pub fn buffer_polygon(polygon: &Polygon<f64>, distance: f64) -> MultiPolygon<f64> {
    if distance == 0.0 {
        return MultiPolygon::new(vec![polygon.clone()]);
    }
    polygon.buffer(distance)
}

/// Buffer every feature, one output feature per resulting part.
///
/// Ids and attributes are kept; features that vanish (shrunk past zero
/// width) are dropped. Output order follows input order.
pub fn buffer_features(features: FeatureCollection, distance: f64) -> FeatureCollection {
    if distance == 0.0 {
        return features;
    }

    let parts: Vec<Vec<Feature>> = features
        .features
        .into_par_iter()
        .map(|f| explode(&f, buffer_polygon(&f.geometry, distance)))
        .collect();

    parts.into_iter().flatten().collect()
}

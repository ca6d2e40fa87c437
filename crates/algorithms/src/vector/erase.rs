//! Erase collaborators: subtract exclusion geometry from features

use super::dissolve::{explode, union_all};
use crate::maybe_rayon::*;
use geo::{BooleanOps, BoundingRect, Intersects, MultiPolygon};
use ivmsmooth_core::{Error, Feature, FeatureCollection, Result};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::debug;

/// Set difference of a feature collection and an exclusion layer.
///
/// Results keep the exterior + interior ring layout, one feature per
/// single part, with the source id and attributes.
pub trait Erase: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    fn erase(
        &self,
        features: FeatureCollection,
        exclusion: &FeatureCollection,
    ) -> Result<FeatureCollection>;
}

/// Passes features through untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct NoErase;

impl Erase for NoErase {
    fn name(&self) -> &str {
        "none"
    }

    fn erase(
        &self,
        features: FeatureCollection,
        _exclusion: &FeatureCollection,
    ) -> Result<FeatureCollection> {
        Ok(features)
    }
}

/// Polygon difference against the union of the exclusion layer
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanErase;

impl BooleanErase {
    fn erase_one(feature: Feature, mask: &MultiPolygon<f64>) -> Result<Vec<Feature>> {
        let disjoint = match (feature.geometry.bounding_rect(), mask.bounding_rect()) {
            (Some(a), Some(b)) => !a.intersects(&b),
            _ => true,
        };
        if disjoint {
            return Ok(vec![feature]);
        }

        let remaining = catch_unwind(AssertUnwindSafe(|| feature.geometry.difference(mask)))
            .map_err(|_| {
                Error::Other(format!("polygon difference panicked on feature {}", feature.id))
            })?;
        Ok(explode(&feature, remaining))
    }
}

impl Erase for BooleanErase {
    fn name(&self) -> &str {
        "boolean"
    }

    fn erase(
        &self,
        features: FeatureCollection,
        exclusion: &FeatureCollection,
    ) -> Result<FeatureCollection> {
        if exclusion.is_empty() {
            return Ok(features);
        }

        for f in exclusion.iter().chain(features.iter()) {
            let finite = f
                .geometry
                .exterior()
                .0
                .iter()
                .chain(f.geometry.interiors().iter().flat_map(|r| r.0.iter()))
                .all(|c| c.x.is_finite() && c.y.is_finite());
            if !finite {
                return Err(Error::Other(format!("feature {} has non-finite coordinates", f.id)));
            }
        }

        let mask = union_all(exclusion.iter().map(|f| f.geometry.clone()).collect());
        debug!(parts = mask.0.len(), "exclusion layer unioned");

        let parts: Vec<Vec<Feature>> = features
            .features
            .into_par_iter()
            .map(|f| Self::erase_one(f, &mask))
            .collect::<Result<_>>()?;

        Ok(parts.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Area, LineString, Polygon};
    use ivmsmooth_core::{AttributeValue, FeatureId};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]),
            vec![],
        )
    }

    #[test]
    fn test_no_erase_passthrough() {
        let fc = FeatureCollection::from_polygons(vec![rect(0.0, 0.0, 10.0, 10.0)]);
        let exclusion = FeatureCollection::from_polygons(vec![rect(0.0, 0.0, 10.0, 10.0)]);
        assert_eq!(NoErase.erase(fc.clone(), &exclusion).unwrap(), fc);
    }

    #[test]
    fn test_difference_cuts_area() {
        let mut f = Feature::new(7u64, rect(0.0, 0.0, 10.0, 10.0));
        f.set_property("HANDLE", AttributeValue::String("Z".into()));
        let fc: FeatureCollection = vec![f].into_iter().collect();
        let exclusion = FeatureCollection::from_polygons(vec![rect(5.0, -1.0, 11.0, 11.0)]);

        let out = BooleanErase.erase(fc, &exclusion).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.features[0].id, FeatureId::Number(7));
        assert_eq!(
            out.features[0].get_property("HANDLE"),
            Some(&AttributeValue::String("Z".into()))
        );
        assert!((out.features[0].geometry.unsigned_area() - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_difference_splits_into_parts() {
        let fc = FeatureCollection::from_polygons(vec![rect(0.0, 0.0, 30.0, 10.0)]);
        let exclusion = FeatureCollection::from_polygons(vec![rect(10.0, -5.0, 20.0, 15.0)]);
        let out = BooleanErase.erase(fc, &exclusion).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|f| f.id == FeatureId::Number(1)));
    }

    #[test]
    fn test_difference_creates_hole() {
        let fc = FeatureCollection::from_polygons(vec![rect(0.0, 0.0, 10.0, 10.0)]);
        let exclusion = FeatureCollection::from_polygons(vec![rect(4.0, 4.0, 6.0, 6.0)]);
        let out = BooleanErase.erase(fc, &exclusion).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.features[0].geometry.interiors().len(), 1);
        assert!((out.features[0].geometry.unsigned_area() - 96.0).abs() < 1e-3);
    }

    #[test]
    fn test_fully_covered_feature_removed() {
        let fc = FeatureCollection::from_polygons(vec![
            rect(0.0, 0.0, 10.0, 10.0),
            rect(100.0, 0.0, 110.0, 10.0),
        ]);
        // Two overlapping exclusion polygons are unioned first
        let exclusion = FeatureCollection::from_polygons(vec![
            rect(-1.0, -1.0, 6.0, 11.0),
            rect(5.0, -1.0, 11.0, 11.0),
        ]);
        let out = BooleanErase.erase(fc, &exclusion).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.features[0].id, FeatureId::Number(2));
    }

    #[test]
    fn test_non_finite_input_is_error() {
        let bad = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (f64::NAN, 0.0), (1.0, 1.0), (0.0, 0.0)]),
            vec![],
        );
        let fc = FeatureCollection::from_polygons(vec![bad]);
        let exclusion = FeatureCollection::from_polygons(vec![rect(0.0, 0.0, 1.0, 1.0)]);
        assert!(BooleanErase.erase(fc, &exclusion).is_err());
    }
}

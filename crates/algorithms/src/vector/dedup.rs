//! Duplicate removal by representative point
//!
//! Two polygons count as duplicates when their centroids are bit-for-bit
//! identical. Smoothing, union and buffer are deterministic, so copies of
//! the same input boundary end up with exactly the same centroid.

use geo::{Centroid, Polygon};
use ivmsmooth_core::FeatureCollection;
use std::collections::HashSet;
use tracing::trace;

/// Exact bit pattern of a representative point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointSignature(u64, u64);

/// Signature of the polygon's centroid, `None` for empty polygons
pub fn point_signature(polygon: &Polygon<f64>) -> Option<PointSignature> {
    polygon
        .centroid()
        .map(|p| PointSignature(canonical_bits(p.x()), canonical_bits(p.y())))
}

/// -0.0 and 0.0 describe the same location
fn canonical_bits(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

/// Keep the first feature for each signature, drop later ones.
///
/// Returns the kept features in their original order and how many were
/// removed. Features without a signature are always kept.
pub fn dedup_by_representative_point(features: FeatureCollection) -> (FeatureCollection, usize) {
    let mut seen: HashSet<PointSignature> = HashSet::with_capacity(features.len());
    let mut removed = 0;

    let kept = features
        .into_iter()
        .filter(|f| match point_signature(&f.geometry) {
            Some(sig) if !seen.insert(sig) => {
                trace!(feature = %f.id, "dropping duplicate");
                removed += 1;
                false
            }
            _ => true,
        })
        .collect();

    (kept, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::LineString;
    use ivmsmooth_core::{Feature, FeatureId};

    fn square(x: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (x, 0.0),
                (x + 10.0, 0.0),
                (x + 10.0, 10.0),
                (x, 10.0),
                (x, 0.0),
            ]),
            vec![],
        )
    }

    #[test]
    fn test_first_occurrence_kept() {
        let fc: FeatureCollection = vec![
            Feature::new(1u64, square(0.0)),
            Feature::new(2u64, square(50.0)),
            Feature::new(3u64, square(0.0)),
            Feature::new(4u64, square(50.0)),
            Feature::new(5u64, square(0.0)),
        ]
        .into_iter()
        .collect();

        let (kept, removed) = dedup_by_representative_point(fc);
        assert_eq!(removed, 3);
        let ids: Vec<FeatureId> = kept.iter().map(|f| f.id.clone()).collect();
        assert_eq!(ids, vec![FeatureId::Number(1), FeatureId::Number(2)]);
    }

    #[test]
    fn test_distinct_kept() {
        let fc = FeatureCollection::from_polygons(vec![square(0.0), square(0.5), square(1.0)]);
        let (kept, removed) = dedup_by_representative_point(fc);
        assert_eq!(removed, 0);
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_signed_zero_matches() {
        assert_eq!(canonical_bits(-0.0), canonical_bits(0.0));
        assert_ne!(canonical_bits(1.0), canonical_bits(-1.0));
    }

    #[test]
    fn test_empty_polygon_kept() {
        let empty = Polygon::new(LineString::new(vec![]), vec![]);
        assert!(point_signature(&empty).is_none());
        let fc = FeatureCollection::from_polygons(vec![empty.clone(), empty]);
        let (kept, removed) = dedup_by_representative_point(fc);
        assert_eq!((kept.len(), removed), (2, 0));
    }
}

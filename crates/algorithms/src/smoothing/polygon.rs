//! Polygon transformer: smooths every ring of a feature

use super::ring::{smooth_ring, SmoothingParams};
use geo::{LineString, Polygon};
use ivmsmooth_core::{
    Algorithm, Diagnostic, DiagnosticKind, Error, Feature, FeatureCollection, Result,
};
use tracing::debug;

/// A smoothed feature and the holes that could not be smoothed
#[derive(Debug, Clone)]
pub struct TransformOutcome {
    pub feature: Feature,
    /// Position among the input's interiors and reason, per dropped hole
    pub holes_dropped: Vec<(usize, String)>,
}

/// Smooth the outer ring and every hole of `feature`.
///
/// A failing outer ring fails the whole feature. A failing hole is left
/// out of the result as if it never existed. Id and attributes are kept.
pub fn transform_polygon(feature: &Feature, params: &SmoothingParams) -> Result<TransformOutcome> {
    let exterior = smooth_ring(feature.geometry.exterior(), params)?;

    let mut interiors: Vec<LineString<f64>> =
        Vec::with_capacity(feature.geometry.interiors().len());
    let mut holes_dropped = Vec::new();
    for (i, hole) in feature.geometry.interiors().iter().enumerate() {
        match smooth_ring(hole, params) {
            Ok(ring) => interiors.push(ring),
            Err(e) if e.is_degenerate() => {
                debug!(feature = %feature.id, hole = i, error = %e, "dropping hole ring");
                holes_dropped.push((i, e.to_string()));
            }
            Err(e) => return Err(e),
        }
    }

    Ok(TransformOutcome {
        feature: feature.with_geometry(Polygon::new(exterior, interiors)),
        holes_dropped,
    })
}

/// Output of smoothing a run of features
#[derive(Debug, Clone, Default)]
pub struct SmoothedFeatures {
    pub features: FeatureCollection,
    pub diagnostics: Vec<Diagnostic>,
    /// Features dropped because their outer ring was degenerate
    pub polygons_dropped: usize,
    pub holes_dropped: usize,
}

/// Smooth `features` in order, one output per input.
///
/// Degenerate features and holes are dropped and recorded as diagnostics.
/// `is_cancelled` is polled before each feature; once it returns true the
/// call stops with [`Error::Cancelled`] and partial output is discarded.
pub fn smooth_features<'a, I, F>(
    features: I,
    params: &SmoothingParams,
    is_cancelled: F,
) -> Result<SmoothedFeatures>
where
    I: IntoIterator<Item = &'a Feature>,
    F: Fn() -> bool,
{
    params.validate()?;

    let mut out = SmoothedFeatures::default();
    for feature in features {
        if is_cancelled() {
            return Err(Error::Cancelled);
        }

        match transform_polygon(feature, params) {
            Ok(outcome) => {
                for (hole, reason) in &outcome.holes_dropped {
                    out.diagnostics.push(
                        Diagnostic::new(
                            DiagnosticKind::DegenerateHole,
                            format!("hole {} dropped: {}", hole, reason),
                        )
                        .with_feature(feature.id.clone()),
                    );
                }
                out.holes_dropped += outcome.holes_dropped.len();
                out.features.push(outcome.feature);
            }
            Err(e) if e.is_degenerate() => {
                debug!(feature = %feature.id, error = %e, "dropping polygon");
                out.diagnostics.push(
                    Diagnostic::new(DiagnosticKind::DegeneratePolygon, e.to_string())
                        .with_feature(feature.id.clone()),
                );
                out.polygons_dropped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(out)
}

/// Polygon transformation as an [`Algorithm`]
#[derive(Debug, Clone, Copy, Default)]
pub struct PolygonSmoother;

impl Algorithm for PolygonSmoother {
    type Input = Feature;
    type Output = Feature;
    type Params = SmoothingParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "polygon_smoother"
    }

    fn description(&self) -> &'static str {
        "Smooth outer and hole rings of a polygon feature, dropping degenerate holes"
    }

    fn execute(&self, input: Feature, params: SmoothingParams) -> Result<Feature> {
        transform_polygon(&input, &params).map(|o| o.feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ivmsmooth_core::{diagnostics::count_kind, AttributeValue, FeatureId};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> LineString<f64> {
        LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)])
    }

    fn triangle() -> LineString<f64> {
        LineString::from(vec![(0.0, 0.0), (10.0, 0.0), (5.0, 8.0), (0.0, 0.0)])
    }

    #[test]
    fn test_keeps_id_and_attributes() {
        let mut f = Feature::new(42u64, Polygon::new(rect(0.0, 0.0, 100.0, 60.0), vec![]));
        f.set_property("HANDLE", AttributeValue::String("A7".into()));

        let out = transform_polygon(&f, &SmoothingParams::default()).unwrap();
        assert_eq!(out.feature.id, FeatureId::Number(42));
        assert_eq!(
            out.feature.get_property("HANDLE"),
            Some(&AttributeValue::String("A7".into()))
        );
        assert!(out.holes_dropped.is_empty());
        assert!(out.feature.geometry.exterior().0.len() > 5);
    }

    #[test]
    fn test_smooths_holes() {
        let poly = Polygon::new(
            rect(0.0, 0.0, 100.0, 100.0),
            vec![rect(40.0, 40.0, 60.0, 60.0)],
        );
        let out =
            transform_polygon(&Feature::new(1u64, poly), &SmoothingParams::default()).unwrap();
        assert_eq!(out.feature.geometry.interiors().len(), 1);
        assert!(out.feature.geometry.interiors()[0].0.len() > 5);
    }

    #[test]
    fn test_degenerate_hole_is_dropped() {
        let poly = Polygon::new(
            rect(0.0, 0.0, 100.0, 100.0),
            vec![
                triangle(),
                rect(40.0, 40.0, 60.0, 60.0),
            ],
        );
        let out =
            transform_polygon(&Feature::new(1u64, poly), &SmoothingParams::default()).unwrap();
        assert_eq!(out.holes_dropped.len(), 1);
        assert_eq!(out.holes_dropped[0].0, 0);
        assert_eq!(out.feature.geometry.interiors().len(), 1);
    }

    #[test]
    fn test_degenerate_outer_ring_fails() {
        let f = Feature::new(1u64, Polygon::new(triangle(), vec![]));
        let err = transform_polygon(&f, &SmoothingParams::default()).unwrap_err();
        assert!(err.is_degenerate());
    }

    #[test]
    fn test_smooth_features_drops_and_reports() {
        let features = vec![
            Feature::new(1u64, Polygon::new(rect(0.0, 0.0, 100.0, 60.0), vec![])),
            Feature::new(2u64, Polygon::new(triangle(), vec![])),
            Feature::new(
                3u64,
                Polygon::new(rect(200.0, 0.0, 300.0, 100.0), vec![triangle()]),
            ),
        ];

        let out = smooth_features(&features, &SmoothingParams::default(), || false).unwrap();
        assert_eq!(out.features.len(), 2);
        assert_eq!(out.polygons_dropped, 1);
        assert_eq!(out.holes_dropped, 1);
        assert_eq!(count_kind(&out.diagnostics, DiagnosticKind::DegeneratePolygon), 1);
        assert_eq!(count_kind(&out.diagnostics, DiagnosticKind::DegenerateHole), 1);

        let ids: Vec<&FeatureId> = out.features.iter().map(|f| &f.id).collect();
        assert_eq!(ids, vec![&FeatureId::Number(1), &FeatureId::Number(3)]);
        assert_eq!(out.diagnostics[0].feature, Some(FeatureId::Number(2)));
    }

    #[test]
    fn test_smooth_features_cancelled() {
        let features = vec![Feature::new(1u64, Polygon::new(rect(0.0, 0.0, 10.0, 10.0), vec![]))];
        let err = smooth_features(&features, &SmoothingParams::default(), || true).unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[test]
    fn test_invalid_params_propagate() {
        let features = vec![Feature::new(1u64, Polygon::new(rect(0.0, 0.0, 10.0, 10.0), vec![]))];
        let params = SmoothingParams {
            trim_neighbors: 0,
            ..Default::default()
        };
        assert!(matches!(
            smooth_features(&features, &params, || false),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_algorithm_trait() {
        let f = Feature::new(5u64, Polygon::new(rect(0.0, 0.0, 10.0, 10.0), vec![]));
        let out = PolygonSmoother.execute_default(f).unwrap();
        assert_eq!(out.id, FeatureId::Number(5));
    }
}

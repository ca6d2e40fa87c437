//! Ring smoothing
//!
//! Turns a jagged survey ring into a smooth curve passing through every
//! original vertex:
//!
//! 1. Seam padding: copies of vertices `1..=padding` are appended, so the
//!    curve around the start/end seam is shaped by real neighbors.
//! 2. Fit: quadratic interpolating spline through the padded list.
//! 3. Resample: `sample_count` equally spaced parameters.
//! 4. Seam trim: find the `trim_neighbors` resampled vertices nearest the
//!    anchor (original vertex `padding`) and drop everything before the
//!    smallest of their indices. The dropped stretch is the wrap-around
//!    artifact introduced by the padding.
//!
//! The padding of 3, 250 samples and 2-neighbor trim are empirically tuned
//! defaults; all three are configurable through [`SmoothingParams`].

use super::kdtree::KdTree;
use super::spline::QuadraticSpline;
use geo::{Coord, LineString};
use ivmsmooth_core::{Algorithm, Error, Result};
use serde::{Deserialize, Serialize};

/// Parameters for ring smoothing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingParams {
    /// Number of leading vertices (after the first) copied past the seam.
    /// The last copied vertex is the trim anchor. Default: 3
    pub padding: usize,
    /// Samples taken along the fitted curve. Below ~150 the output looks
    /// jagged; above ~500 it only costs time. Default: 250
    pub sample_count: usize,
    /// Nearest resampled vertices to the anchor considered for the trim
    /// point. Default: 2
    pub trim_neighbors: usize,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            padding: 3,
            sample_count: 250,
            trim_neighbors: 2,
        }
    }
}

impl SmoothingParams {
    pub fn validate(&self) -> Result<()> {
        if self.padding == 0 {
            return Err(Error::InvalidParameter {
                name: "padding",
                value: self.padding.to_string(),
                reason: "must be at least 1".into(),
            });
        }
        if self.sample_count < 2 {
            return Err(Error::InvalidParameter {
                name: "sample_count",
                value: self.sample_count.to_string(),
                reason: "must be at least 2".into(),
            });
        }
        if self.trim_neighbors == 0 {
            return Err(Error::InvalidParameter {
                name: "trim_neighbors",
                value: self.trim_neighbors.to_string(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Fewest distinct vertices a ring needs to be smoothed
    pub fn min_vertices(&self) -> usize {
        (self.padding + 1).max(4)
    }
}

/// Drop consecutive duplicate vertices and close the ring.
///
/// Returns the closed vertex list (first vertex repeated at the end).
/// Fails when fewer than `min_vertices` distinct vertices remain.
pub fn prepare_ring(ring: &LineString<f64>, min_vertices: usize) -> Result<Vec<Coord<f64>>> {
    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(ring.0.len() + 1);
    for c in ring.0.iter() {
        if !c.x.is_finite() || !c.y.is_finite() {
            return Err(Error::degenerate("ring has non-finite coordinates"));
        }
        if coords.last() != Some(c) {
            coords.push(*c);
        }
    }

    // Closing vertex is not counted as distinct
    while coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    let distinct = coords.len();
    if distinct < min_vertices {
        return Err(Error::degenerate(format!(
            "ring has {} distinct vertices, need at least {}",
            distinct, min_vertices
        )));
    }

    coords.push(coords[0]);
    Ok(coords)
}

/// Append copies of vertices `1..=padding` to the end of the list.
///
/// `coords` must hold more than `padding` vertices.
pub fn pad_seam(coords: &[Coord<f64>], padding: usize) -> Vec<Coord<f64>> {
    let mut padded = Vec::with_capacity(coords.len() + padding);
    padded.extend_from_slice(coords);
    padded.extend_from_slice(&coords[1..=padding]);
    padded
}

/// Index at which the smoothed ring starts: the smallest index among the
/// `neighbors` resampled vertices nearest `anchor`.
///
/// Always within `[0, samples.len())` for a non-empty sample list.
pub fn trim_index(samples: &[Coord<f64>], anchor: Coord<f64>, neighbors: usize) -> usize {
    KdTree::build(samples)
        .k_nearest(anchor, neighbors)
        .iter()
        .map(|r| r.index)
        .min()
        .unwrap_or(0)
}

/// Delete the resampled vertices before [`trim_index`]
pub fn trim_seam(
    mut samples: Vec<Coord<f64>>,
    anchor: Coord<f64>,
    neighbors: usize,
) -> Vec<Coord<f64>> {
    let start = trim_index(&samples, anchor, neighbors);
    samples.drain(..start);
    samples
}

/// Smooth one ring.
///
/// The result keeps the original winding order and is not explicitly
/// re-closed; closing is left to whoever builds the polygon.
pub fn smooth_ring(ring: &LineString<f64>, params: &SmoothingParams) -> Result<LineString<f64>> {
    params.validate()?;

    let coords = prepare_ring(ring, params.min_vertices())?;
    let anchor = coords[params.padding];

    let padded = pad_seam(&coords, params.padding);
    let samples = QuadraticSpline::interpolate(&padded)?.resample(params.sample_count);
    let trimmed = trim_seam(samples, anchor, params.trim_neighbors);

    Ok(LineString::new(trimmed))
}

/// Ring smoothing as an [`Algorithm`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RingSmoother;

impl Algorithm for RingSmoother {
    type Input = LineString<f64>;
    type Output = LineString<f64>;
    type Params = SmoothingParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "ring_smoother"
    }

    fn description(&self) -> &'static str {
        "Seam-padded quadratic spline fit, resampled and trimmed at the anchor vertex"
    }

    fn execute(&self, input: LineString<f64>, params: SmoothingParams) -> Result<LineString<f64>> {
        smooth_ring(&input, &params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Area, Contains, Point, Polygon};

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    fn square() -> LineString<f64> {
        LineString::from(vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)])
    }

    /// Segment crossings between non-adjacent edges of a closed ring
    fn self_intersections(coords: &[Coord<f64>]) -> usize {
        let n = coords.len();
        let cross = |a: Coord<f64>, b: Coord<f64>, p: Coord<f64>| {
            (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
        };
        let mut count = 0;
        for i in 0..n {
            for j in (i + 2)..n {
                if i == 0 && j == n - 1 {
                    continue;
                }
                let (a, b) = (coords[i], coords[(i + 1) % n]);
                let (p, q) = (coords[j], coords[(j + 1) % n]);
                if cross(a, b, p) * cross(a, b, q) < 0.0 && cross(p, q, a) * cross(p, q, b) < 0.0 {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn test_prepare_closes_and_dedupes() {
        let ring = LineString::from(vec![
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
        ]);
        let coords = prepare_ring(&ring, 4).unwrap();
        assert_eq!(coords.len(), 5);
        assert_eq!(coords.first(), coords.last());
    }

    #[test]
    fn test_prepare_keeps_closed_ring() {
        let coords = prepare_ring(&square(), 4).unwrap();
        assert_eq!(coords, square().0);
    }

    #[test]
    fn test_prepare_rejects_triangle() {
        let tri = LineString::from(vec![(0.0, 0.0), (10.0, 0.0), (5.0, 8.0), (0.0, 0.0)]);
        assert!(prepare_ring(&tri, 4).unwrap_err().is_degenerate());
    }

    #[test]
    fn test_prepare_counts_distinct_after_dedupe() {
        let ring = LineString::from(vec![
            (0.0, 0.0),
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 0.0),
            (5.0, 8.0),
            (0.0, 0.0),
        ]);
        assert!(prepare_ring(&ring, 4).unwrap_err().is_degenerate());
    }

    #[test]
    fn test_pad_seam_appends_vertices_one_to_three() {
        let coords = prepare_ring(&square(), 4).unwrap();
        let padded = pad_seam(&coords, 3);
        assert_eq!(padded.len(), coords.len() + 3);
        assert_eq!(&padded[5..], &[c(10.0, 0.0), c(10.0, 10.0), c(0.0, 10.0)]);
        assert_eq!(&padded[..5], coords.as_slice());
    }

    #[test]
    fn test_resampled_length_is_sample_count() {
        let coords = prepare_ring(&square(), 4).unwrap();
        let padded = pad_seam(&coords, 3);
        let samples = QuadraticSpline::interpolate(&padded).unwrap().resample(250);
        assert_eq!(samples.len(), 250);
    }

    #[test]
    fn test_trim_index_picks_smaller_of_two_neighbors() {
        // The anchor sits exactly on the last sample and near sample 3
        let samples = vec![
            c(0.0, 0.0),
            c(1.0, 0.0),
            c(2.0, 0.0),
            c(3.0, 0.1),
            c(3.0, 3.0),
            c(0.0, 3.0),
            c(3.0, 0.0),
        ];
        assert_eq!(trim_index(&samples, c(3.0, 0.0), 2), 3);
        assert_eq!(trim_index(&samples, c(3.0, 0.0), 1), 6);
        assert_eq!(trim_seam(samples, c(3.0, 0.0), 2).len(), 4);
    }

    #[test]
    fn test_trim_index_in_range() {
        let coords = prepare_ring(&square(), 4).unwrap();
        let samples = QuadraticSpline::interpolate(&pad_seam(&coords, 3))
            .unwrap()
            .resample(250);
        let idx = trim_index(&samples, coords[3], 2);
        assert!(idx < 250);
        // The exact endpoint is one neighbor; the trim point is the first pass
        assert!(idx > 0 && idx < 249, "trim index {}", idx);
    }

    #[test]
    fn test_square_scenario() {
        let smoothed = smooth_ring(&square(), &SmoothingParams::default()).unwrap();
        let n = smoothed.0.len();
        assert!(n >= 1 && n < 250);
        assert!(n > 5, "smoothed ring must be denser than the input");

        // Ends on the anchor vertex, starts next to it: the curve is closed
        let first = smoothed.0[0];
        let last = smoothed.0[n - 1];
        assert_eq!(last, c(0.0, 10.0));
        assert!((first.x - last.x).hypot(first.y - last.y) < 0.5);

        assert_eq!(self_intersections(&smoothed.0), 0);

        let poly = Polygon::new(smoothed, vec![]);
        let area = poly.unsigned_area();
        // Convex curve through all four corners: encloses the square,
        // stays inside the circumscribed circle
        assert!(area >= 100.0 && area < 157.0, "area {}", area);
        assert!(poly.contains(&Point::new(5.0, 5.0)));
        assert!(poly.contains(&Point::new(0.5, 0.5)));
        assert!(poly.contains(&Point::new(9.5, 9.5)));
    }

    #[test]
    fn test_triangle_is_degenerate() {
        let tri = LineString::from(vec![(0.0, 0.0), (10.0, 0.0), (5.0, 8.0)]);
        let err = smooth_ring(&tri, &SmoothingParams::default()).unwrap_err();
        assert!(err.is_degenerate());
    }

    #[test]
    fn test_collinear_ring_is_degenerate() {
        let ring =
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0), (4.0, 0.0)]);
        let err = smooth_ring(&ring, &SmoothingParams::default()).unwrap_err();
        assert!(err.is_degenerate());
    }

    #[test]
    fn test_deterministic() {
        let ring = LineString::from(vec![
            (0.0, 0.0),
            (40.0, -3.0),
            (85.0, 4.0),
            (90.0, 50.0),
            (60.0, 70.0),
            (20.0, 66.0),
            (-4.0, 30.0),
            (0.0, 0.0),
        ]);
        let a = smooth_ring(&ring, &SmoothingParams::default()).unwrap();
        let b = smooth_ring(&ring, &SmoothingParams::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sample_count_is_configurable() {
        let params = SmoothingParams {
            sample_count: 500,
            ..Default::default()
        };
        let dense = smooth_ring(&square(), &params).unwrap();
        let sparse = smooth_ring(&square(), &SmoothingParams::default()).unwrap();
        assert!(dense.0.len() > sparse.0.len());
        assert!(dense.0.len() < 500);
    }

    #[test]
    fn test_invalid_params() {
        let params = SmoothingParams {
            sample_count: 1,
            ..Default::default()
        };
        assert!(matches!(
            smooth_ring(&square(), &params),
            Err(Error::InvalidParameter { name: "sample_count", .. })
        ));
    }

    #[test]
    fn test_algorithm_trait() {
        let out = RingSmoother.execute_default(square()).unwrap();
        assert_eq!(out, smooth_ring(&square(), &SmoothingParams::default()).unwrap());
        assert_eq!(RingSmoother.name(), "ring_smoother");
    }
}

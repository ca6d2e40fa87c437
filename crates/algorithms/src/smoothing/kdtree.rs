//! 2D k-d tree over curve vertices
//!
//! K-nearest queries over a resampled vertex list. Results
//! report the vertex's position in the input slice, which is what the
//! seam trim needs.
//!
//! Reference:
//! Bentley, J.L. (1975). Multidimensional binary search trees used
//! for associative searching. CACM, 18(9).

use geo::Coord;
use std::cmp::Ordering;

/// A 2D k-d tree for nearest-vertex queries.
#[derive(Debug)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    /// Vertices in input order
    points: Vec<Coord<f64>>,
}

#[derive(Debug)]
struct KdNode {
    /// Index into `points`
    point_idx: usize,
    /// Split axis: 0 = x, 1 = y
    axis: u8,
    left: Option<usize>,
    right: Option<usize>,
}

/// Result of a nearest-neighbor query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestResult {
    pub point: Coord<f64>,
    pub distance_sq: f64,
    /// Position of the vertex in the slice the tree was built from
    pub index: usize,
}

impl KdTree {
    /// Build a tree over `points`, O(n log n).
    pub fn build(points: &[Coord<f64>]) -> Self {
        if points.is_empty() {
            return Self {
                nodes: Vec::new(),
                points: Vec::new(),
            };
        }

        let mut indices: Vec<usize> = (0..points.len()).collect();
        let mut nodes = Vec::with_capacity(points.len());
        build_recursive(points, &mut indices, 0, &mut nodes);

        Self {
            nodes,
            points: points.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Up to `k` nearest vertices, sorted by ascending distance.
    ///
    /// Equal distances are ordered by ascending vertex index so the
    /// result does not depend on tree layout.
    pub fn k_nearest(&self, query: Coord<f64>, k: usize) -> Vec<NearestResult> {
        if self.nodes.is_empty() || k == 0 {
            return Vec::new();
        }

        // Sorted ascending; last element is the current k-th best
        let mut best: Vec<(f64, usize)> = Vec::with_capacity(k + 1);
        self.knn_recursive(0, query, k, &mut best);

        best.into_iter()
            .map(|(dist_sq, idx)| self.result(dist_sq, idx))
            .collect()
    }

    fn result(&self, distance_sq: f64, index: usize) -> NearestResult {
        NearestResult {
            point: self.points[index],
            distance_sq,
            index,
        }
    }

    fn split_diff(&self, node: &KdNode, query: Coord<f64>) -> f64 {
        let p = self.points[node.point_idx];
        if node.axis == 0 {
            query.x - p.x
        } else {
            query.y - p.y
        }
    }

    fn knn_recursive(
        &self,
        node_idx: usize,
        query: Coord<f64>,
        k: usize,
        best: &mut Vec<(f64, usize)>,
    ) {
        let node = &self.nodes[node_idx];
        let candidate = (dist_sq(self.points[node.point_idx], query), node.point_idx);

        let pos = best
            .binary_search_by(|entry| compare(entry, &candidate))
            .unwrap_or_else(|e| e);
        if pos < k {
            best.insert(pos, candidate);
            best.truncate(k);
        }

        let diff = self.split_diff(node, query);
        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(child) = near {
            self.knn_recursive(child, query, k, best);
        }

        let threshold = if best.len() >= k {
            best[best.len() - 1].0
        } else {
            f64::MAX
        };
        if diff * diff <= threshold {
            if let Some(child) = far {
                self.knn_recursive(child, query, k, best);
            }
        }
    }
}

fn dist_sq(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

/// Order by distance, then by vertex index
fn compare(a: &(f64, usize), b: &(f64, usize)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}

fn build_recursive(
    points: &[Coord<f64>],
    indices: &mut [usize],
    depth: usize,
    nodes: &mut Vec<KdNode>,
) -> usize {
    let n = indices.len();
    let axis = (depth % 2) as u8;

    indices.sort_by(|&a, &b| {
        let (va, vb) = if axis == 0 {
            (points[a].x, points[b].x)
        } else {
            (points[a].y, points[b].y)
        };
        va.total_cmp(&vb).then(a.cmp(&b))
    });

    let median = n / 2;
    let node_idx = nodes.len();
    nodes.push(KdNode {
        point_idx: indices[median],
        axis,
        left: None,
        right: None,
    });

    let (left, rest) = indices.split_at_mut(median);
    if !left.is_empty() {
        let child = build_recursive(points, left, depth + 1, nodes);
        nodes[node_idx].left = Some(child);
    }
    let right = &mut rest[1..];
    if !right.is_empty() {
        let child = build_recursive(points, right, depth + 1, nodes);
        nodes[node_idx].right = Some(child);
    }

    node_idx
}

//! Quadratic interpolating B-spline curve
//!
//! Fits a parametric curve of degree 2 that passes exactly through an
//! ordered list of control points (zero smoothing tolerance).
//!
//! - Parameters: cumulative chord length, normalized to [0, 1]
//! - Knots: clamped at both ends; interior knots at the midpoints of
//!   consecutive parameters, which is the standard placement for
//!   interpolation with an even degree
//! - The collocation matrix is tridiagonal and totally positive, so it is
//!   solved by elimination without pivoting
//!
//! Degree 2 is fixed: cubic fits overshoot and can loop back on themselves
//! near sharp survey corners.
//!
//! Reference:
//! de Boor, C. (1978). A Practical Guide to Splines. Springer.
//! Piegl, L. & Tiller, W. (1997). The NURBS Book, 2nd ed., A2.1/A2.2.

use geo::Coord;
use ivmsmooth_core::{Error, Result};

/// Spline degree
pub const DEGREE: usize = 2;

/// Relative tolerance below which points count as collinear
const COLLINEAR_TOLERANCE: f64 = 1e-9;

/// Smallest usable pivot in the collocation solve
const PIVOT_TOLERANCE: f64 = 1e-14;

/// A clamped quadratic B-spline interpolating its input points
#[derive(Debug, Clone)]
pub struct QuadraticSpline {
    /// Parameter value of each interpolated point
    params: Vec<f64>,
    knots: Vec<f64>,
    control: Vec<Coord<f64>>,
}

impl QuadraticSpline {
    /// Fit the curve through `points`, in order.
    ///
    /// Fails with `DegenerateGeometry` when there are fewer than 3 points,
    /// when consecutive points coincide, when all points are collinear, or
    /// when the collocation system is singular.
    pub fn interpolate(points: &[Coord<f64>]) -> Result<Self> {
        let m = points.len();
        if m < DEGREE + 1 {
            return Err(Error::degenerate(format!(
                "spline fit needs at least {} points, got {}",
                DEGREE + 1,
                m
            )));
        }
        check_not_collinear(points)?;

        let params = chord_parameters(points)?;
        let knots = interpolation_knots(&params);

        // Collocation: row i holds B_{i-1}, B_i, B_{i+1} evaluated at params[i]
        let mut lower = vec![0.0; m];
        let mut diag = vec![0.0; m];
        let mut upper = vec![0.0; m];
        for (i, &u) in params.iter().enumerate() {
            let span = find_span(&knots, m, u);
            let basis = basis_functions(&knots, span, u);
            for (r, &value) in basis.iter().enumerate() {
                let col = span - DEGREE + r;
                match col as isize - i as isize {
                    -1 => lower[i] = value,
                    0 => diag[i] = value,
                    1 => upper[i] = value,
                    _ if value.abs() <= PIVOT_TOLERANCE => {}
                    _ => {
                        return Err(Error::degenerate(
                            "collocation matrix is not tridiagonal",
                        ))
                    }
                }
            }
        }

        let mut control = points.to_vec();
        solve_tridiagonal(&lower, &mut diag, &upper, &mut control)?;

        Ok(Self {
            params,
            knots,
            control,
        })
    }

    /// Evaluate the curve at parameter `u` (clamped to [0, 1])
    pub fn evaluate(&self, u: f64) -> Coord<f64> {
        let u = u.clamp(0.0, 1.0);
        let span = find_span(&self.knots, self.control.len(), u);
        let basis = basis_functions(&self.knots, span, u);

        let mut point = Coord { x: 0.0, y: 0.0 };
        for (r, &b) in basis.iter().enumerate() {
            point = point + self.control[span - DEGREE + r] * b;
        }
        point
    }

    /// Evaluate at `count` equally spaced parameters spanning [0, 1]
    pub fn resample(&self, count: usize) -> Vec<Coord<f64>> {
        match count {
            0 => Vec::new(),
            1 => vec![self.evaluate(0.0)],
            _ => {
                let step = 1.0 / (count - 1) as f64;
                (0..count)
                    .map(|i| {
                        // Last sample lands exactly on u = 1
                        let u = if i == count - 1 { 1.0 } else { i as f64 * step };
                        self.evaluate(u)
                    })
                    .collect()
            }
        }
    }

    /// Parameter value of each interpolated point
    pub fn params(&self) -> &[f64] {
        &self.params
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    pub fn control_points(&self) -> &[Coord<f64>] {
        &self.control
    }
}

/// Cumulative chord-length parameters in [0, 1]
fn chord_parameters(points: &[Coord<f64>]) -> Result<Vec<f64>> {
    let mut params = Vec::with_capacity(points.len());
    params.push(0.0);
    let mut total = 0.0;
    for w in points.windows(2) {
        let d = w[1] - w[0];
        total += d.x.hypot(d.y);
        params.push(total);
    }

    if total <= 0.0 || !total.is_finite() {
        return Err(Error::degenerate("control points have zero total length"));
    }

    let min_chord = total * 1e-12;
    for w in params.windows(2) {
        if w[1] - w[0] <= min_chord {
            return Err(Error::degenerate("consecutive control points coincide"));
        }
    }

    for p in params.iter_mut() {
        *p /= total;
    }
    if let Some(last) = params.last_mut() {
        *last = 1.0;
    }
    Ok(params)
}

/// Clamped knot vector of length `m + DEGREE + 1` for `m` parameters
fn interpolation_knots(params: &[f64]) -> Vec<f64> {
    let m = params.len();
    let mut knots = Vec::with_capacity(m + DEGREE + 1);
    knots.extend(std::iter::repeat(0.0).take(DEGREE + 1));
    for j in 1..m - DEGREE {
        knots.push(0.5 * (params[j] + params[j + 1]));
    }
    knots.extend(std::iter::repeat(1.0).take(DEGREE + 1));
    knots
}

/// Knot span containing `u`, for `n` control points
fn find_span(knots: &[f64], n: usize, u: f64) -> usize {
    if u >= knots[n] {
        return n - 1;
    }
    if u <= knots[DEGREE] {
        return DEGREE;
    }

    let mut low = DEGREE;
    let mut high = n;
    let mut mid = (low + high) / 2;
    while u < knots[mid] || u >= knots[mid + 1] {
        if u < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

/// Non-zero basis functions `B_{span-2..=span}` at `u`
fn basis_functions(knots: &[f64], span: usize, u: f64) -> [f64; DEGREE + 1] {
    let mut n = [0.0; DEGREE + 1];
    let mut left = [0.0; DEGREE + 1];
    let mut right = [0.0; DEGREE + 1];
    n[0] = 1.0;

    for j in 1..=DEGREE {
        left[j] = u - knots[span + 1 - j];
        right[j] = knots[span + j] - u;
        let mut saved = 0.0;
        for r in 0..j {
            let temp = n[r] / (right[r + 1] + left[j - r]);
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        n[j] = saved;
    }
    n
}

/// Solve a tridiagonal system in place; `rhs` becomes the solution.
///
/// `lower[0]` and `upper[m-1]` are ignored.
fn solve_tridiagonal(
    lower: &[f64],
    diag: &mut [f64],
    upper: &[f64],
    rhs: &mut [Coord<f64>],
) -> Result<()> {
    let m = diag.len();

    // Forward elimination
    for i in 0..m {
        if i > 0 {
            let factor = lower[i] / diag[i - 1];
            diag[i] -= factor * upper[i - 1];
            rhs[i] = rhs[i] - rhs[i - 1] * factor;
        }
        if diag[i].abs() < PIVOT_TOLERANCE {
            return Err(Error::degenerate(
                "singular collocation system (points may be duplicate)",
            ));
        }
    }

    // Back substitution
    rhs[m - 1] = rhs[m - 1] / diag[m - 1];
    for i in (0..m - 1).rev() {
        rhs[i] = (rhs[i] - rhs[i + 1] * upper[i]) / diag[i];
    }
    Ok(())
}

fn check_not_collinear(points: &[Coord<f64>]) -> Result<()> {
    let origin = points[0];
    let dist_sq = |c: &Coord<f64>| {
        let d = *c - origin;
        d.x * d.x + d.y * d.y
    };

    let far = points
        .iter()
        .copied()
        .max_by(|a, b| dist_sq(a).total_cmp(&dist_sq(b)))
        .unwrap_or(origin);
    let axis = far - origin;
    let axis_len_sq = axis.x * axis.x + axis.y * axis.y;

    let max_cross = points
        .iter()
        .map(|p| {
            let v = *p - origin;
            (axis.x * v.y - axis.y * v.x).abs()
        })
        .fold(0.0_f64, f64::max);

    if axis_len_sq <= 0.0 || max_cross <= COLLINEAR_TOLERANCE * axis_len_sq {
        return Err(Error::degenerate("control points are collinear"));
    }
    Ok(())
}

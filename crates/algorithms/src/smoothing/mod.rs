//! Boundary smoothing
//!
//! - [`spline`]: quadratic interpolating B-spline
//! - [`kdtree`]: nearest-vertex search used by the seam trim
//! - [`ring`]: the ring smoother (pad, fit + resample, trim)
//! - [`polygon`]: applies the ring smoother to outer and hole rings

pub mod kdtree;
mod polygon;
mod ring;
pub mod spline;

pub use polygon::{
    smooth_features, transform_polygon, PolygonSmoother, SmoothedFeatures, TransformOutcome,
};
pub use ring::{
    pad_seam, prepare_ring, smooth_ring, trim_index, trim_seam, RingSmoother, SmoothingParams,
};
pub use spline::QuadraticSpline;

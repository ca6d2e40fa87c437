//! # ivmsmooth Algorithms
//!
//! Boundary smoothing and the geometry steps around it.
//!
//! ## Modules
//!
//! - **smoothing**: quadratic spline fit, seam pad/trim, ring and polygon smoothers
//! - **vector**: dissolve, buffer, area, duplicate removal, erase
//! - **merge**: reassembly of partition results into the final dataset

pub(crate) mod maybe_rayon;

pub mod merge;
pub mod smoothing;
pub mod vector;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::merge::{merge, MergeOutcome, MergeParams, MergeReport};
    pub use crate::smoothing::{
        smooth_features, smooth_ring, transform_polygon, PolygonSmoother, RingSmoother,
        SmoothedFeatures, SmoothingParams,
    };
    pub use crate::vector::{AreaMethod, BooleanErase, Erase, NoErase};
    pub use ivmsmooth_core::prelude::*;
}

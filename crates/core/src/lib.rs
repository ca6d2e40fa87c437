//! # ivmsmooth Core
//!
//! Core types, traits and I/O for the ivmsmooth boundary-smoothing pipeline.
//!
//! This crate provides:
//! - `Feature` / `FeatureCollection`: polygon features with an opaque id
//! - `CRS`: coordinate system descriptor with its linear unit
//! - `Error` and `Diagnostic`: fatal errors vs. recovered per-feature conditions
//! - `Algorithm`: common trait for the smoothing algorithms
//! - GeoJSON input and the `FeatureSink` output interface

pub mod crs;
pub mod diagnostics;
pub mod error;
pub mod io;
pub mod vector;

pub use crs::{LinearUnit, CRS};
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use error::{Error, Result};
pub use vector::{AttributeValue, Feature, FeatureCollection, FeatureId};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::{LinearUnit, CRS};
    pub use crate::diagnostics::{Diagnostic, DiagnosticKind};
    pub use crate::error::{Error, Result};
    pub use crate::vector::{AttributeValue, Feature, FeatureCollection, FeatureId};
    pub use crate::Algorithm;
}

/// A smoothing step run on one geometry with its own parameter type.
///
/// Implementors hold no state, so one value can be shared by every worker.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(
        &self,
        input: Self::Input,
        params: Self::Params,
    ) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(
        &self,
        input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}

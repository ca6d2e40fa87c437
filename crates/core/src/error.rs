//! Error types for ivmsmooth

use thiserror::Error;

/// Main error type for ivmsmooth operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// A ring has too few usable points, or its points are collinear or
    /// duplicated so that the curve fit cannot be solved.
    #[error("Degenerate geometry: {reason}")]
    DegenerateGeometry { reason: String },

    #[error("Partition {partition} failed: {reason}")]
    PartitionFailure { partition: usize, reason: String },

    /// Erase, input or output-sink failure. Always fatal to the run.
    #[error("{stage} stage failed{context}: {message}")]
    ExternalCollaboratorFailure {
        stage: &'static str,
        context: String,
        message: String,
    },

    #[error("Pipeline cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a degenerate-geometry error.
    pub fn degenerate(reason: impl Into<String>) -> Self {
        Error::DegenerateGeometry {
            reason: reason.into(),
        }
    }

    /// Wrap any failure at a collaborator boundary, tagging it with the stage
    /// name and optional context such as a feature or partition identifier.
    pub fn collaborator(
        stage: &'static str,
        context: Option<String>,
        source: impl std::fmt::Display,
    ) -> Self {
        Error::ExternalCollaboratorFailure {
            stage,
            context: context.map(|c| format!(" ({})", c)).unwrap_or_default(),
            message: source.to_string(),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, Error::DegenerateGeometry { .. })
    }
}

impl From<geojson::Error> for Error {
    fn from(e: geojson::Error) -> Self {
        Error::GeoJson(e.to_string())
    }
}

/// Result type alias for ivmsmooth operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_message_carries_stage_and_context() {
        let err = Error::collaborator("erase", Some("feature 17".into()), "clipping failed");
        assert_eq!(err.to_string(), "erase stage failed (feature 17): clipping failed");
    }

    #[test]
    fn test_collaborator_without_context() {
        let err = Error::collaborator("output", None, "disk full");
        assert_eq!(err.to_string(), "output stage failed: disk full");
    }

    #[test]
    fn test_is_degenerate() {
        assert!(Error::degenerate("3 vertices").is_degenerate());
        assert!(!Error::Cancelled.is_degenerate());
    }
}

//! Non-fatal conditions recorded during a pipeline run.
//!
//! Per-feature and per-partition failures degrade gracefully: the offending
//! ring, polygon or partition is dropped and a `Diagnostic` is kept so the
//! run can report how many features were removed and why.

use crate::vector::FeatureId;
use serde::Serialize;
use std::fmt;

/// Category of a recorded condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    /// Outer ring could not be smoothed; the whole polygon was dropped
    DegeneratePolygon,
    /// Hole ring could not be smoothed; the hole was dropped
    DegenerateHole,
    /// A worker produced an empty or partial result
    PartitionFailure,
    /// Union/dissolve produced zero polygons or an unexpected part count
    MergeInconsistency,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticKind::DegeneratePolygon => "degenerate polygon",
            DiagnosticKind::DegenerateHole => "degenerate hole",
            DiagnosticKind::PartitionFailure => "partition failure",
            DiagnosticKind::MergeInconsistency => "merge inconsistency",
        };
        f.write_str(s)
    }
}

/// A recorded, recovered condition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Partition index, when the condition arose inside a worker
    pub partition: Option<usize>,
    /// Feature identifier, when the condition concerns a single feature
    pub feature: Option<FeatureId>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            partition: None,
            feature: None,
            message: message.into(),
        }
    }

    pub fn with_partition(mut self, partition: usize) -> Self {
        self.partition = Some(partition);
        self
    }

    pub fn with_feature(mut self, feature: FeatureId) -> Self {
        self.feature = Some(feature);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(p) = self.partition {
            write!(f, " [partition {}]", p)?;
        }
        if let Some(id) = &self.feature {
            write!(f, " [feature {}]", id)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Count diagnostics of one kind
pub fn count_kind(diagnostics: &[Diagnostic], kind: DiagnosticKind) -> usize {
    diagnostics.iter().filter(|d| d.kind == kind).count()
}

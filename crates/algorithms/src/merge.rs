//! Merger and post-processor
//!
//! Reassembles per-partition smoothing results into the final dataset:
//!
//! a. concatenate partition outputs in partition order
//! b. union everything and split back into single parts
//! c. buffer outward to make up for smoothing shrinkage
//! d. subtract exclusion geometry (erase collaborator)
//! e. number the survivors 1, 2, 3, ...
//! f. measure area, drop polygons below the threshold
//! g. drop later polygons whose representative point repeats an earlier one

use crate::vector::{
    buffer_features, dedup_by_representative_point, dissolve, polygon_area, AreaMethod, Erase,
};
use ivmsmooth_core::{
    AttributeValue, Diagnostic, DiagnosticKind, Error, FeatureCollection, LinearUnit, Result,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Parameters for the merge stage, in the working CRS's units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeParams {
    /// Outward buffer applied after the union. Default: 0.25
    pub buffer_distance: f64,
    /// Smallest area kept, in squared `area_unit` for geodesic areas and
    /// squared CRS units for planar ones. Default: 4356 (0.1 acre in
    /// square feet)
    pub min_area: f64,
    pub area_method: AreaMethod,
    /// Unit geodesic areas are reported in. Default: feet
    pub area_unit: LinearUnit,
    /// Attribute receiving the sequential id. Default: "IVM_ID"
    pub id_field: String,
    /// Attribute receiving the measured area. Default: "AREA_SQFT"
    pub area_field: String,
}

impl Default for MergeParams {
    fn default() -> Self {
        Self {
            buffer_distance: 0.25,
            min_area: 4356.0,
            area_method: AreaMethod::Planar,
            area_unit: LinearUnit::Foot,
            id_field: "IVM_ID".to_string(),
            area_field: "AREA_SQFT".to_string(),
        }
    }
}

impl MergeParams {
    pub fn validate(&self) -> Result<()> {
        if !self.buffer_distance.is_finite() {
            return Err(Error::InvalidParameter {
                name: "buffer_distance",
                value: self.buffer_distance.to_string(),
                reason: "must be finite".into(),
            });
        }
        if !self.min_area.is_finite() || self.min_area < 0.0 {
            return Err(Error::InvalidParameter {
                name: "min_area",
                value: self.min_area.to_string(),
                reason: "must be finite and non-negative".into(),
            });
        }
        if self.area_unit.meters().is_none() {
            return Err(Error::InvalidParameter {
                name: "area_unit",
                value: self.area_unit.abbreviation().to_string(),
                reason: "areas need a linear unit".into(),
            });
        }
        if self.id_field.is_empty() || self.area_field.is_empty() {
            return Err(Error::InvalidParameter {
                name: "id_field/area_field",
                value: format!("{:?}/{:?}", self.id_field, self.area_field),
                reason: "attribute names must not be empty".into(),
            });
        }
        Ok(())
    }
}

/// Feature counts after each merge step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Features across all partition results
    pub input_features: usize,
    /// Single parts after the union
    pub dissolved_parts: usize,
    pub after_buffer: usize,
    pub after_erase: usize,
    pub removed_below_area: usize,
    pub removed_duplicates: usize,
    pub output_features: usize,
}

/// Final features plus what happened on the way
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub features: FeatureCollection,
    pub report: MergeReport,
    pub diagnostics: Vec<Diagnostic>,
}

/// Set `field` to 1, 2, 3, ... in collection order
pub fn assign_ids(features: &mut FeatureCollection, field: &str) {
    for (i, feature) in features.features.iter_mut().enumerate() {
        feature.set_property(field, AttributeValue::Int(i as i64 + 1));
    }
}

/// Record each feature's area in `params.area_field` and keep those with
/// `area >= params.min_area`. Returns the kept features and the removed
/// count.
pub fn filter_by_area(
    features: FeatureCollection,
    params: &MergeParams,
) -> (FeatureCollection, usize) {
    let before = features.len();
    let kept: FeatureCollection = features
        .into_iter()
        .filter_map(|mut f| {
            let area = polygon_area(&f.geometry, params.area_method, params.area_unit);
            f.set_property(&params.area_field, AttributeValue::Float(area));
            (area >= params.min_area).then_some(f)
        })
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}

/// Run merge steps a through g over the partition results, in order.
///
/// Union anomalies are recorded as `MergeInconsistency` diagnostics and
/// the run continues. An erase failure aborts the merge.
pub fn merge(
    results: Vec<FeatureCollection>,
    exclusion: &FeatureCollection,
    eraser: &dyn Erase,
    params: &MergeParams,
) -> Result<MergeOutcome> {
    params.validate()?;
    let mut report = MergeReport::default();
    let mut diagnostics = Vec::new();

    // a
    let mut combined = FeatureCollection::new();
    for partition in results {
        combined.extend(partition);
    }
    report.input_features = combined.len();

    // b
    let dissolved = dissolve(&combined);
    report.dissolved_parts = dissolved.len();
    if report.input_features > 0 && dissolved.is_empty() {
        warn!(input = report.input_features, "union produced no polygons");
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::MergeInconsistency,
            format!("union of {} polygons produced no polygons", report.input_features),
        ));
    } else if dissolved.len() > report.input_features {
        warn!(
            input = report.input_features,
            parts = dissolved.len(),
            "union produced more parts than inputs"
        );
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::MergeInconsistency,
            format!(
                "union of {} polygons produced {} parts",
                report.input_features,
                dissolved.len()
            ),
        ));
    }
    drop(combined);

    // c
    let buffered = buffer_features(dissolved, params.buffer_distance);
    report.after_buffer = buffered.len();
    debug!(distance = params.buffer_distance, parts = buffered.len(), "buffered");

    // d
    let mut erased = eraser
        .erase(buffered, exclusion)
        .map_err(|e| Error::collaborator("erase", Some(format!("eraser {}", eraser.name())), e))?;
    report.after_erase = erased.len();

    // e
    assign_ids(&mut erased, &params.id_field);

    // f
    let (sized, removed) = filter_by_area(erased, params);
    report.removed_below_area = removed;

    // g
    let (features, removed) = dedup_by_representative_point(sized);
    report.removed_duplicates = removed;
    report.output_features = features.len();

    info!(
        input = report.input_features,
        dissolved = report.dissolved_parts,
        erased = report.after_erase,
        below_area = report.removed_below_area,
        duplicates = report.removed_duplicates,
        output = report.output_features,
        "merge complete"
    );

    Ok(MergeOutcome {
        features,
        report,
        diagnostics,
    })
}

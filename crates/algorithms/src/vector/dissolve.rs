//! Dissolve: union polygons and split the result into single parts

use crate::maybe_rayon::*;
use geo::{BooleanOps, MultiPolygon, Polygon};
use ivmsmooth_core::{Feature, FeatureCollection};
use std::collections::HashMap;
use tracing::debug;

/// Union every polygon into one multipolygon.
///
/// Pairs are unioned level by level (1+2, 3+4, ... then the results
/// again), so the outcome only depends on the input order and not on
/// thread scheduling.
pub fn union_all(polygons: Vec<Polygon<f64>>) -> MultiPolygon<f64> {
    let mut level: Vec<MultiPolygon<f64>> = polygons
        .into_iter()
        .map(|p| MultiPolygon::new(vec![p]))
        .collect();
    if level.is_empty() {
        return MultiPolygon::new(Vec::new());
    }

    while level.len() > 1 {
        let mut pairs = Vec::with_capacity(level.len().div_ceil(2));
        let mut iter = level.into_iter();
        while let Some(a) = iter.next() {
            pairs.push((a, iter.next()));
        }

        level = pairs
            .into_par_iter()
            .map(|(a, b)| match b {
                Some(b) => a.union(&b),
                None => a,
            })
            .collect();
    }

    level.pop().unwrap_or_else(|| MultiPolygon::new(Vec::new()))
}

/// Union all features and explode the union into single-part features.
///
/// Attributes do not survive a full dissolve; parts are numbered from 1
/// in the order the union reports them.
pub fn dissolve(features: &FeatureCollection) -> FeatureCollection {
    let polygons: Vec<Polygon<f64>> = features.iter().map(|f| f.geometry.clone()).collect();
    let input = polygons.len();
    let merged = union_all(polygons);
    debug!(input, parts = merged.0.len(), "dissolved");
    FeatureCollection::from_polygons(merged.0)
}

/// Dissolve features sharing the same value of `field`.
///
/// Each group's union is split into single parts that carry the id and
/// attributes of the group's first member. Features without the
/// attribute, and single-member groups, pass through unchanged. Groups
/// are emitted in order of first appearance.
pub fn dissolve_by(features: &FeatureCollection, field: &str) -> FeatureCollection {
    let mut groups: Vec<Vec<&Feature>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for feature in features.iter() {
        match feature.get_property(field) {
            Some(value) => {
                let key = value.group_key();
                match index.get(&key) {
                    Some(&slot) => groups[slot].push(feature),
                    None => {
                        index.insert(key, groups.len());
                        groups.push(vec![feature]);
                    }
                }
            }
            None => groups.push(vec![feature]),
        }
    }

    let mut out = FeatureCollection::new();
    for group in groups {
        if let [single] = group.as_slice() {
            out.push((*single).clone());
            continue;
        }
        let first = group[0];
        let merged = union_all(group.iter().map(|f| f.geometry.clone()).collect());
        out.extend(explode(first, merged).into_iter().collect());
    }

    debug!(field, input = features.len(), output = out.len(), "dissolved by attribute");
    out
}

/// Split multipolygons into one feature per part, keeping id and attributes
pub fn explode(template: &Feature, parts: MultiPolygon<f64>) -> Vec<Feature> {
    parts.0.into_iter().map(|p| template.with_geometry(p)).collect()
}

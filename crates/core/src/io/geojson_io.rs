//! GeoJSON reading and writing

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::io::FeatureSink;
use crate::vector::{AttributeValue, Feature, FeatureCollection, FeatureId};
use geo_types::{Coord, LineString, Polygon};
use geojson::{feature::Id, GeoJson, Value};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Features read from a source, plus how many records were unusable
#[derive(Debug, Clone, Default)]
pub struct ReadOutcome {
    pub features: FeatureCollection,
    /// Records with null, empty or non-polygonal geometry
    pub skipped: usize,
}

/// Read a GeoJSON file into single-part polygon features.
///
/// Null and non-polygonal geometries are skipped; multipolygons are
/// exploded into one feature per part, each carrying the source id and
/// attributes.
pub fn read_features(path: impl AsRef<Path>) -> Result<ReadOutcome> {
    let path = path.as_ref();
    debug!(?path, "reading geojson");
    let contents = std::fs::read_to_string(path)?;
    read_features_from_str(&contents)
}

/// Parse GeoJSON text; see [`read_features`]
pub fn read_features_from_str(contents: &str) -> Result<ReadOutcome> {
    let geojson: GeoJson = contents.parse()?;

    let records: Vec<geojson::Feature> = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(g) => vec![geojson::Feature {
            bbox: None,
            geometry: Some(g),
            id: None,
            properties: None,
            foreign_members: None,
        }],
    };

    let mut outcome = ReadOutcome::default();
    for (i, record) in records.into_iter().enumerate() {
        let id = record
            .id
            .as_ref()
            .map(feature_id)
            .unwrap_or(FeatureId::Number(i as u64 + 1));
        let properties = record
            .properties
            .as_ref()
            .map(attributes_from_json)
            .unwrap_or_default();

        let polygons = match record.geometry.map(|g| g.value) {
            Some(value) => polygons_from_value(value)?,
            None => Vec::new(),
        };
        if polygons.is_empty() {
            trace!(%id, "skipping record without polygon geometry");
            outcome.skipped += 1;
            continue;
        }

        for polygon in polygons {
            outcome.features.push(Feature {
                id: id.clone(),
                geometry: polygon,
                properties: properties.clone(),
            });
        }
    }

    debug!(
        features = outcome.features.len(),
        skipped = outcome.skipped,
        "parsed geojson"
    );
    Ok(outcome)
}

fn feature_id(id: &Id) -> FeatureId {
    match id {
        Id::String(s) => FeatureId::Name(s.clone()),
        Id::Number(n) => match n.as_u64() {
            Some(v) => FeatureId::Number(v),
            None => FeatureId::Name(n.to_string()),
        },
    }
}

fn polygons_from_value(value: Value) -> Result<Vec<Polygon<f64>>> {
    let rings_sets = match value {
        Value::Polygon(rings) => vec![rings],
        Value::MultiPolygon(polys) => polys,
        Value::GeometryCollection(geoms) => {
            let mut out = Vec::new();
            for g in geoms {
                out.extend(polygons_from_value(g.value)?);
            }
            return Ok(out);
        }
        _ => Vec::new(),
    };

    let mut polygons = Vec::with_capacity(rings_sets.len());
    for rings in rings_sets {
        let mut rings = rings.into_iter();
        let exterior = match rings.next() {
            Some(r) => line_string(r)?,
            None => continue,
        };
        if exterior.0.is_empty() {
            continue;
        }
        let interiors = rings.map(line_string).collect::<Result<Vec<_>>>()?;
        polygons.push(Polygon::new(exterior, interiors));
    }
    Ok(polygons)
}

fn line_string(positions: Vec<Vec<f64>>) -> Result<LineString<f64>> {
    positions
        .into_iter()
        .map(|p| match (p.first(), p.get(1)) {
            (Some(&x), Some(&y)) => Ok(Coord { x, y }),
            _ => Err(Error::GeoJson("position with fewer than 2 coordinates".into())),
        })
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}

fn attributes_from_json(props: &Map<String, JsonValue>) -> HashMap<String, AttributeValue> {
    props
        .iter()
        .map(|(k, v)| {
            let value = match v {
                JsonValue::Null => AttributeValue::Null,
                JsonValue::Bool(b) => AttributeValue::Bool(*b),
                JsonValue::Number(n) => match n.as_i64() {
                    Some(i) => AttributeValue::Int(i),
                    None => AttributeValue::Float(n.as_f64().unwrap_or(f64::NAN)),
                },
                JsonValue::String(s) => AttributeValue::String(s.clone()),
                other => AttributeValue::String(other.to_string()),
            };
            (k.clone(), value)
        })
        .collect()
}

fn attribute_to_json(value: &AttributeValue) -> JsonValue {
    match value {
        AttributeValue::Null => JsonValue::Null,
        AttributeValue::Bool(b) => JsonValue::Bool(*b),
        AttributeValue::Int(i) => JsonValue::from(*i),
        AttributeValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        AttributeValue::String(s) => JsonValue::String(s.clone()),
    }
}

fn ring_positions(ring: &LineString<f64>) -> Vec<Vec<f64>> {
    ring.0.iter().map(|c| vec![c.x, c.y]).collect()
}

/// Convert features to a GeoJSON feature collection.
///
/// A `crs` member naming the coordinate system is attached the way
/// pre-RFC 7946 GeoJSON did, since the data is usually projected.
pub fn features_to_geojson(features: &FeatureCollection, crs: &CRS) -> geojson::FeatureCollection {
    let features = features
        .iter()
        .map(|f| {
            let mut rings = vec![ring_positions(f.geometry.exterior())];
            rings.extend(f.geometry.interiors().iter().map(ring_positions));

            // Sorted keys keep output byte-identical across runs
            let mut keys: Vec<&String> = f.properties.keys().collect();
            keys.sort();
            let properties: Map<String, JsonValue> = keys
                .into_iter()
                .map(|k| (k.clone(), attribute_to_json(&f.properties[k])))
                .collect();

            geojson::Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(Value::Polygon(rings))),
                id: Some(match &f.id {
                    FeatureId::Number(n) => Id::Number((*n).into()),
                    FeatureId::Name(s) => Id::String(s.clone()),
                }),
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    let mut crs_member = Map::new();
    crs_member.insert(
        "crs".to_string(),
        serde_json::json!({ "type": "name", "properties": { "name": crs.identifier() } }),
    );

    geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(crs_member),
    }
}

/// Writes the final collection to a GeoJSON file
#[derive(Debug, Clone)]
pub struct GeoJsonSink {
    path: PathBuf,
}

impl GeoJsonSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FeatureSink for GeoJsonSink {
    fn name(&self) -> &str {
        "geojson"
    }

    fn write(&mut self, features: &FeatureCollection, crs: &CRS) -> Result<()> {
        let fc = features_to_geojson(features, crs);
        let writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer(writer, &fc)?;
        debug!(path = ?self.path, features = features.len(), "wrote geojson");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "id": 7, "properties": {"HANDLE": "A1", "W": 2.5},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[10,0],[10,10],[0,10],[0,0]]]}},
            {"type": "Feature", "properties": null, "geometry": null},
            {"type": "Feature", "properties": {},
             "geometry": {"type": "LineString", "coordinates": [[0,0],[1,1]]}},
            {"type": "Feature", "id": "m", "properties": {"HANDLE": "B"},
             "geometry": {"type": "MultiPolygon", "coordinates": [
                [[[20,0],[30,0],[30,10],[20,0]]],
                [[[40,0],[50,0],[50,10],[40,0]], [[42,1],[44,1],[44,2],[42,1]]]
             ]}}
        ]
    }"#;

    #[test]
    fn test_read_skips_and_explodes() {
        let out = read_features_from_str(SAMPLE).unwrap();
        assert_eq!(out.skipped, 2);
        assert_eq!(out.features.len(), 3);

        let first = &out.features.features[0];
        assert_eq!(first.id, FeatureId::Number(7));
        assert_eq!(
            first.get_property("HANDLE"),
            Some(&AttributeValue::String("A1".into()))
        );
        assert_eq!(first.get_property("W"), Some(&AttributeValue::Float(2.5)));

        // Both parts of the multipolygon carry the source id
        assert_eq!(out.features.features[1].id, FeatureId::from("m"));
        assert_eq!(out.features.features[2].id, FeatureId::from("m"));
        assert_eq!(out.features.features[2].geometry.interiors().len(), 1);
    }

    #[test]
    fn test_bare_geometry_gets_sequential_id() {
        let out = read_features_from_str(
            r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}"#,
        )
        .unwrap();
        assert_eq!(out.features.len(), 1);
        assert_eq!(out.features.features[0].id, FeatureId::Number(1));
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(matches!(
            read_features_from_str("{not json"),
            Err(Error::GeoJson(_))
        ));
    }

    #[test]
    fn test_sink_writes_ids_and_crs() {
        let mut fc = read_features_from_str(SAMPLE).unwrap().features;
        fc.features[0].set_property("IVM_ID", AttributeValue::Int(1));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.geojson");
        let mut sink = GeoJsonSink::new(&path);
        sink.write(&fc, &CRS::default()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"IVM_ID\":1"));
        assert!(text.contains("LOCAL[ft]"));

        let back = read_features(&path).unwrap();
        assert_eq!(back.features.len(), 3);
        assert_eq!(back.skipped, 0);
        assert_eq!(back.features.features[0].geometry, fc.features[0].geometry);
    }
}

//! Coordinate reference system descriptor
//!
//! The pipeline never reprojects. A `CRS` is threaded through unchanged and
//! only tells the merge stage which linear unit the buffer distance and the
//! area threshold are expressed in, and whether coordinates are lon/lat.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Linear unit of a coordinate system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearUnit {
    Meter,
    Foot,
    UsSurveyFoot,
    /// Angular coordinates (lon/lat)
    Degree,
}

impl LinearUnit {
    /// Length of one unit in meters (`None` for angular units)
    pub fn meters(&self) -> Option<f64> {
        match self {
            LinearUnit::Meter => Some(1.0),
            LinearUnit::Foot => Some(0.3048),
            LinearUnit::UsSurveyFoot => Some(1200.0 / 3937.0),
            LinearUnit::Degree => None,
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            LinearUnit::Meter => "m",
            LinearUnit::Foot => "ft",
            LinearUnit::UsSurveyFoot => "ftUS",
            LinearUnit::Degree => "deg",
        }
    }
}

/// Coordinate reference system descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    /// EPSG code if known
    epsg: Option<u32>,
    /// WKT representation if available
    wkt: Option<String>,
    unit: LinearUnit,
}

impl CRS {
    /// Create a CRS from an EPSG code and its linear unit
    pub fn from_epsg(code: u32, unit: LinearUnit) -> Self {
        Self {
            epsg: Some(code),
            wkt: None,
            unit,
        }
    }

    /// Create a CRS from a WKT string and its linear unit
    pub fn from_wkt(wkt: impl Into<String>, unit: LinearUnit) -> Self {
        Self {
            epsg: None,
            wkt: Some(wkt.into()),
            unit,
        }
    }

    /// Unknown projected system measured in `unit`
    pub fn local(unit: LinearUnit) -> Self {
        Self {
            epsg: None,
            wkt: None,
            unit,
        }
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326, LinearUnit::Degree)
    }

    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    pub fn unit(&self) -> LinearUnit {
        self.unit
    }

    /// Whether coordinates are lon/lat
    pub fn is_geographic(&self) -> bool {
        self.unit == LinearUnit::Degree
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(wkt) = &self.wkt {
            // First 50 chars of WKT
            return format!("WKT:{}", &wkt[..wkt.len().min(50)]);
        }
        format!("LOCAL[{}]", self.unit.abbreviation())
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for CRS {
    /// Projected system in international feet, the unit the default
    /// buffer distance (0.25) and area threshold (4356) are tuned for.
    fn default() -> Self {
        Self::local(LinearUnit::Foot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crs_epsg() {
        let crs = CRS::from_epsg(2227, LinearUnit::UsSurveyFoot);
        assert_eq!(crs.epsg(), Some(2227));
        assert_eq!(crs.identifier(), "EPSG:2227");
        assert!(!crs.is_geographic());
    }

    #[test]
    fn test_wgs84_is_geographic() {
        let crs = CRS::wgs84();
        assert_eq!(crs, CRS::from_epsg(4326, LinearUnit::Degree));
        assert!(crs.is_geographic());
        assert_eq!(crs.unit().meters(), None);
    }

    #[test]
    fn test_default_is_feet() {
        let crs = CRS::default();
        assert_eq!(crs.unit(), LinearUnit::Foot);
        assert_eq!(crs.to_string(), "LOCAL[ft]");
        assert!((crs.unit().meters().unwrap() - 0.3048).abs() < 1e-12);
    }

    #[test]
    fn test_serde_unit_names() {
        let json = serde_json::to_string(&LinearUnit::UsSurveyFoot).unwrap();
        assert_eq!(json, "\"us_survey_foot\"");
    }
}

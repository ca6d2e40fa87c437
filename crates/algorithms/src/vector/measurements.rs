//! Polygon area

use geo::{Area, GeodesicArea, Polygon};
use ivmsmooth_core::{LinearUnit, CRS};
use serde::{Deserialize, Serialize};

/// How polygon area is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaMethod {
    /// Shoelace area in squared CRS units. For projected data.
    #[default]
    Planar,
    /// Area on the WGS84 ellipsoid. Coordinates must be lon/lat degrees.
    Geodesic,
}

impl AreaMethod {
    /// Geodesic for lon/lat systems, planar otherwise
    pub fn for_crs(crs: &CRS) -> Self {
        if crs.is_geographic() {
            AreaMethod::Geodesic
        } else {
            AreaMethod::Planar
        }
    }
}

/// Unsigned area of a polygon, holes excluded.
///
/// Planar areas are in squared coordinate units and `unit` is ignored.
/// Geodesic areas are converted from square meters to squared `unit`; an
/// angular `unit` leaves them in square meters.
pub fn polygon_area(polygon: &Polygon<f64>, method: AreaMethod, unit: LinearUnit) -> f64 {
    match method {
        AreaMethod::Planar => polygon.unsigned_area(),
        AreaMethod::Geodesic => {
            let square_meters = polygon.geodesic_area_unsigned();
            match unit.meters() {
                Some(m) => square_meters / (m * m),
                None => square_meters,
            }
        }
    }
}

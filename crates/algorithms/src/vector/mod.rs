//! Vector operations used around smoothing
//!
//! - Dissolve: union polygons (optionally grouped by attribute), split into parts
//! - Buffer: offset polygon boundaries
//! - Area: planar or geodesic polygon area
//! - Dedup: drop later copies of the same geometry
//! - Erase: subtract an exclusion layer

mod buffer;
mod dedup;
mod dissolve;
mod erase;
mod measurements;

pub use buffer::{buffer_features, buffer_polygon};
pub use dedup::{dedup_by_representative_point, point_signature, PointSignature};
pub use dissolve::{dissolve, dissolve_by, explode, union_all};
pub use erase::{BooleanErase, Erase, NoErase};
pub use measurements::{polygon_area, AreaMethod};

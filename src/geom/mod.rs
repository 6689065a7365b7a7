mod bbox;
mod crs;
mod distance;
mod geom;
mod validity;

use bbox::BoundingBox;
pub use crs::Crs;
pub(crate) use distance::{boundary_distance, point_distance};
pub(crate) use geom::{overlap_area, union_all, Geometries};
pub(crate) use validity::ensure_valid;

mod csv;
mod shp;

pub(crate) use csv::*;
pub use shp::read_shapefile;

use std::{fmt, path::Path, sync::{Arc, LazyLock}};

use geo::{Coord, MapCoords};
use proj4rs::{proj::Proj as Proj4, transform::transform};
use regex::Regex;
use tracing::debug;

use crate::{error::{CrosswalkError, Result}, geom::Geometries};

/// A coordinate reference system known by PROJ.4 definition.
#[derive(Debug)]
struct KnownCrs {
    epsg: u32,
    names: &'static [&'static str], // ESRI/OGC names found in .prj files without an EPSG tag
    proj4: &'static str,
    geographic: bool,               // Coordinates in degrees (radians for proj4rs)
}

const KNOWN_CRS: &[KnownCrs] = &[
    KnownCrs {
        epsg: 4269,
        names: &["GCS_North_American_1983", "NAD83"],
        proj4: "+proj=longlat +datum=NAD83 +no_defs +type=crs",
        geographic: true,
    },
    KnownCrs {
        epsg: 4326,
        names: &["GCS_WGS_1984", "WGS 84"],
        proj4: "+proj=longlat +datum=WGS84 +no_defs +type=crs",
        geographic: true,
    },
    KnownCrs {
        epsg: 3857,
        names: &["WGS_1984_Web_Mercator_Auxiliary_Sphere", "WGS 84 / Pseudo-Mercator"],
        proj4: "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs +type=crs",
        geographic: false,
    },
    KnownCrs {
        epsg: 3310,
        names: &["NAD_1983_California_Teale_Albers", "NAD83 / California Albers"],
        proj4: "+proj=aea +lat_0=0 +lon_0=-120 +lat_1=34 +lat_2=40.5 +x_0=0 +y_0=-4000000 +datum=NAD83 +units=m +no_defs +type=crs",
        geographic: false,
    },
    KnownCrs {
        epsg: 2227,
        names: &["NAD_1983_StatePlane_California_III_FIPS_0403_Feet", "NAD83 / California zone 3 (ftUS)"],
        proj4: "+proj=lcc +lat_0=36.5 +lon_0=-120.5 +lat_1=38.4333333333333 +lat_2=37.0666666666667 +x_0=2000000.0001016 +y_0=500000.0001016 +datum=NAD83 +units=us-ft +no_defs +type=crs",
        geographic: false,
    },
    KnownCrs {
        epsg: 26910,
        names: &["NAD_1983_UTM_Zone_10N", "NAD83 / UTM zone 10N"],
        proj4: "+proj=utm +zone=10 +datum=NAD83 +units=m +no_defs +type=crs",
        geographic: false,
    },
    KnownCrs {
        epsg: 32610,
        names: &["WGS_1984_UTM_Zone_10N", "WGS 84 / UTM zone 10N"],
        proj4: "+proj=utm +zone=10 +datum=WGS84 +units=m +no_defs +type=crs",
        geographic: false,
    },
];

static EPSG_AUTHORITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:AUTHORITY|ID)\s*\[\s*"EPSG"\s*,\s*"?(\d+)"?\s*\]"#).expect("valid regex")
});

static ROOT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*(?:PROJCS|GEOGCS|PROJCRS|GEOGCRS|GEODCRS)\s*\[\s*"([^"]+)""#).expect("valid regex")
});

/// Coordinate reference system of a layer: an EPSG code when one could be
/// determined, and the raw WKT when the layer came with a `.prj` sidecar.
#[derive(Debug, Clone)]
pub struct Crs {
    epsg: Option<u32>,
    wkt: Option<Arc<str>>,
}

impl Crs {
    pub fn from_epsg(epsg: u32) -> Self {
        Self { epsg: Some(epsg), wkt: None }
    }

    /// Interpret a WKT definition. The outermost EPSG authority wins; otherwise
    /// the root name is matched against well-known ESRI/OGC names.
    pub fn from_wkt(wkt: &str) -> Self {
        let wkt = wkt.trim();
        let epsg = EPSG_AUTHORITY.captures_iter(wkt)
            .last()
            .and_then(|caps| caps[1].parse().ok())
            .or_else(|| {
                let name = ROOT_NAME.captures(wkt)?.get(1)?.as_str().to_string();
                KNOWN_CRS.iter()
                    .find(|known| known.names.iter().any(|n| n.eq_ignore_ascii_case(&name)))
                    .map(|known| known.epsg)
            });
        Self { epsg, wkt: Some(Arc::from(wkt)) }
    }

    /// Read the `.prj` sidecar next to a shapefile, if there is one.
    pub fn read_prj(shp_path: &Path) -> Result<Option<Self>> {
        let prj = shp_path.with_extension("prj");
        if !prj.exists() { return Ok(None) }
        let wkt = std::fs::read_to_string(&prj)?;
        if wkt.trim().is_empty() { return Ok(None) }
        Ok(Some(Self::from_wkt(&wkt)))
    }

    #[inline] pub fn epsg(&self) -> Option<u32> { self.epsg }

    /// Whether two layers in these systems can be compared without reprojection.
    pub fn matches(&self, other: &Crs) -> bool {
        match (self.epsg, other.epsg, &self.wkt, &other.wkt) {
            (Some(a), Some(b), _, _) => a == b,
            (None, None, Some(a), Some(b)) => normalize_wkt(a) == normalize_wkt(b),
            _ => false,
        }
    }

    fn known(&self) -> Option<&'static KnownCrs> {
        let epsg = self.epsg?;
        KNOWN_CRS.iter().find(|known| known.epsg == epsg)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.epsg, &self.wkt) {
            (Some(epsg), _) => write!(f, "EPSG:{epsg}"),
            (None, Some(_)) => f.write_str("unrecognized WKT"),
            (None, None) => f.write_str("undefined"),
        }
    }
}

fn normalize_wkt(wkt: &str) -> String {
    wkt.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_ascii_uppercase()
}

impl Geometries {
    /// Reproject shapes into `target`. Returns the store unchanged when the systems already match.
    pub(crate) fn reproject(self, target: &Crs, layer: &str) -> Result<Geometries> {
        let source = self.crs()
            .ok_or_else(|| CrosswalkError::projection(layer, "layer has no coordinate reference system"))?;
        if source.matches(target) { return Ok(self) }

        let from = source.known()
            .ok_or_else(|| CrosswalkError::projection(layer, format!("cannot reproject from {source}")))?;
        let to = target.known()
            .ok_or_else(|| CrosswalkError::projection(layer, format!("cannot reproject to {target}")))?;

        debug!(layer, from = from.epsg, to = to.epsg, "reprojecting layer");

        let from_proj = Proj4::from_proj_string(from.proj4)
            .map_err(|e| CrosswalkError::projection(layer, format!("failed to build source PROJ.4 {}: {e:?}", from.proj4)))?;
        let to_proj = Proj4::from_proj_string(to.proj4)
            .map_err(|e| CrosswalkError::projection(layer, format!("failed to build target PROJ.4 {}: {e:?}", to.proj4)))?;

        // Geographic coordinates go through proj4rs in radians.
        let projected = self.shapes().iter()
            .map(|shape| shape.try_map_coords(|coord: Coord<f64>| {
                let mut point = if from.geographic {
                    (coord.x.to_radians(), coord.y.to_radians(), 0.0)
                } else {
                    (coord.x, coord.y, 0.0)
                };
                transform(&from_proj, &to_proj, &mut point)?;
                Ok::<_, proj4rs::errors::Error>(if to.geographic {
                    Coord { x: point.0.to_degrees(), y: point.1.to_degrees() }
                } else {
                    Coord { x: point.0, y: point.1 }
                })
            }))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CrosswalkError::projection(layer, format!("coordinate transform failed: {e:?}")))?;

        Ok(Geometries::new(projected, Some(target.clone())))
    }
}

#[cfg(test)]
mod tests {
    use geo::{polygon, MultiPolygon};

    use super::*;

    const NAD83_PRJ: &str = r#"GEOGCS["GCS_North_American_1983",DATUM["D_North_American_1983",SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

    #[test]
    fn epsg_authority_outermost_wins() {
        let wkt = r#"PROJCS["NAD83 / UTM zone 10N",GEOGCS["NAD83",AUTHORITY["EPSG","4269"]],UNIT["metre",1],AUTHORITY["EPSG","26910"]]"#;
        assert_eq!(Crs::from_wkt(wkt).epsg(), Some(26910));
    }

    #[test]
    fn esri_name_is_recognized() {
        assert_eq!(Crs::from_wkt(NAD83_PRJ).epsg(), Some(4269));
    }

    #[test]
    fn unknown_wkt_matches_only_itself() {
        let a = Crs::from_wkt(r#"PROJCS["Local_Grid",UNIT["Meter",1.0]]"#);
        let b = Crs::from_wkt(r#"PROJCS[ "Local_Grid", UNIT["Meter",1.0] ]"#);
        let c = Crs::from_wkt(r#"PROJCS["Other_Grid",UNIT["Meter",1.0]]"#);
        assert_eq!(a.epsg(), None);
        assert!(a.matches(&b));
        assert!(!a.matches(&c));
        assert!(!a.matches(&Crs::from_epsg(4269)));
    }

    #[test]
    fn missing_source_crs_is_a_projection_error() {
        let geoms = Geometries::new(vec![], None);
        assert!(matches!(
            geoms.reproject(&Crs::from_epsg(4269), "coarse"),
            Err(CrosswalkError::Projection { .. })
        ));
    }

    #[test]
    fn unsupported_epsg_is_a_projection_error() {
        let geoms = Geometries::new(vec![], Some(Crs::from_epsg(9999)));
        assert!(matches!(
            geoms.reproject(&Crs::from_epsg(4269), "coarse"),
            Err(CrosswalkError::Projection { .. })
        ));
    }

    #[test]
    fn lonlat_to_utm_moves_into_meters() {
        let shape = MultiPolygon(vec![polygon![
            (x: -122.5, y: 37.5),
            (x: -122.4, y: 37.5),
            (x: -122.4, y: 37.6),
            (x: -122.5, y: 37.6),
        ]]);
        let geoms = Geometries::new(vec![shape], Some(Crs::from_epsg(4269)));
        let projected = geoms.reproject(&Crs::from_epsg(26910), "coarse").unwrap();
        let first = projected.shape(0).0[0].exterior().0[0];
        assert!(first.x > 100_000.0 && first.x < 900_000.0, "easting {}", first.x);
        assert!(first.y > 4_000_000.0 && first.y < 4_300_000.0, "northing {}", first.y);
        assert_eq!(projected.crs().and_then(|crs| crs.epsg()), Some(26910));
    }

    #[test]
    fn matching_systems_skip_reprojection() {
        let geoms = Geometries::new(vec![], Some(Crs::from_epsg(4269)));
        assert!(geoms.reproject(&Crs::from_epsg(4269), "coarse").is_ok());
    }
}

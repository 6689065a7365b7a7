use std::collections::BTreeMap;

use geo::MultiPolygon;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    config::CrosswalkConfig,
    error::{CrosswalkError, Result},
    geom::{ensure_valid, union_all, Crs, Geometries},
    layer::RawLayer,
    types::{CoarseZone, FineZone, ZoneId, ZoneLevel},
};

/// Locate the column for `field` by alias, before any geometry is touched.
fn detect_column(raw: &RawLayer, field: &'static str, aliases: &[String]) -> Result<usize> {
    let col = raw.find_column(aliases).ok_or_else(|| CrosswalkError::IdentifierNotFound {
        layer: raw.name().to_string(),
        field,
        aliases: aliases.to_vec(),
        columns: raw.columns().to_vec(),
    })?;
    debug!(layer = raw.name(), field, column = %raw.columns()[col], "detected id column");
    Ok(col)
}

/// Read a required id value, erroring on empty cells.
fn required_value(rows: &[Vec<Option<String>>], layer: &str, columns: &[String], row: usize, col: usize) -> Result<ZoneId> {
    rows[row][col].as_deref()
        .map(ZoneId::new)
        .ok_or_else(|| CrosswalkError::MissingAttribute {
            layer: layer.to_string(),
            column: columns[col].clone(),
            row,
        })
}

/// Validate every shape, reporting the first invalid one in row order.
fn validate_shapes(shapes: &[MultiPolygon<f64>], label: impl Fn(usize) -> String + Sync) -> Result<()> {
    shapes.par_iter().enumerate()
        .map(|(i, shape)| ensure_valid(label(i), shape))
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

/// Resolve the CRS of a layer, preferring an explicit EPSG override.
fn layer_crs(raw: &RawLayer, override_epsg: Option<u32>) -> Option<Crs> {
    override_epsg.map(Crs::from_epsg).or_else(|| raw.crs().cloned())
}

/// The fine/medium zone layer: one fine zone per feature.
#[derive(Debug, Clone)]
pub struct FineLayer {
    zones: Vec<FineZone>,
    geoms: Geometries,
    id_column: String,
    medium_column: String,
}

impl FineLayer {
    /// Detect id columns and collect fine zones. Geometry validity is checked; CRS is not.
    pub fn from_raw(raw: RawLayer, config: &CrosswalkConfig) -> Result<Self> {
        let id_col = detect_column(&raw, "fine id", &config.aliases.fine)?;
        let medium_col = detect_column(&raw, "medium id", &config.aliases.medium)?;
        let crs = layer_crs(&raw, config.fine_epsg);
        let columns = raw.columns().to_vec();
        let (name, rows, shapes, _) = raw.into_parts();

        let zones = (0..rows.len())
            .map(|row| Ok(FineZone {
                id: required_value(&rows, &name, &columns, row, id_col)?,
                medium_id: required_value(&rows, &name, &columns, row, medium_col)?,
            }))
            .collect::<Result<Vec<_>>>()?;

        validate_shapes(&shapes, |i| format!("{} zone {}", ZoneLevel::Fine, zones[i].id))?;

        Ok(Self {
            zones,
            geoms: Geometries::new(shapes, crs),
            id_column: columns[id_col].clone(),
            medium_column: columns[medium_col].clone(),
        })
    }

    #[inline] pub fn len(&self) -> usize { self.zones.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.zones.is_empty() }

    #[inline] pub fn zones(&self) -> &[FineZone] { &self.zones }

    #[inline] pub fn shapes(&self) -> &[MultiPolygon<f64>] { self.geoms.shapes() }

    #[inline] pub fn crs(&self) -> Option<&Crs> { self.geoms.crs() }

    #[inline] pub fn id_column(&self) -> &str { &self.id_column }

    #[inline] pub fn medium_column(&self) -> &str { &self.medium_column }
}

/// The coarse zone layer, one zone per distinct coarse id, in the fine layer's CRS.
#[derive(Debug, Clone)]
pub struct CoarseLayer {
    zones: Vec<CoarseZone>,
    geoms: Geometries,
    id_column: String,
    region_column: Option<String>,
}

impl CoarseLayer {
    /// Detect id columns, merge features sharing an id, apply the region filter,
    /// and reproject into `target` when given.
    pub fn from_raw(raw: RawLayer, config: &CrosswalkConfig, target: Option<&Crs>) -> Result<Self> {
        let id_col = detect_column(&raw, "coarse id", &config.aliases.coarse)?;
        let region_col = raw.find_column(&config.aliases.coarse_region);
        let crs = layer_crs(&raw, config.coarse_epsg);
        let columns = raw.columns().to_vec();
        let (name, rows, shapes, _) = raw.into_parts();

        let ids = (0..rows.len())
            .map(|row| required_value(&rows, &name, &columns, row, id_col))
            .collect::<Result<Vec<_>>>()?;

        // Validate each source feature before any merge.
        validate_shapes(&shapes, |i| format!("{} zone {} (feature {i})", ZoneLevel::Coarse, ids[i]))?;

        // Group feature rows by coarse id; multi-part zones may span several features.
        let mut groups: BTreeMap<ZoneId, Vec<usize>> = BTreeMap::new();
        for (row, id) in ids.into_iter().enumerate() {
            groups.entry(id).or_default().push(row);
        }

        let mut zones = Vec::with_capacity(groups.len());
        let mut merged = Vec::with_capacity(groups.len());
        for (id, members) in groups {
            let region_code = match region_col {
                Some(col) => {
                    let mut codes = members.iter()
                        .filter_map(|&row| rows[row][col].as_deref())
                        .map(|code| config.normalize_code(code));
                    let first = codes.next();
                    if let Some(other) = codes.find(|code| Some(code) != first.as_ref()) {
                        return Err(CrosswalkError::geometry(
                            format!("{} zone {id}", ZoneLevel::Coarse),
                            format!("features disagree on region code ({:?} vs {other:?})", first.unwrap_or_default()),
                        ));
                    }
                    first
                }
                None => None,
            };

            if let (Some(filter), Some(code)) = (&config.region_filter, &region_code) {
                if !filter.iter().any(|keep| config.normalize_code(keep) == *code) { continue }
            }

            let shape = if members.len() == 1 {
                shapes[members[0]].clone()
            } else {
                union_all(members.iter().map(|&row| &shapes[row])).unwrap_or_else(|| MultiPolygon(vec![]))
            };
            zones.push(CoarseZone { id, region_code });
            merged.push(shape);
        }

        match (&config.region_filter, region_col) {
            (Some(_), None) => warn!(layer = %name, "region filter ignored: coarse layer has no region column"),
            (Some(_), Some(_)) => info!(layer = %name, kept = zones.len(), "applied region filter to coarse layer"),
            _ => {}
        }

        validate_shapes(&merged, |i| format!("{} zone {}", ZoneLevel::Coarse, zones[i].id))?;

        let mut geoms = Geometries::new(merged, crs);
        if let Some(target) = target {
            geoms = geoms.reproject(target, &name)?;
        }

        Ok(Self {
            zones,
            geoms,
            id_column: columns[id_col].clone(),
            region_column: region_col.map(|col| columns[col].clone()),
        })
    }

    #[inline] pub fn len(&self) -> usize { self.zones.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.zones.is_empty() }

    #[inline] pub fn zones(&self) -> &[CoarseZone] { &self.zones }

    #[inline] pub fn zone(&self, idx: usize) -> &CoarseZone { &self.zones[idx] }

    #[inline] pub fn shapes(&self) -> &[MultiPolygon<f64>] { self.geoms.shapes() }

    #[inline] pub fn crs(&self) -> Option<&Crs> { self.geoms.crs() }

    #[inline] pub fn id_column(&self) -> &str { &self.id_column }

    #[inline] pub fn region_column(&self) -> Option<&str> { self.region_column.as_deref() }

    #[inline] pub(crate) fn geoms(&self) -> &Geometries { &self.geoms }
}

/// Load both layers into one coordinate reference system.
///
/// Identifier columns of both layers are detected first, so alias problems surface
/// before any geometry work. Both layers must carry a CRS; the coarse layer is
/// reprojected into the fine layer's system when they differ. When
/// `require_region` is set the coarse layer must expose a region column.
pub fn load_layers(fine: RawLayer, coarse: RawLayer, config: &CrosswalkConfig, require_region: bool) -> Result<(FineLayer, CoarseLayer)> {
    detect_column(&fine, "fine id", &config.aliases.fine)?;
    detect_column(&fine, "medium id", &config.aliases.medium)?;
    detect_column(&coarse, "coarse id", &config.aliases.coarse)?;
    if require_region {
        detect_column(&coarse, "coarse region", &config.aliases.coarse_region)?;
    }

    let fine_crs = layer_crs(&fine, config.fine_epsg)
        .ok_or_else(|| CrosswalkError::projection(fine.name(), "layer has no coordinate reference system"))?;
    if layer_crs(&coarse, config.coarse_epsg).is_none() {
        return Err(CrosswalkError::projection(coarse.name(), "layer has no coordinate reference system"));
    }

    let fine = FineLayer::from_raw(fine.with_crs(Some(fine_crs.clone())), config)?;
    let coarse = CoarseLayer::from_raw(coarse, config, Some(&fine_crs))?;

    info!(
        fine_zones = fine.len(),
        coarse_zones = coarse.len(),
        crs = %fine_crs,
        "loaded zone layers"
    );
    Ok((fine, coarse))
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x0, y: y0), (x: x0 + size, y: y0), (x: x0 + size, y: y0 + size), (x: x0, y: y0 + size),
        ]])
    }

    fn utm() -> Option<Crs> { Some(Crs::from_epsg(26910)) }

    fn fine_raw() -> RawLayer {
        let mut raw = RawLayer::new("maz", vec!["MAZ".into(), "TAZ".into()], utm());
        raw.push_str(&["1", "10"], square(0.0, 0.0, 1.0)).unwrap();
        raw.push_str(&["2", "10"], square(1.0, 0.0, 1.0)).unwrap();
        raw
    }

    fn coarse_raw() -> RawLayer {
        let mut raw = RawLayer::new("puma", vec!["PUMACE20".into(), "COUNTYFP".into()], utm());
        raw.push_str(&["101", "1"], square(0.0, 0.0, 1.0)).unwrap();
        raw.push_str(&["101", "001"], square(1.0, 0.0, 1.0)).unwrap();
        raw.push_str(&["202", "13"], square(5.0, 0.0, 1.0)).unwrap();
        raw
    }

    #[test]
    fn fine_layer_detects_columns() {
        let fine = FineLayer::from_raw(fine_raw(), &CrosswalkConfig::default()).unwrap();
        assert_eq!(fine.len(), 2);
        assert_eq!(fine.id_column(), "MAZ");
        assert_eq!(fine.medium_column(), "TAZ");
        assert_eq!(fine.zones()[1].medium_id, ZoneId::new("10"));
    }

    #[test]
    fn missing_alias_is_identifier_not_found() {
        let mut raw = RawLayer::new("maz", vec!["ZONE".into(), "TAZ".into()], utm());
        raw.push_str(&["1", "10"], square(0.0, 0.0, 1.0)).unwrap();
        let err = load_layers(raw, coarse_raw(), &CrosswalkConfig::default(), false).unwrap_err();
        assert!(matches!(err, CrosswalkError::IdentifierNotFound { field: "fine id", .. }));
    }

    #[test]
    fn alias_errors_precede_geometry_errors() {
        let mut raw = RawLayer::new("puma", vec!["ID".into()], utm());
        raw.push_str(&["1"], MultiPolygon(vec![])).unwrap();
        let err = load_layers(fine_raw(), raw, &CrosswalkConfig::default(), false).unwrap_err();
        assert!(matches!(err, CrosswalkError::IdentifierNotFound { field: "coarse id", .. }));
    }

    #[test]
    fn empty_id_is_missing_attribute() {
        let mut raw = RawLayer::new("maz", vec!["MAZ".into(), "TAZ".into()], utm());
        raw.push(vec![Some("1".into()), None], square(0.0, 0.0, 1.0)).unwrap();
        let err = FineLayer::from_raw(raw, &CrosswalkConfig::default()).unwrap_err();
        assert!(matches!(err, CrosswalkError::MissingAttribute { row: 0, .. }));
    }

    #[test]
    fn coarse_features_sharing_an_id_are_merged() {
        let coarse = CoarseLayer::from_raw(coarse_raw(), &CrosswalkConfig::default(), None).unwrap();
        assert_eq!(coarse.len(), 2);
        assert_eq!(coarse.zone(0).id, ZoneId::new("101"));
        assert_eq!(coarse.zone(0).region_code.as_deref(), Some("001"));
        assert_eq!(coarse.region_column(), Some("COUNTYFP"));
    }

    #[test]
    fn invalid_part_of_merged_zone_is_rejected() {
        let mut raw = RawLayer::new("puma", vec!["PUMA".into()], utm());
        let bowtie = MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 10.0), (x: 10.0, y: 0.0), (x: 0.0, y: 10.0)]]);
        raw.push_str(&["101"], bowtie).unwrap();
        raw.push_str(&["101"], square(10.0, 0.0, 10.0)).unwrap();
        let err = CoarseLayer::from_raw(raw, &CrosswalkConfig::default(), None).unwrap_err();
        assert!(matches!(err, CrosswalkError::Geometry { ref zone, .. } if zone.contains("101")));
    }

    #[test]
    fn conflicting_region_codes_are_rejected() {
        let mut raw = RawLayer::new("puma", vec!["PUMA".into(), "COUNTY".into()], utm());
        raw.push_str(&["101", "001"], square(0.0, 0.0, 1.0)).unwrap();
        raw.push_str(&["101", "013"], square(1.0, 0.0, 1.0)).unwrap();
        assert!(matches!(
            CoarseLayer::from_raw(raw, &CrosswalkConfig::default(), None),
            Err(CrosswalkError::Geometry { .. })
        ));
    }

    #[test]
    fn region_filter_drops_other_regions() {
        let config = CrosswalkConfig::default().with_region_filter(vec!["13".into()]);
        let coarse = CoarseLayer::from_raw(coarse_raw(), &config, None).unwrap();
        assert_eq!(coarse.len(), 1);
        assert_eq!(coarse.zone(0).id, ZoneId::new("202"));
    }

    #[test]
    fn missing_crs_is_projection_error() {
        let err = load_layers(fine_raw(), coarse_raw().with_crs(None), &CrosswalkConfig::default(), false).unwrap_err();
        assert!(matches!(err, CrosswalkError::Projection { .. }));
    }

    #[test]
    fn epsg_override_supplies_missing_crs() {
        let config = CrosswalkConfig::default().with_epsg(None, Some(26910));
        assert!(load_layers(fine_raw(), coarse_raw().with_crs(None), &config, false).is_ok());
    }

    #[test]
    fn required_region_column_must_exist() {
        let mut raw = RawLayer::new("puma", vec!["PUMA".into()], utm());
        raw.push_str(&["101"], square(0.0, 0.0, 1.0)).unwrap();
        let err = load_layers(fine_raw(), raw, &CrosswalkConfig::default(), true).unwrap_err();
        assert!(matches!(err, CrosswalkError::IdentifierNotFound { field: "coarse region", .. }));
    }

    #[test]
    fn invalid_fine_geometry_is_rejected() {
        let mut raw = RawLayer::new("maz", vec!["MAZ".into(), "TAZ".into()], utm());
        let bowtie = MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0), (x: 1.0, y: 0.0), (x: 0.0, y: 1.0)]]);
        raw.push_str(&["1", "10"], bowtie).unwrap();
        assert!(matches!(
            FineLayer::from_raw(raw, &CrosswalkConfig::default()),
            Err(CrosswalkError::Geometry { .. })
        ));
    }
}

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::debug;

use crate::{
    error::{CrosswalkError, Result},
    geom::{ensure_valid, union_all},
    layer::FineLayer,
    types::{MediumZone, ZoneId, ZoneLevel},
};

/// Group fine zones by medium id and union each group into one medium zone.
/// Output is sorted by medium id; members are unioned in fine-id order so the
/// result does not depend on feature order in the source.
pub fn aggregate(fine: &FineLayer) -> Result<Vec<MediumZone>> {
    let mut groups: BTreeMap<&ZoneId, Vec<usize>> = BTreeMap::new();
    for (i, zone) in fine.zones().iter().enumerate() {
        groups.entry(&zone.medium_id).or_default().push(i);
    }

    let groups = groups.into_iter()
        .map(|(id, mut members)| {
            members.sort_by(|&a, &b| fine.zones()[a].id.cmp(&fine.zones()[b].id));
            (id, members)
        })
        .collect::<Vec<_>>();

    let zones = groups.par_iter()
        .map(|(id, members)| {
            let label = format!("{} zone {id}", ZoneLevel::Medium);
            let geometry = union_all(members.iter().map(|&i| &fine.shapes()[i]))
                .ok_or_else(|| CrosswalkError::geometry(&label, "no fine zones to union"))?;
            ensure_valid(&label, &geometry)?;
            Ok(MediumZone { id: (*id).clone(), geometry, fine_count: members.len() })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(medium_zones = zones.len(), fine_zones = fine.len(), "aggregated medium zones");
    Ok(zones)
}

#[cfg(test)]
mod tests {
    use geo::{polygon, Area, MultiPolygon};

    use super::*;
    use crate::{config::CrosswalkConfig, geom::Crs, layer::RawLayer};

    fn square(x0: f64, y0: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x0, y: y0), (x: x0 + size, y: y0), (x: x0 + size, y: y0 + size), (x: x0, y: y0 + size),
        ]])
    }

    fn fine(rows: &[(&str, &str, MultiPolygon<f64>)]) -> FineLayer {
        let mut raw = RawLayer::new("maz", vec!["MAZ".into(), "TAZ".into()], Some(Crs::from_epsg(26910)));
        for (id, medium, shape) in rows {
            raw.push_str(&[*id, *medium], shape.clone()).unwrap();
        }
        FineLayer::from_raw(raw, &CrosswalkConfig::default()).unwrap()
    }

    #[test]
    fn groups_by_medium_id_in_order() {
        let layer = fine(&[
            ("3", "20", square(5.0, 0.0, 1.0)),
            ("1", "10", square(0.0, 0.0, 1.0)),
            ("2", "10", square(1.0, 0.0, 1.0)),
        ]);
        let zones = aggregate(&layer).unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].id, ZoneId::new("10"));
        assert_eq!(zones[0].fine_count, 2);
        assert!((zones[0].geometry.unsigned_area() - 2.0).abs() < 1e-9);
        assert_eq!(zones[1].id, ZoneId::new("20"));
    }

    #[test]
    fn numeric_medium_ids_sort_numerically() {
        let layer = fine(&[
            ("1", "10", square(0.0, 0.0, 1.0)),
            ("2", "9", square(2.0, 0.0, 1.0)),
        ]);
        let ids = aggregate(&layer).unwrap().into_iter().map(|z| z.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![ZoneId::new("9"), ZoneId::new("10")]);
    }

    #[test]
    fn disjoint_members_stay_multipart() {
        let layer = fine(&[
            ("1", "10", square(0.0, 0.0, 1.0)),
            ("2", "10", square(4.0, 4.0, 1.0)),
        ]);
        let zones = aggregate(&layer).unwrap();
        assert_eq!(zones[0].geometry.0.len(), 2);
    }
}

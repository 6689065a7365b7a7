use geo::{Area, BoundingRect, Rect};

use crate::{config::CrosswalkConfig, layer::RawLayer};

/// Summary of a raw layer, for checking inputs before a run.
#[derive(Debug, Clone)]
pub struct LayerInfo {
    pub name: String,
    pub features: usize,
    pub columns: Vec<String>,
    pub crs: Option<String>,
    pub bounds: Option<Rect<f64>>,
    pub total_area: f64,
    pub detected: Vec<(&'static str, Option<String>)>, // Identifier role -> matched column
}

/// Describe a layer and report which identifier columns the configured aliases would select.
pub fn inspect(raw: &RawLayer, config: &CrosswalkConfig) -> LayerInfo {
    let detected = [
        ("fine id", &config.aliases.fine),
        ("medium id", &config.aliases.medium),
        ("coarse id", &config.aliases.coarse),
        ("coarse region", &config.aliases.coarse_region),
    ]
    .into_iter()
    .map(|(role, aliases)| (role, raw.find_column(aliases).map(|col| raw.columns()[col].clone())))
    .collect();

    let bounds = raw.shapes().iter()
        .filter_map(|shape| shape.bounding_rect())
        .reduce(|a, b| Rect::new(
            (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
            (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
        ));

    LayerInfo {
        name: raw.name().to_string(),
        features: raw.len(),
        columns: raw.columns().to_vec(),
        crs: raw.crs().map(|crs| crs.to_string()),
        bounds,
        total_area: raw.shapes().iter().map(|shape| shape.unsigned_area()).sum(),
        detected,
    }
}

#[cfg(test)]
mod tests {
    use geo::{polygon, MultiPolygon};

    use super::*;
    use crate::geom::Crs;

    #[test]
    fn reports_detected_columns_and_extent() {
        let mut raw = RawLayer::new("puma", vec!["PUMACE20".into(), "COUNTYFP".into()], Some(Crs::from_epsg(26910)));
        raw.push_str(&["101", "001"], MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 1.0), (x: 0.0, y: 1.0)]])).unwrap();
        raw.push_str(&["102", "013"], MultiPolygon(vec![polygon![(x: 3.0, y: 3.0), (x: 4.0, y: 3.0), (x: 4.0, y: 4.0), (x: 3.0, y: 4.0)]])).unwrap();

        let info = inspect(&raw, &CrosswalkConfig::default());
        assert_eq!(info.features, 2);
        assert_eq!(info.crs.as_deref(), Some("EPSG:26910"));
        assert!((info.total_area - 3.0).abs() < 1e-9);
        assert_eq!(info.bounds, Some(Rect::new((0.0, 0.0), (4.0, 4.0))));
        assert_eq!(info.detected[0], ("fine id", None));
        assert_eq!(info.detected[2], ("coarse id", Some("PUMACE20".to_string())));
        assert_eq!(info.detected[3], ("coarse region", Some("COUNTYFP".to_string())));
    }
}

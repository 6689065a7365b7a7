//! Shapefile reading operations.

use std::{collections::HashMap, path::Path};

use shapefile::{dbase::FieldValue, Reader};
use tracing::debug;

use crate::{common, error::{CrosswalkError, Result}, geom::Crs, layer::RawLayer};

/// Render an attribute value as text. Integral numbers print without a fraction.
fn field_to_string(value: FieldValue) -> Option<String> {
    fn number(n: f64) -> String {
        if n.fract() == 0.0 && n.abs() < 1e15 { format!("{}", n as i64) } else { n.to_string() }
    }

    match value {
        FieldValue::Character(s) => s,
        FieldValue::Numeric(n) => n.map(number),
        FieldValue::Float(f) => f.map(|f| number(f as f64)),
        FieldValue::Double(d) => Some(number(d)),
        FieldValue::Integer(i) => Some(i.to_string()),
        FieldValue::Logical(b) => b.map(|b| b.to_string()),
        _ => None,
    }
}

/// Reads all shapes + attribute records from a `.shp` file (and its `.dbf`/`.prj` sidecars).
pub fn read_shapefile(path: &Path) -> Result<RawLayer> {
    let name = path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut reader = Reader::from_path(path)?;
    let crs = Crs::read_prj(path)?;

    let mut features = Vec::with_capacity(reader.shape_count()?);
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;
        let shape = common::shape_to_multipolygon(shape)
            .map_err(|reason| CrosswalkError::geometry(format!("{name} feature {}", features.len()), reason))?;
        let record: HashMap<String, FieldValue> = record.into_iter().collect();
        features.push((record, shape));
    }

    // Column order follows the first record; dBase fields are uniform across records.
    let mut columns = features.first()
        .map(|(record, _)| record.keys().cloned().collect::<Vec<_>>())
        .unwrap_or_default();
    columns.sort();

    let mut layer = RawLayer::new(name, columns.clone(), crs);
    for (mut record, shape) in features {
        let values = columns.iter()
            .map(|column| record.remove(column).and_then(field_to_string))
            .collect();
        layer.push(values, shape)?;
    }

    debug!(layer = layer.name(), features = layer.len(), crs = ?layer.crs().map(|c| c.to_string()), "read shapefile");
    Ok(layer)
}

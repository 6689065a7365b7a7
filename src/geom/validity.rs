use std::fmt::Display;

use geo::{CoordsIter, MultiPolygon, Validation};

use crate::error::{CrosswalkError, Result};

/// Error unless `shape` is a non-empty, finite, OGC-valid MultiPolygon.
/// Invalid shapes are reported, never repaired.
pub(crate) fn ensure_valid(zone: impl Display, shape: &MultiPolygon<f64>) -> Result<()> {
    if shape.0.is_empty() {
        return Err(CrosswalkError::geometry(zone, "empty geometry"));
    }
    if shape.coords_iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(CrosswalkError::geometry(zone, "non-finite coordinate"));
    }
    shape.check_validation()
        .map_err(|err| CrosswalkError::geometry(zone, err.to_string()))
}

#[cfg(test)]
mod tests {
    use geo::{polygon, MultiPolygon};

    use super::*;

    #[test]
    fn square_is_valid() {
        let square = MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)]]);
        assert!(ensure_valid("M1", &square).is_ok());
    }

    #[test]
    fn bowtie_is_rejected() {
        let bowtie = MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0), (x: 1.0, y: 0.0), (x: 0.0, y: 1.0)]]);
        let err = ensure_valid("M1", &bowtie).unwrap_err();
        assert!(matches!(err, CrosswalkError::Geometry { ref zone, .. } if zone == "M1"));
    }

    #[test]
    fn empty_is_rejected() {
        assert!(ensure_valid("M1", &MultiPolygon::<f64>(vec![])).is_err());
    }

    #[test]
    fn nan_is_rejected() {
        let shape = MultiPolygon(vec![polygon![(x: 0.0, y: 0.0), (x: f64::NAN, y: 0.0), (x: 1.0, y: 1.0)]]);
        assert!(ensure_valid("M1", &shape).is_err());
    }
}

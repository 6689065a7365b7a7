use geo::{Contains, Coord, LineString, MultiPolygon, Point, Polygon};
use shapefile::{PolygonRing, Shape};

/// Coerce a shapefile shape into an owned MultiPolygon, dropping any M/Z values.
pub(crate) fn shape_to_multipolygon(shape: Shape) -> Result<MultiPolygon<f64>, String> {
    /// Flatten rings into (is_outer, closed coordinates) pairs.
    fn rings_of<P>(rings: &[PolygonRing<P>], xy: impl Fn(&P) -> Coord<f64>) -> Vec<(bool, Vec<Coord<f64>>)> {
        rings.iter()
            .map(|ring| {
                let is_outer = matches!(ring, PolygonRing::Outer(_));
                (is_outer, ring.points().iter().map(&xy).collect())
            })
            .collect()
    }

    let rings = match shape {
        Shape::Polygon(polygon) => rings_of(polygon.rings(), |p| Coord { x: p.x, y: p.y }),
        Shape::PolygonM(polygon) => rings_of(polygon.rings(), |p| Coord { x: p.x, y: p.y }),
        Shape::PolygonZ(polygon) => rings_of(polygon.rings(), |p| Coord { x: p.x, y: p.y }),
        other => return Err(format!("found non-polygon shape in layer: {:?}", other.shapetype())),
    };

    rings_to_multipolygon(rings)
}

/// Assemble rings into polygons. Each hole goes to the outer ring that contains
/// its first vertex; a hole no outer ring contains stays with the preceding outer ring.
fn rings_to_multipolygon(rings: Vec<(bool, Vec<Coord<f64>>)>) -> Result<MultiPolygon<f64>, String> {
    let mut exteriors: Vec<Polygon<f64>> = Vec::new();
    let mut holes: Vec<Vec<LineString<f64>>> = Vec::new();
    let mut pending: Vec<(usize, LineString<f64>)> = Vec::new(); // (preceding exterior, hole)

    for (is_outer, coords) in rings {
        let ring = LineString::from(coords); // Polygon::new closes rings
        if is_outer {
            exteriors.push(Polygon::new(ring, vec![]));
            holes.push(Vec::new());
        } else {
            let preceding = exteriors.len().checked_sub(1)
                .ok_or_else(|| "inner ring appears before any outer ring".to_string())?;
            pending.push((preceding, ring));
        }
    }

    for (preceding, hole) in pending {
        let owner = hole.0.first()
            .and_then(|&c| exteriors.iter().position(|ext| ext.contains(&Point::from(c))))
            .unwrap_or(preceding);
        holes[owner].push(hole);
    }

    Ok(MultiPolygon(
        exteriors.into_iter().zip(holes)
            .map(|(ext, interiors)| Polygon::new(ext.into_inner().0, interiors))
            .collect()
    ))
}

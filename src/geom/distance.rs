use geo::{Coord, CoordsIter, Intersects, Line, LinesIter, MultiPolygon, Point};

/// Planar distance between two points in CRS units.
#[inline]
pub(crate) fn point_distance(a: Point<f64>, b: Point<f64>) -> f64 {
    (a.x() - b.x()).hypot(a.y() - b.y())
}

/// Planar distance from a coordinate to a segment.
fn segment_distance(p: Coord<f64>, line: Line<f64>) -> f64 {
    let d = line.end - line.start;
    let len2 = d.x * d.x + d.y * d.y;
    if len2 == 0.0 { return (p.x - line.start.x).hypot(p.y - line.start.y) }

    let t = (((p.x - line.start.x) * d.x + (p.y - line.start.y) * d.y) / len2).clamp(0.0, 1.0);
    let proj = line.start + d * t;
    (p.x - proj.x).hypot(p.y - proj.y)
}

/// Minimum distance between two MultiPolygons; zero when they intersect.
/// For disjoint shapes the nearest pair always involves a vertex of one shape,
/// so checking vertices against segments in both directions is exact.
pub(crate) fn boundary_distance(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> f64 {
    if a.intersects(b) { return 0.0 }

    fn one_way(from: &MultiPolygon<f64>, to: &MultiPolygon<f64>) -> f64 {
        from.coords_iter()
            .flat_map(|p| to.lines_iter().map(move |line| segment_distance(p, line)))
            .fold(f64::INFINITY, f64::min)
    }
    one_way(a, b).min(one_way(b, a))
}

use geo::{Area, BooleanOps, BoundingRect, Centroid, Intersects, MultiPolygon, Point};
use rstar::{RTree, AABB};

use crate::geom::{BoundingBox, Crs};

/// Geometries is a read-only collection of MultiPolygons with an R-tree over their bounds.
/// Built once per layer and shared across resolver workers.
#[derive(Debug, Clone)]
pub(crate) struct Geometries {
    shapes: Vec<MultiPolygon<f64>>,
    rtree: RTree<BoundingBox>,
    crs: Option<Crs>,
}

impl Geometries {
    /// Construct a Geometries object from a vector of MultiPolygons.
    /// Empty shapes have no bounds and are left out of the R-tree.
    pub(crate) fn new(shapes: Vec<MultiPolygon<f64>>, crs: Option<Crs>) -> Self {
        Self {
            rtree: RTree::bulk_load(
                shapes.iter().enumerate()
                    .filter_map(|(i, shape)| shape.bounding_rect().map(|rect| BoundingBox::new(i, rect)))
                    .collect()
            ),
            shapes,
            crs,
        }
    }

    /// Get a reference to the list of MultiPolygons.
    #[inline] pub(crate) fn shapes(&self) -> &[MultiPolygon<f64>] { &self.shapes }

    /// Get the MultiPolygon at `idx`.
    #[inline] pub(crate) fn shape(&self, idx: usize) -> &MultiPolygon<f64> { &self.shapes[idx] }

    /// Get the coordinate reference system, if known.
    #[inline] pub(crate) fn crs(&self) -> Option<&Crs> { self.crs.as_ref() }

    /// Query the R-tree for shapes whose bounding box intersects the envelope.
    #[inline]
    pub(crate) fn query(&self, envelope: &AABB<[f64; 2]>) -> impl Iterator<Item = usize> + '_ {
        self.rtree.locate_in_envelope_intersecting(envelope).map(|bb| bb.idx())
    }

    /// Indices of shapes that spatially intersect `target`, in ascending order.
    /// Boundary contact counts as intersection; area filtering happens later.
    pub(crate) fn intersecting(&self, target: &MultiPolygon<f64>) -> Vec<usize> {
        let Some(rect) = target.bounding_rect() else { return Vec::new() };
        let envelope = AABB::from_corners(rect.min().into(), rect.max().into());

        let mut hits = self.query(&envelope)
            .filter(|&j| self.shapes[j].intersects(target))
            .collect::<Vec<_>>();
        hits.sort_unstable();
        hits
    }

    /// Compute the centroids of all MultiPolygons (None for empty shapes).
    #[inline]
    pub(crate) fn centroids(&self) -> Vec<Option<Point<f64>>> {
        self.shapes.iter().map(|shape| shape.centroid()).collect()
    }
}

/// Compute the union of MultiPolygons into a single MultiPolygon.
/// This may be slow for large numbers of complex polygons.
pub(crate) fn union_all<'a>(shapes: impl IntoIterator<Item = &'a MultiPolygon<f64>>) -> Option<MultiPolygon<f64>> {
    shapes.into_iter().cloned().reduce(|a, b| a.union(&b))
}

/// Area shared by two MultiPolygons.
#[inline]
pub(crate) fn overlap_area(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> f64 {
    a.intersection(b).unsigned_area()
}

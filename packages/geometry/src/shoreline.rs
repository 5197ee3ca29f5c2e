//! In-memory spatial index over the shoreline (land) mask.
//!
//! The shoreline is usually one huge multipolygon covering every
//! continent and island. Each land polygon is indexed separately by its
//! bounding box so a land clip only intersects the handful of polygons
//! near the geometry being clipped.

use geo::{BooleanOps, BoundingRect, MultiPolygon, Polygon, Rect};
use rstar::{AABB, RTree, RTreeObject};

use crate::repair;

/// A single land polygon stored in the R-tree.
struct LandEntry {
    envelope: AABB<[f64; 2]>,
    polygon: Polygon<f64>,
}

impl RTreeObject for LandEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Pre-built spatial index for land clipping.
///
/// Constructed once per run and shared read-only across workers.
pub struct ShorelineIndex {
    land: RTree<LandEntry>,
}

impl ShorelineIndex {
    /// Repairs every land mass and bulk-loads its polygons into the
    /// R-tree.
    #[must_use]
    pub fn new(land_masses: impl IntoIterator<Item = MultiPolygon<f64>>) -> Self {
        let entries: Vec<LandEntry> = land_masses
            .into_iter()
            .flat_map(|land| repair(&land).0)
            .filter_map(|polygon| {
                let envelope = compute_envelope(&polygon)?;
                Some(LandEntry { envelope, polygon })
            })
            .collect();

        log::debug!("Indexed {} land polygons", entries.len());

        Self {
            land: RTree::bulk_load(entries),
        }
    }

    /// Number of indexed land polygons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.land.size()
    }

    /// Whether the shoreline has no land at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.land.size() == 0
    }

    /// Intersection of `geometry` with the land mask.
    ///
    /// Returns an empty multipolygon when the geometry touches no land.
    /// `geometry` is expected to be repaired already.
    #[must_use]
    pub fn land_clip(&self, geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        let Some(query) = compute_envelope(geometry) else {
            return MultiPolygon(vec![]);
        };

        let mut pieces: Vec<MultiPolygon<f64>> = self
            .land
            .locate_in_envelope_intersecting(&query)
            .map(|entry| geometry.intersection(&entry.polygon))
            .filter(|piece| !piece.0.is_empty())
            .collect();

        match pieces.len() {
            0 => MultiPolygon(vec![]),
            1 => pieces.swap_remove(0),
            // Land polygons may overlap after independent repair.
            _ => geo::unary_union(&pieces),
        }
    }
}

/// Compute the bounding box envelope of a geometry.
fn compute_envelope<G>(geometry: &G) -> Option<AABB<[f64; 2]>>
where
    G: BoundingRect<f64, Output = Option<Rect<f64>>>,
{
    geometry
        .bounding_rect()
        .map(|rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Area, Coord};

    fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![
            Rect::new(Coord { x: min_x, y: min_y }, Coord { x: max_x, y: max_y }).to_polygon(),
        ])
    }

    #[test]
    fn clips_to_land() {
        let index = ShorelineIndex::new([rect(0.0, 0.0, 10.0, 10.0)]);
        let clipped = index.land_clip(&rect(5.0, 5.0, 15.0, 15.0));
        assert!((clipped.unsigned_area() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn water_only_geometry_clips_to_nothing() {
        let index = ShorelineIndex::new([rect(0.0, 0.0, 10.0, 10.0)]);
        let clipped = index.land_clip(&rect(50.0, 50.0, 60.0, 60.0));
        assert!(clipped.0.is_empty());
    }

    #[test]
    fn envelope_overlap_without_land_overlap_clips_to_nothing() {
        // L-shaped island whose bounding box covers the query square.
        let island = MultiPolygon(vec![Polygon::new(
            geo::LineString::from(vec![
                (0.0, 0.0),
                (10.0, 0.0),
                (10.0, 2.0),
                (2.0, 2.0),
                (2.0, 10.0),
                (0.0, 10.0),
                (0.0, 0.0),
            ]),
            vec![],
        )]);
        let index = ShorelineIndex::new([island]);
        assert!(index.land_clip(&rect(5.0, 5.0, 8.0, 8.0)).0.is_empty());
    }

    #[test]
    fn spans_multiple_land_masses() {
        let index = ShorelineIndex::new([rect(0.0, 0.0, 4.0, 4.0), rect(6.0, 0.0, 10.0, 4.0)]);
        assert_eq!(index.len(), 2);
        let clipped = index.land_clip(&rect(2.0, 0.0, 8.0, 4.0));
        assert!((clipped.unsigned_area() - 16.0).abs() < 1e-9);
    }

    #[test]
    fn overlapping_land_masses_are_not_double_counted() {
        let index = ShorelineIndex::new([rect(0.0, 0.0, 6.0, 4.0), rect(4.0, 0.0, 10.0, 4.0)]);
        let clipped = index.land_clip(&rect(0.0, 0.0, 10.0, 4.0));
        assert!((clipped.unsigned_area() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn empty_shoreline() {
        let index = ShorelineIndex::new(Vec::<MultiPolygon<f64>>::new());
        assert!(index.is_empty());
        assert!(index.land_clip(&rect(0.0, 0.0, 1.0, 1.0)).0.is_empty());
    }
}

//! Polygon repair applied before every intersection, union or hull.
//!
//! Repair never fails. Input that cannot be salvaged (non-finite
//! coordinates, rings with fewer than three distinct points, zero-area
//! rings) is dropped, so the result may be empty.

use geo::{
    Area, CoordsIter, LineString, MultiPolygon, Polygon, RemoveRepeatedPoints, Validation,
};

/// Returns a topologically valid geometry covering the same area as
/// `geometry`.
///
/// Valid geometries are returned unchanged apart from degenerate-ring
/// cleanup. Self-intersecting rings and overlapping parts are resolved by
/// a unary union of the parts.
#[must_use]
pub fn repair(geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    let cleaned = MultiPolygon(geometry.0.iter().filter_map(clean_polygon).collect());

    if cleaned.is_valid() {
        return cleaned;
    }

    log::trace!(
        "Repairing invalid geometry with {} part(s)",
        cleaned.0.len()
    );
    geo::unary_union(&cleaned.0)
}

/// Drops rings that cannot bound any area. Returns `None` when the
/// exterior itself is unusable.
fn clean_polygon(polygon: &Polygon<f64>) -> Option<Polygon<f64>> {
    if !polygon
        .coords_iter()
        .all(|coord| coord.x.is_finite() && coord.y.is_finite())
    {
        return None;
    }

    let (exterior, interiors) = polygon.remove_repeated_points().into_inner();
    if !bounds_area(&exterior) {
        return None;
    }

    let interiors = interiors.into_iter().filter(bounds_area).collect();
    Some(Polygon::new(exterior, interiors))
}

/// A closed ring needs at least four coordinates (three distinct) and a
/// non-zero enclosed area.
fn bounds_area(ring: &LineString<f64>) -> bool {
    ring.0.len() >= 4 && Polygon::new(ring.clone(), vec![]).unsigned_area() > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Coord, Rect};

    fn square(min: f64, max: f64) -> Polygon<f64> {
        Rect::new(Coord { x: min, y: min }, Coord { x: max, y: max }).to_polygon()
    }

    #[test]
    fn valid_geometry_is_unchanged() {
        let input = MultiPolygon(vec![square(0.0, 2.0)]);
        let repaired = repair(&input);
        assert!(repaired.is_valid());
        assert!((repaired.unsigned_area() - 4.0).abs() < 1e-12);
        assert_eq!(repaired.0.len(), 1);
    }

    #[test]
    fn bowtie_is_split_into_valid_parts() {
        let bowtie = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0), (0.0, 0.0)]),
            vec![],
        );
        let input = MultiPolygon(vec![bowtie]);
        assert!(!input.is_valid());

        let repaired = repair(&input);
        assert!(repaired.is_valid());
        assert!((repaired.unsigned_area() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn overlapping_parts_are_unioned() {
        let input = MultiPolygon(vec![square(0.0, 2.0), square(1.0, 3.0)]);
        let repaired = repair(&input);
        assert!(repaired.is_valid());
        assert!((repaired.unsigned_area() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn collinear_ring_is_dropped() {
        let sliver = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (0.0, 0.0)]),
            vec![],
        );
        let repaired = repair(&MultiPolygon(vec![sliver, square(5.0, 6.0)]));
        assert_eq!(repaired.0.len(), 1);
        assert!((repaired.unsigned_area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn non_finite_coordinates_are_dropped() {
        let broken = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (f64::NAN, 1.0), (1.0, 1.0), (0.0, 0.0)]),
            vec![],
        );
        let repaired = repair(&MultiPolygon(vec![broken]));
        assert!(repaired.0.is_empty());
    }

    #[test]
    fn degenerate_hole_is_removed() {
        let hole = LineString::from(vec![(1.0, 1.0), (1.0, 1.0), (1.0, 1.0)]);
        let outer = square(0.0, 4.0);
        let with_hole = Polygon::new(outer.exterior().clone(), vec![hole]);
        let repaired = repair(&MultiPolygon(vec![with_hole]));
        assert_eq!(repaired.0.len(), 1);
        assert!(repaired.0[0].interiors().is_empty());
    }
}

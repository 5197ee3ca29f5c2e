//! Land-clipped compactness.
//!
//! Compactness is the area of the urban center's land portion over the
//! area of the land portion of its convex hull. Centers that do not
//! touch the shoreline mask at all (offshore platforms, data errors) are
//! measured unclipped instead.

use geo::{Area, ConvexHull, MultiPolygon};
use urban_metrics_geometry::{EllipsoidalArea, ShorelineIndex, repair};
use urban_metrics_models::{CompactnessResult, UrbanCenter, UrbanCenterId};

/// Computes the compactness of one urban center. Never fails.
#[must_use]
pub fn compactness(
    center: &UrbanCenter,
    shoreline: &ShorelineIndex,
    area: &EllipsoidalArea,
) -> CompactnessResult {
    let repaired = repair(&center.geometry);
    let hull = MultiPolygon(vec![repaired.convex_hull()]);

    let land = shoreline.land_clip(&repaired);
    let (land, hull_land, used_land_fallback) = if is_empty(&land) {
        log::debug!(
            "Urban center {} does not intersect land; measuring the unclipped polygon",
            center.id
        );
        (repaired, hull, true)
    } else {
        let hull_land = shoreline.land_clip(&hull);
        (land, hull_land, false)
    };

    let ratio = area_ratio(&center.id, &land, &hull_land, area);

    CompactnessResult {
        id: center.id.clone(),
        hull: hull_land,
        compactness: clamp_ratio(ratio),
        used_land_fallback,
    }
}

/// No polygons, or polygons without area.
fn is_empty(geometry: &MultiPolygon<f64>) -> bool {
    geometry.0.is_empty() || geometry.unsigned_area() <= 0.0
}

fn area_ratio(
    id: &UrbanCenterId,
    land: &MultiPolygon<f64>,
    hull: &MultiPolygon<f64>,
    area: &EllipsoidalArea,
) -> f64 {
    match (area.area(land), area.area(hull)) {
        (Ok(land_area), Ok(hull_area)) => land_area / hull_area,
        (Err(e), _) | (_, Err(e)) => {
            log::warn!("Urban center {id}: {e}; falling back to planar area");
            land.unsigned_area() / hull.unsigned_area()
        }
    }
}

/// Caps rounding overshoot at 1. An undefined ratio (zero hull area)
/// means the geometry has no area to lose to its hull.
fn clamp_ratio(ratio: f64) -> f64 {
    if ratio.is_finite() { ratio.min(1.0) } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Coord, LineString, Polygon, Rect};
    use urban_metrics_models::DEFAULT_CRS;

    /// Kilometre-scale shapes near the Mollweide origin.
    const KM: f64 = 1000.0;

    fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![
            Rect::new(
                Coord { x: min_x * KM, y: min_y * KM },
                Coord { x: max_x * KM, y: max_y * KM },
            )
            .to_polygon(),
        ])
    }

    /// 2 x 2 km square with the top-right quadrant missing. Area 3, hull 3.5.
    fn l_shape() -> MultiPolygon<f64> {
        MultiPolygon(vec![Polygon::new(
            LineString::from(
                [(0.0, 0.0), (2.0, 0.0), (2.0, 1.0), (1.0, 1.0), (1.0, 2.0), (0.0, 2.0), (0.0, 0.0)]
                    .iter()
                    .map(|&(x, y)| (x * KM, y * KM))
                    .collect::<Vec<_>>(),
            ),
            vec![],
        )])
    }

    fn mollweide() -> EllipsoidalArea {
        EllipsoidalArea::from_proj_string(DEFAULT_CRS).unwrap()
    }

    fn big_island() -> ShorelineIndex {
        ShorelineIndex::new([rect(-100.0, -100.0, 100.0, 100.0)])
    }

    #[test]
    fn convex_center_on_land_is_fully_compact() {
        let center = UrbanCenter::new(1_i64, rect(0.0, 0.0, 2.0, 2.0));
        let result = compactness(&center, &big_island(), &mollweide());
        assert!((result.compactness - 1.0).abs() < 1e-9);
        assert!(!result.used_land_fallback);
    }

    #[test]
    fn concave_center_on_land() {
        let center = UrbanCenter::new(1_i64, l_shape());
        let result = compactness(&center, &big_island(), &mollweide());
        assert!((result.compactness - 3.0 / 3.5).abs() < 1e-3);
        assert!((result.hull.unsigned_area() - 3.5 * KM * KM).abs() < 1.0);
    }

    #[test]
    fn water_is_excluded_from_both_areas() {
        // Land covers x >= 1 km: the center keeps its bottom-right unit
        // square, the hull keeps that square plus a half-unit triangle.
        let shoreline = ShorelineIndex::new([rect(1.0, -10.0, 10.0, 10.0)]);
        let center = UrbanCenter::new(7_i64, l_shape());
        let result = compactness(&center, &shoreline, &mollweide());
        assert!(!result.used_land_fallback);
        assert!((result.compactness - 1.0 / 1.5).abs() < 1e-3);
        assert!((result.hull.unsigned_area() - 1.5 * KM * KM).abs() < 1.0);
    }

    #[test]
    fn all_water_center_falls_back_to_unclipped_ratio() {
        let shoreline = ShorelineIndex::new([rect(500.0, 500.0, 600.0, 600.0)]);
        let area = mollweide();
        let geometry = l_shape();
        let center = UrbanCenter::new(3_i64, geometry.clone());

        let result = compactness(&center, &shoreline, &area);

        let hull = MultiPolygon(vec![geometry.convex_hull()]);
        let expected = area.area(&geometry).unwrap() / area.area(&hull).unwrap();
        assert!(result.used_land_fallback);
        assert!((result.compactness - expected).abs() < 1e-12);
        assert!((result.hull.unsigned_area() - hull.unsigned_area()).abs() < 1e-6);
    }

    #[test]
    fn center_touching_land_only_along_an_edge_falls_back() {
        let shoreline = ShorelineIndex::new([rect(2.0, 0.0, 4.0, 2.0)]);
        let center = UrbanCenter::new(4_i64, rect(0.0, 0.0, 2.0, 2.0));
        let result = compactness(&center, &shoreline, &mollweide());
        assert!(result.used_land_fallback);
        assert!((result.compactness - 1.0).abs() < 1e-9);
    }

    #[test]
    fn self_intersecting_center_is_repaired_first() {
        let bowtie = MultiPolygon(vec![Polygon::new(
            LineString::from(
                [(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0), (0.0, 0.0)]
                    .iter()
                    .map(|&(x, y)| (x * KM, y * KM))
                    .collect::<Vec<_>>(),
            ),
            vec![],
        )]);
        let center = UrbanCenter::new(5_i64, bowtie);
        let result = compactness(&center, &big_island(), &mollweide());
        // Two triangles of area 1 inside a 2 x 2 hull.
        assert!((result.compactness - 0.5).abs() < 1e-3);
    }

    #[test]
    fn compactness_stays_in_unit_interval() {
        let shapes = [
            rect(0.0, 0.0, 5.0, 0.1),
            l_shape(),
            MultiPolygon(vec![
                rect(0.0, 0.0, 1.0, 1.0).0[0].clone(),
                rect(5.0, 5.0, 6.0, 6.0).0[0].clone(),
            ]),
        ];
        let shoreline = big_island();
        let area = mollweide();
        for (i, shape) in shapes.into_iter().enumerate() {
            let center = UrbanCenter::new(i64::try_from(i).unwrap(), shape);
            let value = compactness(&center, &shoreline, &area).compactness;
            assert!(value > 0.0 && value <= 1.0, "shape {i}: {value}");
        }
    }

    #[test]
    fn degenerate_center_is_fully_compact() {
        let line = MultiPolygon(vec![Polygon::new(
            LineString::from(vec![(0.0, 0.0), (KM, 0.0), (2.0 * KM, 0.0), (0.0, 0.0)]),
            vec![],
        )]);
        let center = UrbanCenter::new(6_i64, line);
        let result = compactness(&center, &big_island(), &mollweide());
        assert!(result.used_land_fallback);
        assert!((result.compactness - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn clamps_overshoot() {
        assert!((clamp_ratio(1.000_000_1) - 1.0).abs() < f64::EPSILON);
        assert!((clamp_ratio(0.25) - 0.25).abs() < f64::EPSILON);
        assert!((clamp_ratio(f64::NAN) - 1.0).abs() < f64::EPSILON);
    }
}

//! Conversions between `GeoJSON` geometries and `geo` areal types.

use geo::{Geometry, MultiPolygon, Point};

/// Collects the areal parts of a geometry into a [`MultiPolygon`].
///
/// Handles `Polygon`, `MultiPolygon` and geometry collections containing
/// them. Returns `None` for geometries without any areal part.
#[must_use]
fn to_multipolygon(geometry: Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::MultiPolygon(mp) => Some(mp),
        Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        Geometry::Rect(r) => Some(MultiPolygon(vec![r.to_polygon()])),
        Geometry::GeometryCollection(collection) => {
            let polygons: Vec<_> = collection
                .into_iter()
                .filter_map(to_multipolygon)
                .flat_map(|mp| mp.0)
                .collect();
            (!polygons.is_empty()).then_some(MultiPolygon(polygons))
        }
        _ => None,
    }
}

/// Converts a `GeoJSON` geometry into a [`MultiPolygon`].
#[must_use]
pub fn from_geojson(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: Geometry<f64> = geometry.try_into().ok()?;
    to_multipolygon(geo_geom)
}

/// Converts a [`MultiPolygon`] into a `GeoJSON` geometry.
#[must_use]
pub fn multipolygon_to_geojson(geometry: &MultiPolygon<f64>) -> geojson::Geometry {
    geojson::Geometry::new(geojson::Value::from(geometry))
}

/// Converts a [`Point`] into a `GeoJSON` geometry.
#[must_use]
pub fn point_to_geojson(point: &Point<f64>) -> geojson::Geometry {
    geojson::Geometry::new(geojson::Value::from(point))
}

//! Area on the WGS84 ellipsoid for geometries in a projected CRS.
//!
//! Coordinates are inverse-projected to longitude/latitude with
//! `proj4rs`, then measured with `geo`'s geodesic area so that the
//! projection's distortion does not bias ratios between geometries in
//! different parts of the world.

use geo::{Coord, GeodesicArea, MapCoords, MultiPolygon};
use proj4rs::{proj::Proj, transform::transform};

use crate::GeometryError;

/// Target CRS of the inverse projection.
const LON_LAT: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// Inverse projection from the source CRS to WGS84 longitude/latitude.
struct Inverse {
    source: Proj,
    target: Proj,
}

/// Measures geodesic area of geometries in a fixed source CRS.
pub struct EllipsoidalArea {
    /// `None` when the source CRS is already geographic.
    inverse: Option<Inverse>,
}

impl EllipsoidalArea {
    /// Builds an area model for geometries in the CRS described by a PROJ
    /// string.
    ///
    /// # Errors
    ///
    /// Returns an error if either PROJ definition fails to parse.
    pub fn from_proj_string(crs: &str) -> Result<Self, GeometryError> {
        if is_geographic(crs) {
            return Ok(Self::lon_lat());
        }

        let source = Proj::from_proj_string(crs).map_err(|e| GeometryError::InvalidCrs {
            crs: crs.to_string(),
            message: e.to_string(),
        })?;
        let target = Proj::from_proj_string(LON_LAT).map_err(|e| GeometryError::InvalidCrs {
            crs: LON_LAT.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            inverse: Some(Inverse { source, target }),
        })
    }

    /// Area model for geometries already in longitude/latitude degrees.
    #[must_use]
    pub const fn lon_lat() -> Self {
        Self { inverse: None }
    }

    /// Converts a geometry to longitude/latitude degrees.
    ///
    /// # Errors
    ///
    /// Returns an error if any coordinate falls outside the projection's
    /// domain.
    pub fn to_lon_lat(&self, geometry: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>, GeometryError> {
        let Some(inverse) = &self.inverse else {
            return Ok(geometry.clone());
        };

        geometry.try_map_coords(|coord: Coord<f64>| {
            let mut point = (coord.x, coord.y, 0.0);
            transform(&inverse.source, &inverse.target, &mut point).map_err(|e| {
                GeometryError::Projection {
                    message: format!("({}, {}): {e}", coord.x, coord.y),
                }
            })?;

            let (lon, lat) = (point.0.to_degrees(), point.1.to_degrees());
            if !lon.is_finite() || !lat.is_finite() {
                return Err(GeometryError::Projection {
                    message: format!("({}, {}) is outside the projection domain", coord.x, coord.y),
                });
            }

            Ok(Coord { x: lon, y: lat })
        })
    }

    /// Unsigned area in square metres.
    ///
    /// # Errors
    ///
    /// Returns an error if the geometry cannot be inverse-projected.
    pub fn area(&self, geometry: &MultiPolygon<f64>) -> Result<f64, GeometryError> {
        Ok(self.to_lon_lat(geometry)?.geodesic_area_unsigned())
    }
}

/// Whether a PROJ string describes a geographic (lon/lat) CRS.
fn is_geographic(crs: &str) -> bool {
    crs.split_whitespace().any(|token| {
        matches!(
            token,
            "+proj=longlat" | "+proj=latlong" | "+proj=lonlat" | "+proj=latlon"
        )
    })
}

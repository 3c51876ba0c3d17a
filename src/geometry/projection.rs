//! Geographic to normalized world coordinates.

use std::f64::consts::PI;

use crate::feature::model::LonLat;
use crate::foundation::core::Point;

/// Latitude limit of the square Web Mercator world.
pub const MAX_LATITUDE: f64 = 85.051_129;

/// Web Mercator into `[0,1]²`: x grows east from the antimeridian, y grows south from the top
/// edge. Latitude is clamped to [`MAX_LATITUDE`].
pub fn project(p: LonLat) -> Point {
    let x = (p.lon + 180.0) / 360.0;
    let lat = p.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let y = 0.5 - (PI / 4.0 + lat / 2.0).tan().ln() / (2.0 * PI);
    Point::new(x, y)
}

/// Project a coordinate run. Returns `None` if any coordinate is non-finite.
pub fn project_all(coords: &[LonLat], out: &mut Vec<Point>) -> Option<()> {
    out.clear();
    out.reserve(coords.len());
    for &c in coords {
        if !c.is_finite() {
            out.clear();
            return None;
        }
        out.push(project(c));
    }
    Some(())
}

/// Drop a GeoJSON closing vertex (last equal to first).
pub fn open_ring(ring: &mut Vec<Point>) {
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/projection.rs"]
mod tests;

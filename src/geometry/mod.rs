pub mod projection;
pub mod simplify;
pub mod triangulate;

use crate::foundation::core::{Point, Rect};

/// Axis-aligned bounds of `points`, or `None` when empty.
pub fn bounds_of(points: &[Point]) -> Option<Rect> {
    let (first, rest) = points.split_first()?;
    Some(
        rest.iter()
            .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p)),
    )
}

/// Plain vertex average. Not the area centroid.
pub fn vertex_centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point::new(sx / n, sy / n))
}

/// Shoelace area. Positive for counter-clockwise rings in a y-up frame.
///
/// Summed relative to the first vertex so small rings far from the origin keep their precision.
pub fn signed_area(ring: &[Point]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let o = ring[0];
    let mut acc = 0.0;
    for i in 1..n - 1 {
        let a = ring[i] - o;
        let b = ring[i + 1] - o;
        acc += a.x * b.y - b.x * a.y;
    }
    0.5 * acc
}

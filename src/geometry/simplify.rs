//! Douglas-Peucker polyline simplification.

use crate::foundation::core::Point;

fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len2 = ab.hypot2();
    if len2 <= f64::EPSILON {
        return (p - a).hypot();
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).hypot()
}

/// Keep the endpoints and every vertex farther than `tolerance` from the simplified path.
///
/// Runs on an explicit stack so long inputs do not recurse.
pub fn douglas_peucker(points: &[Point], tolerance: f64) -> Vec<Point> {
    let n = points.len();
    if n < 3 || tolerance.is_nan() || tolerance <= 0.0 {
        return points.to_vec();
    }
    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    let mut stack = vec![(0usize, n - 1)];
    while let Some((first, last)) = stack.pop() {
        if last <= first + 1 {
            continue;
        }
        let (a, b) = (points[first], points[last]);
        let (idx, dist) = (first + 1..last)
            .map(|i| (i, segment_distance(points[i], a, b)))
            .fold((first, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });
        if dist > tolerance {
            keep[idx] = true;
            stack.push((first, idx));
            stack.push((idx, last));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

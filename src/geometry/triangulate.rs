//! Ear clipping over a single outer ring.

use crate::foundation::core::Point;
use crate::geometry::signed_area;

/// Convexity tolerance as a fraction of the ring's area.
const REL_EPS: f64 = 1e-12;

fn cross(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x)
}

/// Strict containment by edge orientation; points on an edge or at a corner are outside.
///
/// `sign` is the winding of `a, b, c` (`1.0` counter-clockwise). No division, so the test holds at
/// any coordinate scale.
fn in_triangle(p: Point, a: Point, b: Point, c: Point, sign: f64) -> bool {
    sign * cross(a, b, p) > 0.0 && sign * cross(b, c, p) > 0.0 && sign * cross(c, a, p) > 0.0
}

fn is_ear(ring: &[Point], remaining: &[usize], at: usize, ccw: bool, eps: f64) -> bool {
    let m = remaining.len();
    let ia = remaining[(at + m - 1) % m];
    let ib = remaining[at];
    let ic = remaining[(at + 1) % m];
    let (a, b, c) = (ring[ia], ring[ib], ring[ic]);

    let turn = cross(a, b, c);
    let convex = if ccw { turn > eps } else { turn < -eps };
    if !convex {
        return false;
    }
    let sign = if ccw { 1.0 } else { -1.0 };
    remaining
        .iter()
        .filter(|&&k| k != ia && k != ib && k != ic)
        .map(|&k| ring[k])
        .all(|p| p == a || p == b || p == c || !in_triangle(p, a, b, c, sign))
}

/// Append triangle indices (relative to `ring`) to `out` and return the triangle count.
///
/// A simple ring of `n` vertices yields `n - 2` triangles in the ring's own winding. When a
/// full pass finds no valid ear (self-intersecting or degenerate input) the current candidate
/// is clipped anyway. The loop is capped at `n²` attempts; whatever remains after that is closed
/// with one final triangle.
pub fn triangulate(ring: &[Point], out: &mut Vec<u32>) -> usize {
    let n = ring.len();
    if n < 3 {
        return 0;
    }
    let area = signed_area(ring);
    let ccw = area >= 0.0;
    let eps = area.abs() * REL_EPS;
    let mut remaining: Vec<usize> = (0..n).collect();
    let start = out.len();

    let max_attempts = n.saturating_mul(n);
    let mut attempts = 0usize;
    let mut misses = 0usize;
    let mut at = 0usize;

    while remaining.len() > 3 && attempts < max_attempts {
        attempts += 1;
        let m = remaining.len();
        at %= m;
        if misses >= m || is_ear(ring, &remaining, at, ccw, eps) {
            let prev = remaining[(at + m - 1) % m];
            let next = remaining[(at + 1) % m];
            out.extend([prev as u32, remaining[at] as u32, next as u32]);
            remaining.remove(at);
            misses = 0;
        } else {
            at += 1;
            misses += 1;
        }
    }

    if remaining.len() > 3 {
        tracing::debug!(
            vertices = n,
            left = remaining.len(),
            "ear clipping exhausted its attempts"
        );
    }
    let k = remaining.len();
    out.extend(remaining[k - 3..].iter().map(|&i| i as u32));

    (out.len() - start) / 3
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/triangulate.rs"]
mod tests;

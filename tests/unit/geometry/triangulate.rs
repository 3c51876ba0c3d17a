use super::*;

fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
    coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
}

fn triangle_area_sum(ring: &[Point], idx: &[u32]) -> f64 {
    idx.chunks_exact(3)
        .map(|t| {
            let (a, b, c) = (ring[t[0] as usize], ring[t[1] as usize], ring[t[2] as usize]);
            ((b - a).cross(c - a) * 0.5).abs()
        })
        .sum()
}

fn assert_exact_cover(ring: &[Point]) {
    let mut out = Vec::new();
    let tris = triangulate(ring, &mut out);
    assert_eq!(tris, ring.len() - 2);
    assert_eq!(out.len(), tris * 3);
    assert!(out.iter().all(|&i| (i as usize) < ring.len()));
    let want = signed_area(ring).abs();
    let got = triangle_area_sum(ring, &out);
    assert!((got - want).abs() < 1e-9, "area {got} != {want}");
}

#[test]
fn convex_square() {
    assert_exact_cover(&pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]));
}

#[test]
fn concave_l_shape() {
    assert_exact_cover(&pts(&[
        (0.0, 0.0),
        (2.0, 0.0),
        (2.0, 1.0),
        (1.0, 1.0),
        (1.0, 2.0),
        (0.0, 2.0),
    ]));
}

#[test]
fn clockwise_ring() {
    let mut ring = pts(&[
        (0.0, 0.0),
        (3.0, 0.0),
        (3.0, 3.0),
        (2.0, 1.0),
        (1.0, 3.0),
        (0.0, 3.0),
    ]);
    ring.reverse();
    assert!(signed_area(&ring) < 0.0);
    assert_exact_cover(&ring);
}

#[test]
fn star_polygon() {
    let ring: Vec<Point> = (0..10)
        .map(|i| {
            let r = if i % 2 == 0 { 1.0 } else { 0.4 };
            let a = std::f64::consts::TAU * i as f64 / 10.0;
            Point::new(r * a.cos(), r * a.sin())
        })
        .collect();
    assert_exact_cover(&ring);
}

#[test]
fn triangle_passes_through() {
    let ring = pts(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
    let mut out = vec![99];
    assert_eq!(triangulate(&ring, &mut out), 1);
    assert_eq!(out, vec![99, 0, 1, 2]);
}

#[test]
fn degenerate_input_terminates() {
    let bowtie = pts(&[(0.0, 0.0), (1.0, 1.0), (1.0, 0.0), (0.0, 1.0)]);
    let mut out = Vec::new();
    assert_eq!(triangulate(&bowtie, &mut out), 2);

    let collinear = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0), (4.0, 0.0)]);
    out.clear();
    assert_eq!(triangulate(&collinear, &mut out), 3);

    assert_eq!(triangulate(&collinear[..2], &mut out), 0);
}

#[test]
fn concave_ring_at_building_scale() {
    let chevron = [(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (2.0, 1.0), (0.0, 4.0)];
    for scale in [1.0, 1e-3, 1e-6, 1e-7] {
        let ring: Vec<Point> = chevron
            .iter()
            .map(|&(x, y)| Point::new(0.5 + x * scale, 0.5 + y * scale))
            .collect();
        let mut out = Vec::new();
        assert_eq!(triangulate(&ring, &mut out), 3);
        let want = 10.0 * scale * scale;
        let got = triangle_area_sum(&ring, &out);
        assert!(
            ((got - want) / want).abs() < 1e-6,
            "scale {scale}: area {got} != {want}"
        );
    }
}

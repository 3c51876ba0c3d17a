use super::*;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn origin_maps_to_center() {
    let p = project(LonLat::new(0.0, 0.0));
    assert!(close(p.x, 0.5));
    assert!(close(p.y, 0.5));
}

#[test]
fn longitude_spans_unit_interval() {
    assert!(close(project(LonLat::new(-180.0, 0.0)).x, 0.0));
    assert!(close(project(LonLat::new(180.0, 0.0)).x, 1.0));
    assert!(close(project(LonLat::new(90.0, 0.0)).x, 0.75));
}

#[test]
fn latitude_is_clamped_to_square_world() {
    let top = project(LonLat::new(0.0, 90.0));
    let edge = project(LonLat::new(0.0, MAX_LATITUDE));
    assert_eq!(top, edge);
    assert!(top.y.abs() < 1e-6);
    assert!(project(LonLat::new(0.0, -90.0)).y.is_finite());
    assert!(project(LonLat::new(0.0, 45.0)).y < 0.5, "north is up");
}

#[test]
fn non_finite_input_rejects_run() {
    let mut out = Vec::new();
    assert!(project_all(&[LonLat::new(0.0, 0.0), LonLat::new(f64::NAN, 1.0)], &mut out).is_none());
    assert!(out.is_empty());
}

#[test]
fn closing_vertex_is_dropped() {
    let mut ring = vec![
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(0.0, 1.0),
        Point::new(0.0, 0.0),
    ];
    open_ring(&mut ring);
    assert_eq!(ring.len(), 3);
    open_ring(&mut ring);
    assert_eq!(ring.len(), 3);
}

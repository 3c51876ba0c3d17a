use super::*;

#[test]
fn fnv_matches_reference_vector() {
    // FNV-1a 64 of "a" with the standard offset basis.
    assert_eq!(stable_hash64(0, "a"), 0xaf63_dc4c_8601_ec8c);
}

#[test]
fn seed_changes_hash() {
    assert_ne!(stable_hash64(0, "feature-1"), stable_hash64(1, "feature-1"));
}

#[test]
fn rng_is_deterministic_and_bounded() {
    let mut a = Rng64::new(42);
    let mut b = Rng64::new(42);
    for _ in 0..64 {
        let x = a.next_f64_01();
        assert_eq!(x, b.next_f64_01());
        assert!((0.0..1.0).contains(&x));
    }
}

#[test]
fn lerp_endpoints() {
    assert_eq!(lerp(2.0, 4.0, 0.0), 2.0);
    assert_eq!(lerp(2.0, 4.0, 1.0), 4.0);
    assert_eq!(lerp(2.0, 4.0, 0.5), 3.0);
}

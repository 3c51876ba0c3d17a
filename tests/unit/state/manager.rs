use super::*;
use crate::feature::model::{Geometry, LonLat};

fn features(n: usize) -> Vec<Feature> {
    (0..n)
        .map(|i| Feature::new(Geometry::Point(LonLat::new(0.0, 0.0))).with_id(format!("f{i}")))
        .collect()
}

fn id(s: &str) -> FeatureId {
    FeatureId::from(s)
}

fn staggered() -> FeatureAnimationStateManager {
    let mut m = FeatureAnimationStateManager::new(true);
    m.initialize_from_features(&features(3), None);
    m.set_time_offsets(&[0.0, 0.5, 1.0]);
    m.clear_dirty();
    m
}

#[test]
fn pause_freezes_and_resume_continues() {
    let mut m = staggered();
    m.tick(10.0, 0.016);
    assert_eq!(m.effective_time(&id("f1")), Some(10.5));

    assert!(m.pause(&id("f1")));
    assert_eq!(m.state(&id("f1")).unwrap().local_time, 10.5);

    m.tick(15.0, 0.016);
    assert_eq!(m.effective_time(&id("f1")), Some(10.5));
    assert_eq!(m.effective_time(&id("f2")), Some(16.0));

    assert!(m.play(&id("f1")));
    assert_eq!(m.effective_time(&id("f1")), Some(10.5));
    m.tick(16.0, 1.0);
    assert_eq!(m.effective_time(&id("f1")), Some(11.5));
    assert_eq!(m.state(&id("f1")).unwrap().play_count, 1);
}

#[test]
fn redundant_transitions_are_no_ops() {
    let mut m = staggered();
    assert!(!m.play(&id("f0")));
    assert!(!m.is_dirty());
    assert!(m.pause(&id("f0")));
    assert!(!m.pause(&id("f0")));
    assert_eq!(m.state(&id("f0")).unwrap().play_count, 0);
}

#[test]
fn unknown_ids_are_ignored() {
    let mut m = staggered();
    assert!(!m.play(&id("nope")));
    assert!(!m.pause(&id("nope")));
    assert!(!m.reset(&id("nope")));
    assert!(!m.toggle(&id("nope")));
    assert!(!m.is_dirty());
    assert_eq!(m.effective_time(&id("nope")), None);
}

#[test]
fn toggle_and_play_once_count_plays() {
    let mut m = FeatureAnimationStateManager::new(false);
    m.initialize_from_features(&features(1), None);
    assert!(m.toggle(&id("f0")));
    assert_eq!(m.is_playing(&id("f0")), Some(true));
    assert!(m.toggle(&id("f0")));
    assert!(m.play_once(&id("f0")));
    assert_eq!(m.state(&id("f0")).unwrap().play_count, 2);
}

#[test]
fn reset_restores_base_offset_and_keeps_play_state() {
    let mut m = staggered();
    m.tick(4.0, 0.0);
    m.pause(&id("f2"));
    m.tick(9.0, 0.0);
    m.play(&id("f2"));
    assert_eq!(m.effective_time(&id("f2")), Some(5.0));

    assert!(m.reset(&id("f2")));
    let s = m.state(&id("f2")).unwrap();
    assert!(s.is_playing);
    assert_eq!(s.local_time, 0.0);
    assert_eq!(s.play_count, 0);
    assert_eq!(m.effective_time(&id("f2")), Some(10.0));
}

#[test]
fn local_time_is_never_negative() {
    let mut m = FeatureAnimationStateManager::new(false);
    m.initialize_from_features(&features(1), None);
    m.tick(3.0, 0.0);
    m.play(&id("f0"));
    m.tick(1.0, 0.0);
    m.pause(&id("f0"));
    assert_eq!(m.state(&id("f0")).unwrap().local_time, 0.0);
}

#[test]
fn reinitialize_keeps_survivors_and_drops_vanished() {
    let mut m = staggered();
    m.tick(2.0, 0.0);
    m.pause(&id("f1"));

    let mut next = features(2);
    next.push(Feature::new(Geometry::Point(LonLat::new(0.0, 0.0))).with_id("g"));
    m.initialize_from_features(&next, None);

    assert_eq!(m.len(), 3);
    assert_eq!(m.state(&id("f1")).unwrap().local_time, 2.5);
    assert!(!m.state(&id("f1")).unwrap().is_playing);
    assert!(m.state(&id("f2")).is_none());
    assert!(m.state(&id("g")).unwrap().is_playing);
    assert!(m.is_dirty());
}

#[test]
fn shared_ids_share_state() {
    let fs: Vec<Feature> = (0..3)
        .map(|i| {
            Feature::new(Geometry::Point(LonLat::new(0.0, 0.0)))
                .with_property("road", if i == 1 { "b" } else { "a" })
        })
        .collect();
    let mut m = FeatureAnimationStateManager::new(true);
    m.initialize_from_features(&fs, Some("road"));
    assert_eq!(m.len(), 2);
    m.pause(&id("a"));
    assert_eq!(m.feature_values(0).map(|v| v.0), Some(false));
    assert_eq!(m.feature_values(1).map(|v| v.0), Some(true));
    assert_eq!(m.feature_values(2).map(|v| v.0), Some(false));
}

#[test]
fn bulk_operations_report_changes() {
    let mut m = staggered();
    m.pause(&id("f0"));
    assert_eq!(m.pause_all(), 2);
    assert_eq!(m.play_all(), 3);
    assert_eq!(m.reset_all(), 3);
    assert!(m.states().all(|s| s.play_count == 0));
}

#[test]
fn buffer_data_expands_per_vertex() {
    let mut m = staggered();
    m.tick(10.0, 0.0);
    m.pause(&id("f1"));
    let data = m.generate_buffer_data(&[4, 4, 0]);
    assert_eq!(data.vertex_count, 8);
    assert_eq!(data.values.len(), 8 * INTERACTION_STRIDE);
    assert_eq!(&data.values[0..3], &[1.0, 0.0, 0.0]);
    assert_eq!(&data.values[12..15], &[0.0, 10.5, 0.5]);
}

#[test]
fn dirty_flag_is_cleared_by_consumer() {
    let mut m = staggered();
    m.tick(1.0, 1.0);
    assert!(!m.is_dirty(), "ticking does not dirty");
    m.pause(&id("f0"));
    assert!(m.is_dirty());
    m.clear_dirty();
    assert!(!m.is_dirty());
}

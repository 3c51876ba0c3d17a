use super::*;
use crate::buffer::line::LineStrategy;
use crate::buffer::point::PointStrategy;
use crate::buffer::polygon::PolygonStrategy;
use crate::buffer::viewport::ViewportStrategy;
use crate::expression::value::OutputType;
use crate::feature::model::LonLat;
use crate::pool::object_pool::PoolOpts;
use serde_json::json;

struct Fixture {
    features: Vec<Feature>,
    offsets: Vec<f64>,
    states: FeatureAnimationStateManager,
    evaluator: ExpressionEvaluator,
}

impl Fixture {
    fn new(features: Vec<Feature>) -> Self {
        let mut states = FeatureAnimationStateManager::new(true);
        states.initialize_from_features(&features, None);
        let offsets = vec![0.0; features.len()];
        Self {
            features,
            offsets,
            states,
            evaluator: ExpressionEvaluator::new(),
        }
    }

    fn inputs(&self) -> BuildInputs<'_> {
        BuildInputs {
            features: &self.features,
            id_property: None,
            offsets: &self.offsets,
            states: &self.states,
            evaluator: &self.evaluator,
            defaults: StyleDefaults::default(),
            zoom: 0.0,
        }
    }
}

fn ll(lon: f64, lat: f64) -> LonLat {
    LonLat::new(lon, lat)
}

fn point(lon: f64, lat: f64) -> Feature {
    Feature::new(Geometry::Point(ll(lon, lat)))
}

fn vertex(out: &BuildOutput, i: usize) -> &[f32] {
    let s = out.stride();
    &out.vertices[i * s..(i + 1) * s]
}

#[test]
fn points_emit_one_quad_each() {
    let mut fx = Fixture::new(vec![point(0.0, 0.0), point(10.0, 10.0), point(-10.0, 5.0)]);
    fx.offsets = vec![0.0, 0.5, 1.0];
    let mut pools = PoolManager::default();
    let out = GeometryBufferBuilder::new(PointStrategy::new())
        .build(&fx.inputs(), &mut pools)
        .unwrap();

    assert_eq!(out.vertex_count(), 12);
    assert_eq!(out.index_count(), 18);
    assert_eq!(out.vertices_per_feature, vec![4, 4, 4]);
    assert_eq!(&out.indices[..6], &[0, 1, 2, 0, 2, 3]);
    assert_eq!(&out.indices[6..12], &[4, 5, 6, 4, 6, 7]);

    let v = vertex(&out, 0);
    assert_eq!(&v[..4], &[0.5, 0.5, -1.0, -1.0]);
    assert_eq!(&v[4..], &[0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0]);
    let v = vertex(&out, 5);
    assert_eq!(v[4], 1.0, "feature index");
    assert_eq!(v[5], 0.5, "time offset");
}

#[test]
fn multipoint_counts_every_member() {
    let fx = Fixture::new(vec![Feature::new(Geometry::MultiPoint(vec![
        ll(0.0, 0.0),
        ll(1.0, 1.0),
    ]))]);
    let mut pools = PoolManager::default();
    let out = GeometryBufferBuilder::new(PointStrategy::new())
        .build(&fx.inputs(), &mut pools)
        .unwrap();
    assert_eq!(out.vertices_per_feature, vec![8]);
}

#[test]
fn lines_emit_quad_per_segment_with_progress() {
    let fx = Fixture::new(vec![
        Feature::new(Geometry::LineString(vec![ll(0.0, 0.0), ll(1.0, 0.0), ll(3.0, 0.0)])),
        Feature::new(Geometry::LineString(vec![ll(0.0, 0.0)])),
    ]);
    let mut pools = PoolManager::default();
    let out = GeometryBufferBuilder::new(LineStrategy::new())
        .build(&fx.inputs(), &mut pools)
        .unwrap();

    assert_eq!(out.vertices_per_feature, vec![8, 0]);
    assert_eq!(&out.indices[..6], &[0, 1, 2, 1, 3, 2]);
    let first = vertex(&out, 0);
    assert_eq!(&first[4..7], &[0.0, -1.0, 0.0]);
    let mid = vertex(&out, 2);
    assert!((mid[6] - 1.0 / 3.0).abs() < 1e-6);
    let last = vertex(&out, 7);
    assert_eq!(&last[4..7], &[1.0, 1.0, 1.0]);
    assert!((last[7] - 3.0 / 360.0).abs() < 1e-6, "line length");
}

#[test]
fn multiline_progress_restarts_per_part() {
    let fx = Fixture::new(vec![Feature::new(Geometry::MultiLineString(vec![
        vec![ll(0.0, 0.0), ll(1.0, 0.0)],
        vec![ll(5.0, 0.0), ll(6.0, 0.0), ll(7.0, 0.0)],
    ]))]);
    let mut pools = PoolManager::default();
    let out = GeometryBufferBuilder::new(LineStrategy::new())
        .build(&fx.inputs(), &mut pools)
        .unwrap();
    assert_eq!(out.vertices_per_feature, vec![12]);
    assert_eq!(vertex(&out, 3)[6], 1.0);
    assert_eq!(vertex(&out, 4)[6], 0.0);
    assert_eq!(vertex(&out, 7)[6], 0.5);
}

#[test]
fn polygon_drops_closing_vertex_and_triangulates() {
    let square = vec![vec![
        ll(0.0, 0.0),
        ll(10.0, 0.0),
        ll(10.0, 10.0),
        ll(0.0, 10.0),
        ll(0.0, 0.0),
    ]];
    let sliver = vec![vec![ll(0.0, 0.0), ll(1.0, 1.0), ll(0.0, 0.0)]];
    let fx = Fixture::new(vec![
        Feature::new(Geometry::Polygon(square)),
        Feature::new(Geometry::Polygon(sliver)),
    ]);
    let mut pools = PoolManager::default();
    let out = GeometryBufferBuilder::new(PolygonStrategy::new())
        .build(&fx.inputs(), &mut pools)
        .unwrap();

    assert_eq!(out.vertices_per_feature, vec![4, 0]);
    assert_eq!(out.index_count(), 6);
    assert_eq!(out.skipped_features(), 1);
    let uvs: Vec<[f32; 2]> = (0..4).map(|i| [vertex(&out, i)[2], vertex(&out, i)[3]]).collect();
    assert!(uvs.contains(&[0.0, 0.0]));
    assert!(uvs.contains(&[1.0, 1.0]));
    let c = vertex(&out, 0);
    assert_eq!(c[4], vertex(&out, 3)[4], "centroid is shared");
}

#[test]
fn malformed_features_are_skipped_not_fatal() {
    let fx = Fixture::new(vec![
        point(f64::NAN, 0.0),
        Feature::default(),
        Feature::new(Geometry::LineString(vec![ll(0.0, 0.0), ll(1.0, 1.0)])),
        point(1.0, 1.0),
    ]);
    let mut pools = PoolManager::default();
    let out = GeometryBufferBuilder::new(PointStrategy::new())
        .build(&fx.inputs(), &mut pools)
        .unwrap();
    assert_eq!(out.vertices_per_feature, vec![0, 0, 0, 4]);
    assert_eq!(vertex(&out, 0)[4], 3.0, "index traces to the source feature");
}

#[test]
fn data_driven_color_and_intensity() {
    let mut fx = Fixture::new(vec![
        point(0.0, 0.0).with_property("type", "primary").with_property("w", 0.25),
        point(1.0, 0.0).with_property("type", "minor"),
    ]);
    fx.evaluator
        .compile_json(
            COLOR_CHANNEL,
            &json!(["match", ["get", "type"], "primary", "#ff0000", "#0000ff"]),
            OutputType::Color,
        )
        .unwrap();
    fx.evaluator
        .compile_json(INTENSITY_CHANNEL, &json!(["get", "w"]), OutputType::Number)
        .unwrap();
    let mut pools = PoolManager::default();
    let out = GeometryBufferBuilder::new(PointStrategy::new())
        .build(&fx.inputs(), &mut pools)
        .unwrap();

    assert_eq!(&vertex(&out, 0)[6..11], &[1.0, 0.0, 0.0, 1.0, 0.25]);
    assert_eq!(&vertex(&out, 4)[6..11], &[0.0, 0.0, 1.0, 1.0, 0.0]);
}

#[test]
fn paused_state_is_snapshotted() {
    let mut fx = Fixture::new(vec![point(0.0, 0.0), point(1.0, 1.0)]);
    fx.states.tick(3.0, 0.0);
    fx.states.pause(&FeatureId::positional(1));
    let mut pools = PoolManager::default();
    let out = GeometryBufferBuilder::new(PointStrategy::new())
        .build(&fx.inputs(), &mut pools)
        .unwrap();
    assert_eq!(&vertex(&out, 0)[11..], &[1.0, 0.0]);
    assert_eq!(&vertex(&out, 4)[11..], &[0.0, 3.0]);
}

#[test]
fn rebuild_is_byte_identical_and_reuses_pools() {
    let fx = Fixture::new(vec![
        Feature::new(Geometry::Polygon(vec![vec![
            ll(0.0, 0.0),
            ll(4.0, 0.0),
            ll(4.0, 2.0),
            ll(2.0, 1.0),
            ll(0.0, 2.0),
        ]])),
    ]);
    let mut pools = PoolManager::default();
    let mut builder = GeometryBufferBuilder::new(PolygonStrategy::new());
    let a = builder.build(&fx.inputs(), &mut pools).unwrap();
    let created = pools.stats().total_created();
    let b = builder.build(&fx.inputs(), &mut pools).unwrap();

    assert_eq!(a, b);
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_eq!(a.vertex_bytes(), b.vertex_bytes());
    assert_eq!(pools.stats().total_created(), created);
    assert_eq!(pools.stats().in_use(), 0);
}

#[test]
fn viewport_needs_no_features() {
    let fx = Fixture::new(Vec::new());
    let mut pools = PoolManager::default();
    let out = GeometryBufferBuilder::new(ViewportStrategy)
        .build(&fx.inputs(), &mut pools)
        .unwrap();
    assert_eq!(out.vertex_count(), 4);
    assert_eq!(out.unbound_vertices, 4);
    assert!(out.vertices_per_feature.is_empty());
    assert_eq!(&vertex(&out, 2)[..4], &[1.0, 1.0, 1.0, 1.0]);
}

#[test]
fn pool_exhaustion_fails_and_returns_records() {
    let fx = Fixture::new(vec![Feature::new(Geometry::MultiPoint(vec![
        ll(0.0, 0.0),
        ll(1.0, 0.0),
        ll(2.0, 0.0),
    ]))]);
    let mut pools = PoolManager::new(PoolOpts {
        batch_size: 2,
        max_size: 2,
    });
    let err = GeometryBufferBuilder::new(PointStrategy::new())
        .build(&fx.inputs(), &mut pools)
        .unwrap_err();
    assert!(err.is_fatal_to_layer());
    assert_eq!(pools.stats().in_use(), 0);
}

#[test]
fn untracked_features_agree_with_the_interaction_buffer() {
    let mut fx = Fixture::new(vec![point(0.0, 0.0)]);
    fx.states = FeatureAnimationStateManager::new(true);
    let out = GeometryBufferBuilder::new(PointStrategy::new())
        .build(&fx.inputs(), &mut PoolManager::default())
        .unwrap();

    let playing_at = out.stride() - 2;
    let live = fx.states.generate_buffer_data(&out.vertices_per_feature);
    for i in 0..out.vertex_count() {
        assert_eq!(vertex(&out, i)[playing_at], 0.0);
        assert_eq!(live.values[i * 3], vertex(&out, i)[playing_at]);
    }
}

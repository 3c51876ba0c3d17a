use super::*;
use crate::feature::model::{Geometry, LonLat};
use crate::foundation::core::FeatureId;
use crate::layer::host::BufferKind;
use crate::shader::uniforms::Uniforms;
use crate::state::interaction::{ClickAction, InteractivityConfig};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Compile,
    Create(BufferKind),
    Upload(u64, usize),
    Bind(u64, usize),
    Uniforms(usize),
    Draw(usize),
    DeleteBuffer(u64),
    DeleteProgram,
}

#[derive(Default)]
struct RecordingHost {
    calls: Vec<Call>,
    uploads: HashMap<u64, Vec<u8>>,
    next: u64,
    fail_compile: bool,
    fail_buffer_after: Option<usize>,
}

impl RecordingHost {
    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    fn live_buffers(&self) -> usize {
        let created = self.count(|c| matches!(c, Call::Create(_)));
        let deleted = self.count(|c| matches!(c, Call::DeleteBuffer(_)));
        created - deleted
    }
}

impl RenderHost for RecordingHost {
    fn compile_program(&mut self, _vertex: &str, _fragment: &str) -> FxResult<ProgramHandle> {
        if self.fail_compile {
            return Err(FxError::compile("syntax error"));
        }
        self.calls.push(Call::Compile);
        Ok(ProgramHandle(99))
    }

    fn create_buffer(&mut self, kind: BufferKind) -> FxResult<BufferHandle> {
        if let Some(n) = self.fail_buffer_after
            && self.count(|c| matches!(c, Call::Create(_))) >= n
        {
            return Err(FxError::allocation("out of buffers"));
        }
        self.calls.push(Call::Create(kind));
        self.next += 1;
        Ok(BufferHandle(self.next))
    }

    fn upload_buffer(&mut self, buffer: BufferHandle, bytes: &[u8]) {
        self.calls.push(Call::Upload(buffer.0, bytes.len()));
        self.uploads.insert(buffer.0, bytes.to_vec());
    }

    fn bind_attributes(
        &mut self,
        _program: ProgramHandle,
        buffer: BufferHandle,
        layout: &'static crate::buffer::layout::VertexLayout,
    ) {
        self.calls.push(Call::Bind(buffer.0, layout.stride));
    }

    fn set_uniforms(&mut self, _program: ProgramHandle, uniforms: &Uniforms) {
        self.calls.push(Call::Uniforms(uniforms.len()));
    }

    fn draw_indexed(&mut self, _program: ProgramHandle, _indices: BufferHandle, count: usize) {
        self.calls.push(Call::Draw(count));
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        self.calls.push(Call::DeleteBuffer(buffer.0));
    }

    fn delete_program(&mut self, _program: ProgramHandle) {
        self.calls.push(Call::DeleteProgram);
    }
}

fn points(n: usize) -> Vec<Feature> {
    (0..n)
        .map(|i| {
            Feature::new(Geometry::Point(LonLat::new(i as f64, 0.0))).with_id(format!("f{i}"))
        })
        .collect()
}

fn layer(config: LayerConfig) -> LayerController {
    LayerController::new(config, &ShaderRegistry::with_builtins(), PoolManager::default())
}

fn interactive() -> LayerConfig {
    LayerConfig {
        timing: TimingConfig::Stagger { step: 0.5 },
        interactivity: InteractivityConfig {
            per_feature_control: true,
            on_click: ClickAction::Toggle,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn interaction_floats(host: &RecordingHost) -> Vec<f32> {
    host.uploads[&3]
        .chunks_exact(4)
        .map(bytemuck::pod_read_unaligned::<f32>)
        .collect()
}

#[test]
fn lifecycle_uploads_and_draws() {
    let mut host = RecordingHost::default();
    let mut l = layer(interactive());
    assert_eq!(l.state(), LayerState::Uninitialized);
    assert!(!l.render(&mut host, &FrameContext::default()));

    l.initialize(&mut host).unwrap();
    assert_eq!(l.state(), LayerState::Ready);
    l.rebuild(&mut host, &points(3)).unwrap();

    assert_eq!(host.uploads[&1].len(), 12 * 13 * 4);
    assert_eq!(host.uploads[&2].len(), 18 * 4);
    assert_eq!(interaction_floats(&host).len(), 12 * 3);
    assert_eq!(l.last_build().unwrap().vertex_count, 12);

    assert!(l.render(&mut host, &FrameContext::at(1.0, 0.016)));
    assert_eq!(host.calls.last(), Some(&Call::Draw(18)));
    assert!(host.calls.contains(&Call::Bind(1, 13)));
    assert!(host.calls.contains(&Call::Bind(3, 3)));
}

#[test]
fn interaction_buffer_reuploads_only_when_dirty() {
    let mut host = RecordingHost::default();
    let mut l = layer(interactive());
    l.initialize(&mut host).unwrap();
    l.rebuild(&mut host, &points(3)).unwrap();
    let uploads = |h: &RecordingHost| h.count(|c| matches!(c, Call::Upload(3, _)));
    assert_eq!(uploads(&host), 1);

    l.render(&mut host, &FrameContext::at(10.0, 0.016));
    l.render(&mut host, &FrameContext::at(10.016, 0.016));
    assert_eq!(uploads(&host), 1);

    assert!(l.handle_event(&InteractionEvent::Click(FeatureId::from("f1"))));
    l.render(&mut host, &FrameContext::at(10.5, 0.016));
    assert_eq!(uploads(&host), 2);

    let floats = interaction_floats(&host);
    let f1 = &floats[4 * 3..4 * 3 + 3];
    assert_eq!(f1[0], 0.0);
    assert!((f1[1] - 10.516).abs() < 1e-4, "frozen at the pause instant");
}

#[test]
fn compile_failure_is_terminal_and_isolated() {
    let mut bad_host = RecordingHost {
        fail_compile: true,
        ..Default::default()
    };
    let mut good_host = RecordingHost::default();
    let mut broken = layer(LayerConfig::default());
    let mut sibling = layer(LayerConfig::default());

    assert!(broken.initialize(&mut bad_host).is_err());
    sibling.initialize(&mut good_host).unwrap();
    assert_eq!(broken.state(), LayerState::Error);

    broken.rebuild(&mut bad_host, &points(2)).unwrap();
    assert!(!broken.render(&mut bad_host, &FrameContext::default()));
    assert!(!broken.render(&mut bad_host, &FrameContext::default()));
    assert!(broken.initialize(&mut bad_host).is_ok(), "no retry once failed");
    assert!(bad_host.calls.is_empty());

    sibling.rebuild(&mut good_host, &points(2)).unwrap();
    assert!(sibling.render(&mut good_host, &FrameContext::default()));
}

#[test]
fn unknown_shader_fails_setup() {
    let mut host = RecordingHost::default();
    let mut l = layer(LayerConfig {
        shader: "nope".into(),
        ..Default::default()
    });
    let err = l.initialize(&mut host).unwrap_err();
    assert!(matches!(err, FxError::Compile(_)));
    assert_eq!(l.state(), LayerState::Error);
}

#[test]
fn partial_setup_is_rolled_back() {
    let mut host = RecordingHost {
        fail_buffer_after: Some(2),
        ..Default::default()
    };
    let mut l = layer(LayerConfig::default());
    assert!(l.initialize(&mut host).is_err());
    assert_eq!(host.live_buffers(), 0);
    assert!(host.calls.contains(&Call::DeleteProgram));
}

#[test]
fn pool_exhaustion_disables_layer() {
    let mut host = RecordingHost::default();
    let mut l = LayerController::new(
        LayerConfig::default(),
        &ShaderRegistry::with_builtins(),
        PoolManager::new(crate::pool::object_pool::PoolOpts {
            batch_size: 1,
            max_size: 1,
        }),
    );
    l.initialize(&mut host).unwrap();
    let mut fs = points(1);
    fs[0].geometry = Some(Geometry::MultiPoint(vec![LonLat::new(0.0, 0.0); 2]));
    assert!(l.rebuild(&mut host, &fs).is_err());
    assert_eq!(l.state(), LayerState::Error);
    assert_eq!(host.live_buffers(), 0);
    assert_eq!(l.pool_stats().in_use(), 0);
}

#[test]
fn throttle_defers_and_flushes() {
    let mut host = RecordingHost::default();
    let mut l = layer(LayerConfig {
        rebuild_interval_ms: 100,
        ..Default::default()
    });
    l.initialize(&mut host).unwrap();
    let t0 = Instant::now();

    assert!(l.on_data_changed(&mut host, &points(1), t0).unwrap());
    assert!(!l.on_data_changed(&mut host, &points(2), t0 + Duration::from_millis(10)).unwrap());
    assert!(!l.on_data_changed(&mut host, &points(3), t0 + Duration::from_millis(20)).unwrap());
    assert_eq!(l.last_build().unwrap().vertex_count, 4);
    assert!(l.next_flush_at().is_some());

    assert!(!l.flush_pending_rebuild(&mut host, &points(3), t0 + Duration::from_millis(50)).unwrap());
    assert!(l.flush_pending_rebuild(&mut host, &points(3), t0 + Duration::from_millis(100)).unwrap());
    assert_eq!(l.last_build().unwrap().vertex_count, 12);
    assert!(l.next_flush_at().is_none());
}

#[test]
fn bad_expression_falls_back_to_default() {
    let mut cfg = LayerConfig::default();
    cfg.config.insert("color".into(), serde_json::json!(["match", ["get", "k"]]));
    cfg.config.insert("intensity".into(), serde_json::json!(["get", "w"]));
    let l = layer(cfg);
    assert!(!l.evaluator().has(COLOR_CHANNEL));
    assert!(l.evaluator().has(INTENSITY_CHANNEL));
}

#[test]
fn rebuild_is_idempotent() {
    let mut host = RecordingHost::default();
    let mut l = layer(interactive());
    l.initialize(&mut host).unwrap();
    l.rebuild(&mut host, &points(5)).unwrap();
    let a = l.last_build().cloned().unwrap();
    l.rebuild(&mut host, &points(5)).unwrap();
    assert_eq!(l.last_build(), Some(&a));
}

#[test]
fn dispose_releases_everything() {
    let mut host = RecordingHost::default();
    let mut l = layer(LayerConfig::default());
    l.initialize(&mut host).unwrap();
    l.rebuild(&mut host, &points(2)).unwrap();
    l.dispose(&mut host);

    assert_eq!(host.live_buffers(), 0);
    assert_eq!(host.count(|c| matches!(c, Call::DeleteProgram)), 1);
    assert_eq!(l.state(), LayerState::Uninitialized);
    assert_eq!(l.pool_stats().points.available, 0);

    l.dispose(&mut host);
    assert_eq!(host.count(|c| matches!(c, Call::DeleteProgram)), 1);
}

#[test]
fn viewport_layer_draws_without_features() {
    let mut host = RecordingHost::default();
    let mut l = layer(LayerConfig {
        shader: "scanline".into(),
        ..Default::default()
    });
    l.initialize(&mut host).unwrap();
    l.rebuild(&mut host, &[]).unwrap();
    assert_eq!(interaction_floats(&host), vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    assert!(l.render(&mut host, &FrameContext::default()));
    assert_eq!(host.calls.last(), Some(&Call::Draw(6)));
}

#[test]
fn zoom_driven_intensity_follows_the_map_zoom() {
    let intensity_at = |host: &RecordingHost| {
        let tail = crate::buffer::layout::POINT_LAYOUT.shape_len();
        bytemuck::pod_read_unaligned::<f32>(&host.uploads[&1][(tail + 6) * 4..(tail + 7) * 4])
    };
    let mut cfg = LayerConfig {
        rebuild_interval_ms: 100,
        ..Default::default()
    };
    cfg.config.insert(
        "intensity".into(),
        serde_json::json!(["interpolate", ["linear"], ["zoom"], 0, 0, 20, 20]),
    );
    let mut host = RecordingHost::default();
    let mut l = layer(cfg);
    l.initialize(&mut host).unwrap();
    let data = points(1);

    assert!(!l.set_zoom(0.0));
    l.rebuild(&mut host, &data).unwrap();
    assert_eq!(intensity_at(&host), 0.0);

    // Rendering at another zoom does not touch the vertex buffer.
    let frame = FrameContext {
        zoom: 12.0,
        ..FrameContext::at(1.0, 0.016)
    };
    assert!(l.render(&mut host, &frame));
    assert_eq!(intensity_at(&host), 0.0);

    let t0 = Instant::now();
    assert!(l.on_zoom_changed(&mut host, &data, 12.0, t0).unwrap());
    assert_eq!(intensity_at(&host), 12.0);

    // Within the interval the change is deferred, then flushed.
    assert!(!l.on_zoom_changed(&mut host, &data, 15.0, t0 + Duration::from_millis(10)).unwrap());
    assert_eq!(intensity_at(&host), 12.0);
    let due = l.next_flush_at().unwrap();
    assert!(l.flush_pending_rebuild(&mut host, &data, due).unwrap());
    assert_eq!(intensity_at(&host), 15.0);

    // Same zoom: nothing to do.
    assert!(!l.on_zoom_changed(&mut host, &data, 15.0, due).unwrap());
}

#[test]
fn zoom_change_without_zoom_expressions_skips_rebuild() {
    let mut host = RecordingHost::default();
    let mut l = layer(LayerConfig::default());
    l.initialize(&mut host).unwrap();
    let data = points(2);
    l.rebuild(&mut host, &data).unwrap();
    let uploads = host.count(|c| matches!(c, Call::Upload(..)));

    assert!(!l.on_zoom_changed(&mut host, &data, 9.0, Instant::now()).unwrap());
    assert_eq!(l.zoom(), 9.0);
    assert_eq!(host.count(|c| matches!(c, Call::Upload(..))), uploads);
}

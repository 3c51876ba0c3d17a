use std::sync::Arc;
use std::time::Instant;

use crate::buffer::builder::{
    BuildInputs, BuildOutput, COLOR_CHANNEL, GeometryBufferBuilder, INTENSITY_CHANNEL,
    StyleDefaults,
};
use crate::buffer::fingerprint::BufferFingerprint;
use crate::buffer::layout::{GeometryClass, INTERACTION_LAYOUT};
use crate::buffer::{LineStrategy, PointStrategy, PolygonStrategy, ViewportStrategy};
use crate::expression::evaluator::ExpressionEvaluator;
use crate::feature::model::Feature;
use crate::foundation::core::LogOnce;
use crate::foundation::error::{FxError, FxResult};
use crate::layer::config::LayerConfig;
use crate::layer::host::{BufferHandle, BufferKind, FrameContext, ProgramHandle, RenderHost};
use crate::layer::simplify::presimplify;
use crate::layer::throttle::{RebuildThrottle, ThrottleDecision};
use crate::pool::{PoolManager, PoolManagerStats};
use crate::shader::config::ShaderConfig;
use crate::shader::{ShaderDefinition, ShaderRegistry};
use crate::state::interaction::{FeatureInteractionHandler, InteractionEvent};
use crate::state::manager::FeatureAnimationStateManager;
use crate::timing::{TimeOffsetCalculator, TimingConfig};
use crate::worker::SimplifyWorker;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerState {
    Uninitialized,
    Ready,
    /// Setup or a rebuild failed fatally. Terminal for this instance.
    Error,
}

enum ClassBuilder {
    Point(GeometryBufferBuilder<PointStrategy>),
    Line(GeometryBufferBuilder<LineStrategy>),
    Polygon(GeometryBufferBuilder<PolygonStrategy>),
    Viewport(GeometryBufferBuilder<ViewportStrategy>),
}

impl ClassBuilder {
    fn for_class(class: GeometryClass) -> Self {
        match class {
            GeometryClass::Point => Self::Point(GeometryBufferBuilder::new(PointStrategy::new())),
            GeometryClass::Line => Self::Line(GeometryBufferBuilder::new(LineStrategy::new())),
            GeometryClass::Polygon => {
                Self::Polygon(GeometryBufferBuilder::new(PolygonStrategy::new()))
            }
            GeometryClass::Viewport => Self::Viewport(GeometryBufferBuilder::new(ViewportStrategy)),
        }
    }

    fn build(
        &mut self,
        inputs: &BuildInputs<'_>,
        pools: &mut PoolManager,
    ) -> FxResult<BuildOutput> {
        match self {
            Self::Point(b) => b.build(inputs, pools),
            Self::Line(b) => b.build(inputs, pools),
            Self::Polygon(b) => b.build(inputs, pools),
            Self::Viewport(b) => b.build(inputs, pools),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct GpuResources {
    program: ProgramHandle,
    vertices: BufferHandle,
    indices: BufferHandle,
    interaction: BufferHandle,
}

impl GpuResources {
    fn release(self, host: &mut dyn RenderHost) {
        host.delete_buffer(self.interaction);
        host.delete_buffer(self.indices);
        host.delete_buffer(self.vertices);
        host.delete_program(self.program);
    }
}

/// Summary of the last successful rebuild.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildSummary {
    pub vertex_count: usize,
    pub index_count: usize,
    pub skipped_features: usize,
    pub fingerprint: BufferFingerprint,
}

/// Lifecycle of one effect layer: setup, throttled rebuilds, per-frame uniforms, teardown.
///
/// Failures stay inside the instance. A fatal failure moves the layer to
/// [`LayerState::Error`], after which rendering is skipped and logged once.
pub struct LayerController {
    config: LayerConfig,
    shader: Option<Arc<ShaderDefinition>>,
    shader_config: ShaderConfig,
    defaults: StyleDefaults,
    state: LayerState,
    pools: PoolManager,
    evaluator: ExpressionEvaluator,
    offsets: TimeOffsetCalculator,
    states: FeatureAnimationStateManager,
    interaction: FeatureInteractionHandler,
    builder: Option<ClassBuilder>,
    throttle: RebuildThrottle,
    worker: Option<SimplifyWorker>,
    resources: Option<GpuResources>,
    vertices_per_feature: Vec<u32>,
    unbound_vertices: u32,
    index_count: usize,
    last_build: Option<BuildSummary>,
    zoom: f64,
    log: LogOnce,
}

impl LayerController {
    /// Resolve the shader and compile data-driven channels. Never fails: an unknown shader is
    /// reported by [`initialize`](Self::initialize).
    pub fn new(config: LayerConfig, registry: &ShaderRegistry, pools: PoolManager) -> Self {
        let shader = registry.get(&config.shader);
        let mut log = LogOnce::new();
        let mut evaluator = ExpressionEvaluator::new();
        let shader_config = match &shader {
            Some(def) => {
                let (parsed, errors) = ShaderConfig::parse(&def.schema, &config.config);
                for e in errors {
                    if log.first(&format!("config:{}", e.field())) {
                        tracing::warn!(layer = %config.id, error = %e, "config field falls back to its default");
                    }
                }
                for (field, expr, ty) in parsed.expressions() {
                    if let Err(e) = evaluator.compile(field, expr, ty)
                        && log.first(&format!("expression:{field}"))
                    {
                        tracing::warn!(layer = %config.id, field, error = %e, "expression falls back to its default");
                    }
                }
                parsed
            }
            None => ShaderConfig::default(),
        };
        let defaults = StyleDefaults {
            color: shader_config.color(COLOR_CHANNEL),
            intensity: shader_config.number(INTENSITY_CHANNEL),
        };
        let states =
            FeatureAnimationStateManager::new(config.interactivity.initial_state.is_playing());
        let interaction = FeatureInteractionHandler::new(config.interactivity.clone());
        let throttle = RebuildThrottle::new(config.rebuild_interval());

        Self {
            shader,
            shader_config,
            defaults,
            state: LayerState::Uninitialized,
            pools,
            evaluator,
            offsets: TimeOffsetCalculator::new(),
            states,
            interaction,
            builder: None,
            throttle,
            worker: None,
            resources: None,
            vertices_per_feature: Vec::new(),
            unbound_vertices: 0,
            index_count: 0,
            last_build: None,
            zoom: 0.0,
            log,
            config,
        }
    }

    /// Attach a background worker used when `simplify` is configured.
    pub fn with_worker(mut self, worker: SimplifyWorker) -> Self {
        self.worker = Some(worker);
        self
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn state(&self) -> LayerState {
        self.state
    }

    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    pub fn feature_states(&self) -> &FeatureAnimationStateManager {
        &self.states
    }

    pub fn feature_states_mut(&mut self) -> &mut FeatureAnimationStateManager {
        &mut self.states
    }

    pub fn evaluator(&self) -> &ExpressionEvaluator {
        &self.evaluator
    }

    pub fn pool_stats(&self) -> PoolManagerStats {
        self.pools.stats()
    }

    pub fn last_build(&self) -> Option<&BuildSummary> {
        self.last_build.as_ref()
    }

    /// When the host timer should call [`flush_pending_rebuild`](Self::flush_pending_rebuild).
    pub fn next_flush_at(&self) -> Option<Instant> {
        self.throttle.deadline()
    }

    /// `Uninitialized → Ready`, or `→ Error` on any setup failure.
    pub fn initialize(&mut self, host: &mut dyn RenderHost) -> FxResult<()> {
        if self.state != LayerState::Uninitialized {
            return Ok(());
        }
        match self.setup(host) {
            Ok(res) => {
                self.resources = Some(res);
                self.state = LayerState::Ready;
                tracing::debug!(layer = %self.config.id, shader = %self.config.shader, "layer ready");
                Ok(())
            }
            Err(e) => {
                self.fail("setup", &e);
                Err(e)
            }
        }
    }

    fn setup(&mut self, host: &mut dyn RenderHost) -> FxResult<GpuResources> {
        let def = self
            .shader
            .clone()
            .ok_or_else(|| FxError::compile(format!("unknown shader \"{}\"", self.config.shader)))?;
        let program = host.compile_program(&def.vertex_source, &def.fragment_source)?;

        let mut created = Vec::with_capacity(3);
        for kind in [BufferKind::Vertex, BufferKind::Index, BufferKind::Vertex] {
            match host.create_buffer(kind) {
                Ok(b) => created.push(b),
                Err(e) => {
                    for b in created {
                        host.delete_buffer(b);
                    }
                    host.delete_program(program);
                    return Err(e);
                }
            }
        }
        self.builder = Some(ClassBuilder::for_class(def.class));
        Ok(GpuResources {
            program,
            vertices: created[0],
            indices: created[1],
            interaction: created[2],
        })
    }

    fn fail(&mut self, stage: &str, e: &FxError) {
        self.state = LayerState::Error;
        if self.log.first(stage) {
            tracing::error!(layer = %self.config.id, stage, error = %e, "layer disabled");
        }
    }

    /// Backing data changed. Rebuilds now or defers per the throttle; returns whether it ran.
    pub fn on_data_changed(
        &mut self,
        host: &mut dyn RenderHost,
        features: &[Feature],
        now: Instant,
    ) -> FxResult<bool> {
        match self.throttle.request(now) {
            ThrottleDecision::Run => self.rebuild(host, features).map(|()| true),
            ThrottleDecision::Deferred => Ok(false),
        }
    }

    /// Map zoom used by the next rebuild. Returns whether it changed in a way that alters the
    /// vertex buffer, i.e. some compiled channel reads `["zoom"]`.
    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        let changed = zoom != self.zoom;
        self.zoom = zoom;
        changed && self.evaluator.reads_zoom()
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// The map zoom changed. Zoom-driven channels go through the same throttle as data changes;
    /// returns whether a rebuild ran now.
    pub fn on_zoom_changed(
        &mut self,
        host: &mut dyn RenderHost,
        features: &[Feature],
        zoom: f64,
        now: Instant,
    ) -> FxResult<bool> {
        if !self.set_zoom(zoom) {
            return Ok(false);
        }
        tracing::trace!(layer = %self.config.id, zoom, "zoom-driven rebuild requested");
        self.on_data_changed(host, features, now)
    }

    /// Run the deferred trailing rebuild if it is due.
    pub fn flush_pending_rebuild(
        &mut self,
        host: &mut dyn RenderHost,
        features: &[Feature],
        now: Instant,
    ) -> FxResult<bool> {
        if !self.throttle.take_due(now) {
            return Ok(false);
        }
        self.rebuild(host, features).map(|()| true)
    }

    /// Regenerate every buffer from `features` and upload it.
    #[tracing::instrument(skip_all, fields(layer = %self.config.id, features = features.len()))]
    pub fn rebuild(&mut self, host: &mut dyn RenderHost, features: &[Feature]) -> FxResult<()> {
        let (Some(res), Some(builder)) = (self.resources, self.builder.as_mut()) else {
            return Ok(());
        };
        if self.state != LayerState::Ready {
            return Ok(());
        }

        let simplified = match (&mut self.worker, &self.config.simplify) {
            (Some(worker), Some(cfg)) if needs_simplify(builder) => {
                match presimplify(worker, features, cfg) {
                    Ok(f) => Some(f),
                    Err(e) => {
                        if self.log.first("simplify") {
                            tracing::warn!(error = %e, "building from raw geometry");
                        }
                        None
                    }
                }
            }
            _ => None,
        };
        let features = simplified.as_deref().unwrap_or(features);

        let id_property = self.config.interactivity.feature_id_property.as_deref();
        self.states.initialize_from_features(features, id_property);
        let offsets = match self
            .offsets
            .calculate_offsets(features, &self.config.timing, id_property)
        {
            Ok(o) => o,
            Err(e) => {
                if self.log.first("timing") {
                    tracing::warn!(error = %e, "timing expression failed; using no offsets");
                }
                self.offsets
                    .calculate_offsets(features, &TimingConfig::None, id_property)
                    .unwrap_or_default()
            }
        };
        self.states.set_time_offsets(&offsets);

        let inputs = BuildInputs {
            features,
            id_property,
            offsets: &offsets,
            states: &self.states,
            evaluator: &self.evaluator,
            defaults: self.defaults,
            zoom: self.zoom,
        };
        let output = match builder.build(&inputs, &mut self.pools) {
            Ok(out) => out,
            Err(e) => {
                if e.is_fatal_to_layer() {
                    self.fail("rebuild", &e);
                    if let Some(res) = self.resources.take() {
                        res.release(host);
                    }
                }
                return Err(e);
            }
        };

        host.upload_buffer(res.vertices, output.vertex_bytes());
        host.upload_buffer(res.indices, output.index_bytes());
        self.vertices_per_feature = output.vertices_per_feature.clone();
        self.unbound_vertices = output.unbound_vertices;
        self.index_count = output.index_count();
        self.upload_interaction(host, res.interaction);

        self.last_build = Some(BuildSummary {
            vertex_count: output.vertex_count(),
            index_count: output.index_count(),
            skipped_features: output.skipped_features(),
            fingerprint: output.fingerprint(),
        });
        Ok(())
    }

    fn upload_interaction(&mut self, host: &mut dyn RenderHost, buffer: BufferHandle) {
        let mut data = self.states.generate_buffer_data(&self.vertices_per_feature);
        data.push_unbound(self.unbound_vertices);
        host.upload_buffer(buffer, bytemuck::cast_slice(&data.values));
        self.states.clear_dirty();
    }

    /// Per-frame work: advance the clock, re-upload play state if it changed, set uniforms and
    /// draw. Returns whether a draw call was issued.
    ///
    /// `frame.zoom` only feeds the `u_zoom` uniform; data-driven channels see the zoom given to
    /// [`on_zoom_changed`](Self::on_zoom_changed).
    pub fn render(&mut self, host: &mut dyn RenderHost, frame: &FrameContext) -> bool {
        match self.state {
            LayerState::Ready => {}
            LayerState::Uninitialized => return false,
            LayerState::Error => {
                if self.log.first("render-skipped") {
                    tracing::warn!(layer = %self.config.id, "skipping render of failed layer");
                }
                return false;
            }
        }
        let (Some(res), Some(def)) = (self.resources, self.shader.clone()) else {
            return false;
        };

        self.states.tick(frame.time, frame.delta_time);
        if self.states.is_dirty() {
            self.upload_interaction(host, res.interaction);
        }

        let mut uniforms = def.uniforms(&self.shader_config, frame.time, frame.delta_time);
        uniforms
            .set("u_matrix", frame.matrix)
            .set("u_resolution", frame.resolution)
            .set("u_zoom", frame.zoom);
        host.set_uniforms(res.program, &uniforms);

        if self.index_count == 0 {
            return false;
        }
        host.bind_attributes(res.program, res.vertices, def.class.layout());
        host.bind_attributes(res.program, res.interaction, &INTERACTION_LAYOUT);
        host.draw_indexed(res.program, res.indices, self.index_count);
        true
    }

    /// Forward a host interaction event. Returns whether any feature state changed.
    pub fn handle_event(&mut self, event: &InteractionEvent) -> bool {
        self.interaction.handle(&mut self.states, event)
    }

    /// Release every resource. A failed layer stays failed; otherwise it returns to
    /// `Uninitialized`.
    pub fn dispose(&mut self, host: &mut dyn RenderHost) {
        if let Some(res) = self.resources.take() {
            res.release(host);
        }
        self.throttle.cancel();
        self.builder = None;
        self.pools.clear();
        self.vertices_per_feature.clear();
        self.unbound_vertices = 0;
        self.index_count = 0;
        self.last_build = None;
        if self.state == LayerState::Ready {
            self.state = LayerState::Uninitialized;
        }
        tracing::debug!(layer = %self.config.id, "layer disposed");
    }
}

fn needs_simplify(builder: &ClassBuilder) -> bool {
    matches!(builder, ClassBuilder::Line(_) | ClassBuilder::Polygon(_))
}

impl std::fmt::Debug for LayerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerController")
            .field("id", &self.config.id)
            .field("shader", &self.config.shader)
            .field("state", &self.state)
            .field("index_count", &self.index_count)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layer/controller.rs"]
mod tests;

//! featurefx turns vector feature collections into animated, per-feature effect layers for a
//! host map renderer.
//!
//! # Pipeline overview
//!
//! 1. **Time**: `TimingConfig + features -> offsets` (deterministic per-feature phase offsets)
//! 2. **Style**: data-driven `color`/`intensity` channels compiled once by the
//!    [`ExpressionEvaluator`] and evaluated per feature
//! 3. **Build**: [`GeometryBufferBuilder`] projects, derives and tessellates features into one
//!    fixed-stride interleaved vertex buffer plus a `u32` index buffer per geometry class
//! 4. **Play state**: [`FeatureAnimationStateManager`] keeps per-feature play/pause on a shared
//!    clock and packs it into a small interaction buffer re-uploaded only when it changes
//! 5. **Draw**: [`LayerController`] owns the lifecycle against a [`RenderHost`]
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic builds**: unchanged inputs produce byte-identical buffers.
//! - **Failures stay local**: a bad feature is skipped, a bad expression falls back to its
//!   default, and a failed layer never affects its siblings.
#![forbid(unsafe_code)]

mod buffer;
mod expression;
mod feature;
mod foundation;
mod geometry;
mod layer;
mod pool;
mod shader;
mod state;
mod timing;
mod worker;

pub use buffer::builder::{
    BuildInputs, BuildOutput, COLOR_CHANNEL, GeometryBufferBuilder, INTENSITY_CHANNEL,
    StyleDefaults,
};
pub use buffer::fingerprint::BufferFingerprint;
pub use buffer::layout::{
    Attribute, FEATURE_TAIL_LEN, GeometryClass, INTERACTION_LAYOUT, LINE_LAYOUT, POINT_LAYOUT,
    POLYGON_LAYOUT, VIEWPORT_LAYOUT, VertexLayout,
};
pub use buffer::strategy::{GeometryStrategy, VertexSink};
pub use buffer::{LineStrategy, PointStrategy, PolygonStrategy, ViewportStrategy};
pub use expression::ast::{Expr, MatchCase, MatchLabel, is_expression};
pub use expression::error::ExprCompileError;
pub use expression::evaluator::{CompiledExpression, ExpressionEvaluator};
pub use expression::value::{OutputType, OutputValue};
pub use feature::model::{Feature, FeatureCollection, Geometry, LonLat, Properties, Rings};
pub use foundation::color::Color;
pub use foundation::core::{FeatureId, LogOnce, Point, Rect, Vec2};
pub use foundation::error::{FxError, FxResult};
pub use geometry::projection::{MAX_LATITUDE, project};
pub use geometry::simplify::douglas_peucker;
pub use geometry::triangulate::triangulate;
pub use geometry::{bounds_of, signed_area, vertex_centroid};
pub use layer::config::{LayerConfig, SimplifyConfig};
pub use layer::controller::{BuildSummary, LayerController, LayerState};
pub use layer::host::{BufferHandle, BufferKind, FrameContext, ProgramHandle, RenderHost};
pub use layer::throttle::{RebuildThrottle, ThrottleDecision};
pub use pool::object_pool::{ObjectPool, PoolOpts, PoolStats};
pub use pool::shapes::{FeatureColorRecord, PointRecord, PolygonRecord, SegmentRecord};
pub use pool::{PoolManager, PoolManagerStats};
pub use shader::builtins;
pub use shader::config::{
    ConfigField, ConfigFieldError, ConfigSchema, ConfigValue, FieldKind, ShaderConfig,
};
pub use shader::uniforms::{UniformValue, Uniforms};
pub use shader::{ShaderDefinition, ShaderRegistry, UniformFn};
pub use state::interaction::{
    ClickAction, FeatureInteractionHandler, HoverBehavior, InitialPlayState, InteractionEvent,
    InteractivityConfig,
};
pub use state::manager::{
    FeatureAnimationState, FeatureAnimationStateManager, INTERACTION_STRIDE,
    InteractionBufferData,
};
pub use timing::{TimeOffsetCalculator, TimingConfig};
pub use worker::{RequestId, SimplifyWorker, WorkerRequest, WorkerResponse, handle_request};

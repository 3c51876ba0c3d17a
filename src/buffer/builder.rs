use crate::buffer::fingerprint::{BufferFingerprint, fingerprint_output};
use crate::buffer::layout::{FEATURE_TAIL_LEN, GeometryClass};
use crate::buffer::strategy::{GeometryStrategy, VertexSink};
use crate::expression::evaluator::ExpressionEvaluator;
use crate::feature::model::{Feature, Geometry};
use crate::foundation::color::Color;
use crate::foundation::core::FeatureId;
use crate::foundation::error::FxResult;
use crate::pool::PoolManager;
use crate::state::manager::{FeatureAnimationStateManager, UNTRACKED_VALUES};

/// Evaluator channel for data-driven vertex color.
pub const COLOR_CHANNEL: &str = "color";
/// Evaluator channel for data-driven intensity.
pub const INTENSITY_CHANNEL: &str = "intensity";

/// Style written when a channel is not data-driven.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StyleDefaults {
    pub color: Color,
    pub intensity: f64,
}

impl Default for StyleDefaults {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            intensity: 1.0,
        }
    }
}

/// Everything one rebuild reads. Offsets are indexed by feature position.
#[derive(Clone, Copy)]
pub struct BuildInputs<'a> {
    pub features: &'a [Feature],
    pub id_property: Option<&'a str>,
    pub offsets: &'a [f64],
    pub states: &'a FeatureAnimationStateManager,
    pub evaluator: &'a ExpressionEvaluator,
    pub defaults: StyleDefaults,
    pub zoom: f64,
}

/// Interleaved buffers of one rebuild.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildOutput {
    pub class: GeometryClass,
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
    /// Vertex count per feature position; 0 for skipped features.
    pub vertices_per_feature: Vec<u32>,
    pub feature_ids: Vec<FeatureId>,
    /// Vertices after the last feature that belong to no feature.
    pub unbound_vertices: u32,
}

impl BuildOutput {
    fn empty(class: GeometryClass, features: usize) -> Self {
        Self {
            class,
            vertices: Vec::new(),
            indices: Vec::new(),
            vertices_per_feature: Vec::with_capacity(features),
            feature_ids: Vec::with_capacity(features),
            unbound_vertices: 0,
        }
    }

    pub fn stride(&self) -> usize {
        self.class.layout().stride
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / self.stride()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn skipped_features(&self) -> usize {
        self.vertices_per_feature.iter().filter(|&&n| n == 0).count()
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn fingerprint(&self) -> BufferFingerprint {
        fingerprint_output(self)
    }
}

/// Runs the shared projection → derivation → tessellation → packing pipeline for one
/// geometry class.
pub struct GeometryBufferBuilder<S: GeometryStrategy> {
    strategy: S,
    scratch: Vec<S::Shape>,
}

impl<S: GeometryStrategy> GeometryBufferBuilder<S> {
    pub fn new(strategy: S) -> Self {
        Self {
            strategy,
            scratch: Vec::new(),
        }
    }

    pub fn class(&self) -> GeometryClass {
        self.strategy.class()
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Regenerate both buffers from scratch.
    ///
    /// Malformed features contribute zero vertices. Only pool exhaustion aborts the build; every
    /// record acquired so far is returned to its pool first.
    #[tracing::instrument(skip_all, fields(class = %self.strategy.class(), features = inputs.features.len()))]
    pub fn build(
        &mut self,
        inputs: &BuildInputs<'_>,
        pools: &mut PoolManager,
    ) -> FxResult<BuildOutput> {
        let mut out = BuildOutput::empty(self.strategy.class(), inputs.features.len());

        for (index, feature) in inputs.features.iter().enumerate() {
            out.feature_ids
                .push(feature.resolve_id(index, inputs.id_property));
            let before = out.vertex_count();
            if let Some(geometry) = &feature.geometry {
                let res = self.emit_feature(index, feature, geometry, inputs, pools, &mut out);
                self.strategy.release(&mut self.scratch, pools);
                res?;
            }
            out.vertices_per_feature
                .push((out.vertex_count() - before) as u32);
        }

        let before = out.vertex_count();
        let res = self.emit_unbound(inputs, pools, &mut out);
        self.strategy.release(&mut self.scratch, pools);
        res?;
        out.unbound_vertices = (out.vertex_count() - before) as u32;

        tracing::debug!(
            vertices = out.vertex_count(),
            indices = out.index_count(),
            skipped = out.skipped_features(),
            "buffers rebuilt"
        );
        Ok(out)
    }

    fn emit_feature(
        &mut self,
        index: usize,
        feature: &Feature,
        geometry: &Geometry,
        inputs: &BuildInputs<'_>,
        pools: &mut PoolManager,
        out: &mut BuildOutput,
    ) -> FxResult<()> {
        self.strategy.project(geometry, pools, &mut self.scratch)?;
        if self.scratch.is_empty() {
            tracing::trace!(index, kind = geometry.class_name(), "feature produced no shapes");
            return Ok(());
        }
        self.strategy.derive(&mut self.scratch);

        let tail = feature_tail(index, feature, inputs, pools)?;
        let stride = out.stride();
        let mut sink = VertexSink::new(&mut out.vertices, &mut out.indices, stride, tail);
        for shape in &self.scratch {
            self.strategy.tessellate(shape, &mut sink);
        }
        Ok(())
    }

    fn emit_unbound(
        &mut self,
        inputs: &BuildInputs<'_>,
        pools: &mut PoolManager,
        out: &mut BuildOutput,
    ) -> FxResult<()> {
        self.strategy.project_unbound(pools, &mut self.scratch)?;
        if self.scratch.is_empty() {
            return Ok(());
        }
        let tail = pack_tail(
            0.0,
            0.0,
            inputs.defaults.color.to_f32_array(),
            inputs.defaults.intensity as f32,
            true,
            0.0,
        );
        let stride = out.stride();
        let mut sink = VertexSink::new(&mut out.vertices, &mut out.indices, stride, tail);
        for shape in &self.scratch {
            self.strategy.tessellate(shape, &mut sink);
        }
        Ok(())
    }
}

impl<S: GeometryStrategy + std::fmt::Debug> std::fmt::Debug for GeometryBufferBuilder<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeometryBufferBuilder")
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

/// Resolve the per-feature attributes shared by every vertex of the feature.
fn feature_tail(
    index: usize,
    feature: &Feature,
    inputs: &BuildInputs<'_>,
    pools: &mut PoolManager,
) -> FxResult<[f32; FEATURE_TAIL_LEN]> {
    let mut style = pools.colors.acquire()?;
    style.color = inputs
        .evaluator
        .evaluate_color(COLOR_CHANNEL, feature, inputs.zoom)
        .unwrap_or(inputs.defaults.color)
        .to_f32_array();
    style.intensity = inputs
        .evaluator
        .evaluate_number(INTENSITY_CHANNEL, feature, inputs.zoom)
        .filter(|v| v.is_finite())
        .unwrap_or(inputs.defaults.intensity) as f32;

    let offset = inputs.offsets.get(index).copied().unwrap_or(0.0);
    let (playing, local_time, _) = inputs
        .states
        .feature_values(index)
        .unwrap_or(UNTRACKED_VALUES);
    let tail = pack_tail(
        index as f32,
        offset as f32,
        style.color,
        style.intensity,
        playing,
        local_time as f32,
    );
    pools.colors.release(style);
    Ok(tail)
}

fn pack_tail(
    feature_index: f32,
    time_offset: f32,
    color: [f32; 4],
    intensity: f32,
    playing: bool,
    local_time: f32,
) -> [f32; FEATURE_TAIL_LEN] {
    [
        feature_index,
        time_offset,
        color[0],
        color[1],
        color[2],
        color[3],
        intensity,
        f32::from(u8::from(playing)),
        local_time,
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/buffer/builder.rs"]
mod tests;

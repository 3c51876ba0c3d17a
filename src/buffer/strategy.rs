use crate::buffer::layout::{FEATURE_TAIL_LEN, GeometryClass};
use crate::feature::model::Geometry;
use crate::foundation::error::FxResult;
use crate::pool::PoolManager;

/// Per-class steps of the buffer pipeline.
///
/// The builder drives `project` → `derive` → `tessellate` for every feature and hands every
/// shape back through `release` before the build returns, on success and on error alike.
pub trait GeometryStrategy {
    /// Pooled record for one drawable piece of a feature.
    type Shape;

    fn class(&self) -> GeometryClass;

    /// Project a feature's geometry into shapes appended to `out`. Geometry this strategy
    /// cannot draw, or that is malformed, appends nothing.
    fn project(
        &mut self,
        geometry: &Geometry,
        pools: &mut PoolManager,
        out: &mut Vec<Self::Shape>,
    ) -> FxResult<()>;

    /// Shapes that belong to no feature. Emitted once after all features.
    fn project_unbound(
        &mut self,
        _pools: &mut PoolManager,
        _out: &mut Vec<Self::Shape>,
    ) -> FxResult<()> {
        Ok(())
    }

    /// Fill derived quantities for one feature's shapes.
    fn derive(&mut self, _shapes: &mut [Self::Shape]) {}

    fn tessellate(&self, shape: &Self::Shape, sink: &mut VertexSink<'_>);

    fn release(&mut self, shapes: &mut Vec<Self::Shape>, pools: &mut PoolManager);
}

/// Append-only writer over the interleaved vertex and index buffers.
///
/// Strategies write only their shape fields; the feature tail is appended here.
pub struct VertexSink<'a> {
    vertices: &'a mut Vec<f32>,
    indices: &'a mut Vec<u32>,
    stride: usize,
    tail: [f32; FEATURE_TAIL_LEN],
}

impl<'a> VertexSink<'a> {
    pub(crate) fn new(
        vertices: &'a mut Vec<f32>,
        indices: &'a mut Vec<u32>,
        stride: usize,
        tail: [f32; FEATURE_TAIL_LEN],
    ) -> Self {
        Self {
            vertices,
            indices,
            stride,
            tail,
        }
    }

    /// Index the next pushed vertex will get.
    pub fn next_vertex(&self) -> u32 {
        (self.vertices.len() / self.stride) as u32
    }

    pub fn push_vertex(&mut self, shape: &[f32]) {
        debug_assert_eq!(shape.len() + FEATURE_TAIL_LEN, self.stride);
        self.vertices.extend_from_slice(shape);
        self.vertices.extend_from_slice(&self.tail);
    }

    /// Push indices relative to `base`.
    pub fn push_indices(&mut self, base: u32, rel: &[u32]) {
        self.indices.extend(rel.iter().map(|&i| base + i));
    }
}

/// Corner order shared by point and viewport quads.
pub(crate) const QUAD_CORNERS: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];
pub(crate) const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

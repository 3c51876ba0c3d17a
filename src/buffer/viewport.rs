use crate::buffer::layout::GeometryClass;
use crate::buffer::strategy::{GeometryStrategy, QUAD_CORNERS, QUAD_INDICES, VertexSink};
use crate::feature::model::Geometry;
use crate::foundation::error::FxResult;
use crate::pool::PoolManager;

/// A single clip-space quad covering the viewport. Features are ignored.
#[derive(Debug, Default)]
pub struct ViewportStrategy;

impl GeometryStrategy for ViewportStrategy {
    type Shape = ();

    fn class(&self) -> GeometryClass {
        GeometryClass::Viewport
    }

    fn project(
        &mut self,
        _geometry: &Geometry,
        _pools: &mut PoolManager,
        _out: &mut Vec<()>,
    ) -> FxResult<()> {
        Ok(())
    }

    fn project_unbound(&mut self, _pools: &mut PoolManager, out: &mut Vec<()>) -> FxResult<()> {
        out.push(());
        Ok(())
    }

    fn tessellate(&self, _shape: &(), sink: &mut VertexSink<'_>) {
        let base = sink.next_vertex();
        for [x, y] in QUAD_CORNERS {
            sink.push_vertex(&[x, y, (x + 1.0) * 0.5, (y + 1.0) * 0.5]);
        }
        sink.push_indices(base, &QUAD_INDICES);
    }

    fn release(&mut self, shapes: &mut Vec<()>, _pools: &mut PoolManager) {
        shapes.clear();
    }
}

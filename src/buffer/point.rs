use crate::buffer::layout::GeometryClass;
use crate::buffer::strategy::{GeometryStrategy, QUAD_CORNERS, QUAD_INDICES, VertexSink};
use crate::feature::model::{Geometry, LonLat};
use crate::foundation::core::Point;
use crate::foundation::error::FxResult;
use crate::geometry::projection::project_all;
use crate::pool::PoolManager;
use crate::pool::shapes::PointRecord;

/// One camera-facing quad per point; the corner lets the program compute a radial distance.
#[derive(Debug, Default)]
pub struct PointStrategy {
    projected: Vec<Point>,
}

impl PointStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GeometryStrategy for PointStrategy {
    type Shape = PointRecord;

    fn class(&self) -> GeometryClass {
        GeometryClass::Point
    }

    fn project(
        &mut self,
        geometry: &Geometry,
        pools: &mut PoolManager,
        out: &mut Vec<PointRecord>,
    ) -> FxResult<()> {
        let coords: &[LonLat] = match geometry {
            Geometry::Point(p) => std::slice::from_ref(p),
            Geometry::MultiPoint(ps) => ps,
            _ => return Ok(()),
        };
        if project_all(coords, &mut self.projected).is_none() {
            return Ok(());
        }
        for &center in &self.projected {
            let mut rec = pools.points.acquire()?;
            rec.center = center;
            out.push(rec);
        }
        Ok(())
    }

    fn tessellate(&self, shape: &PointRecord, sink: &mut VertexSink<'_>) {
        let base = sink.next_vertex();
        let (x, y) = (shape.center.x as f32, shape.center.y as f32);
        for [cx, cy] in QUAD_CORNERS {
            sink.push_vertex(&[x, y, cx, cy]);
        }
        sink.push_indices(base, &QUAD_INDICES);
    }

    fn release(&mut self, shapes: &mut Vec<PointRecord>, pools: &mut PoolManager) {
        pools.points.release_all(shapes.drain(..));
    }
}

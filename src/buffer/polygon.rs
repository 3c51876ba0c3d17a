use crate::buffer::layout::GeometryClass;
use crate::buffer::strategy::{GeometryStrategy, VertexSink};
use crate::feature::model::{Geometry, Rings};
use crate::foundation::core::{Point, Rect};
use crate::foundation::error::FxResult;
use crate::geometry::projection::{open_ring, project_all};
use crate::geometry::triangulate::triangulate;
use crate::geometry::{bounds_of, vertex_centroid};
use crate::pool::PoolManager;
use crate::pool::shapes::PolygonRecord;

/// Ear-clipped outer rings with bbox UVs and the vertex centroid. Inner rings are counted
/// but not cut out.
#[derive(Debug, Default)]
pub struct PolygonStrategy {
    projected: Vec<Point>,
}

impl PolygonStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_polygon(
        &mut self,
        rings: &Rings,
        pools: &mut PoolManager,
        out: &mut Vec<PolygonRecord>,
    ) -> FxResult<()> {
        let Some(outer) = rings.first() else {
            return Ok(());
        };
        if project_all(outer, &mut self.projected).is_none() {
            return Ok(());
        }
        self.projected.dedup();
        open_ring(&mut self.projected);
        if self.projected.len() < 3 {
            return Ok(());
        }
        let mut rec = pools.polygons.acquire()?;
        rec.ring.extend_from_slice(&self.projected);
        rec.hole_count = rings.len() - 1;
        out.push(rec);
        Ok(())
    }
}

impl GeometryStrategy for PolygonStrategy {
    type Shape = PolygonRecord;

    fn class(&self) -> GeometryClass {
        GeometryClass::Polygon
    }

    fn project(
        &mut self,
        geometry: &Geometry,
        pools: &mut PoolManager,
        out: &mut Vec<PolygonRecord>,
    ) -> FxResult<()> {
        match geometry {
            Geometry::Polygon(rings) => self.push_polygon(rings, pools, out),
            Geometry::MultiPolygon(polys) => {
                for rings in polys {
                    self.push_polygon(rings, pools, out)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn derive(&mut self, shapes: &mut [PolygonRecord]) {
        for poly in shapes {
            poly.bounds = bounds_of(&poly.ring).unwrap_or(Rect::ZERO);
            poly.centroid = vertex_centroid(&poly.ring).unwrap_or(Point::ZERO);
            triangulate(&poly.ring, &mut poly.triangles);
        }
    }

    fn tessellate(&self, shape: &PolygonRecord, sink: &mut VertexSink<'_>) {
        let base = sink.next_vertex();
        let b = shape.bounds;
        let (w, h) = (b.width(), b.height());
        let (cx, cy) = (shape.centroid.x as f32, shape.centroid.y as f32);
        for p in &shape.ring {
            let u = if w > 0.0 { (p.x - b.x0) / w } else { 0.0 };
            let v = if h > 0.0 { (p.y - b.y0) / h } else { 0.0 };
            sink.push_vertex(&[p.x as f32, p.y as f32, u as f32, v as f32, cx, cy]);
        }
        sink.push_indices(base, &shape.triangles);
    }

    fn release(&mut self, shapes: &mut Vec<PolygonRecord>, pools: &mut PoolManager) {
        pools.polygons.release_all(shapes.drain(..));
    }
}

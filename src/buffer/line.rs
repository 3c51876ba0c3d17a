use crate::buffer::layout::GeometryClass;
use crate::buffer::strategy::{GeometryStrategy, VertexSink};
use crate::feature::model::{Geometry, LonLat};
use crate::foundation::core::Point;
use crate::foundation::error::FxResult;
use crate::geometry::projection::project_all;
use crate::pool::PoolManager;
use crate::pool::shapes::SegmentRecord;

/// `(along, side)` per quad corner: along 0 at the segment start, side ±1 across it.
const SEGMENT_CORNERS: [[f32; 2]; 4] = [[0.0, -1.0], [0.0, 1.0], [1.0, -1.0], [1.0, 1.0]];
const SEGMENT_INDICES: [u32; 6] = [0, 1, 2, 1, 3, 2];

/// One quad per segment, carrying arc-length progress so the program can animate along the
/// line.
#[derive(Debug, Default)]
pub struct LineStrategy {
    projected: Vec<Point>,
}

impl LineStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_line(
        &mut self,
        coords: &[LonLat],
        part: u32,
        pools: &mut PoolManager,
        out: &mut Vec<SegmentRecord>,
    ) -> FxResult<()> {
        if coords.len() < 2 || project_all(coords, &mut self.projected).is_none() {
            return Ok(());
        }
        let mut travelled = 0.0;
        for pair in self.projected.windows(2) {
            let mut rec = pools.segments.acquire()?;
            rec.start = pair[0];
            rec.end = pair[1];
            rec.part = part;
            rec.progress_start = travelled;
            travelled += pair[0].distance(pair[1]);
            rec.progress_end = travelled;
            out.push(rec);
        }
        Ok(())
    }
}

impl GeometryStrategy for LineStrategy {
    type Shape = SegmentRecord;

    fn class(&self) -> GeometryClass {
        GeometryClass::Line
    }

    fn project(
        &mut self,
        geometry: &Geometry,
        pools: &mut PoolManager,
        out: &mut Vec<SegmentRecord>,
    ) -> FxResult<()> {
        match geometry {
            Geometry::LineString(coords) => self.push_line(coords, 0, pools, out),
            Geometry::MultiLineString(lines) => {
                for (part, coords) in lines.iter().enumerate() {
                    self.push_line(coords, part as u32, pools, out)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Normalize absolute distances to 0..1 progress per source line.
    fn derive(&mut self, shapes: &mut [SegmentRecord]) {
        for run in shapes.chunk_by_mut(|a, b| a.part == b.part) {
            let total = run.last().map_or(0.0, |s| s.progress_end);
            for seg in run.iter_mut() {
                seg.line_length = total;
                if total > 0.0 {
                    seg.progress_start /= total;
                    seg.progress_end /= total;
                } else {
                    seg.progress_start = 0.0;
                    seg.progress_end = 0.0;
                }
            }
        }
    }

    fn tessellate(&self, shape: &SegmentRecord, sink: &mut VertexSink<'_>) {
        let base = sink.next_vertex();
        let (sx, sy) = (shape.start.x as f32, shape.start.y as f32);
        let (ex, ey) = (shape.end.x as f32, shape.end.y as f32);
        let (p0, p1) = (shape.progress_start as f32, shape.progress_end as f32);
        let length = shape.line_length as f32;
        for [along, side] in SEGMENT_CORNERS {
            let progress = if along == 0.0 { p0 } else { p1 };
            sink.push_vertex(&[sx, sy, ex, ey, along, side, progress, length]);
        }
        sink.push_indices(base, &SEGMENT_INDICES);
    }

    fn release(&mut self, shapes: &mut Vec<SegmentRecord>, pools: &mut PoolManager) {
        pools.segments.release_all(shapes.drain(..));
    }
}

//! Record types recycled across rebuilds, plus their pool factories.

use crate::foundation::core::{Point, Rect};
use crate::pool::object_pool::{ObjectPool, PoolOpts};

/// A projected point-feature center.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointRecord {
    pub center: Point,
}

/// One projected line segment with its arc-length progress at both ends.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SegmentRecord {
    pub start: Point,
    pub end: Point,
    /// Index of the source line within a multi-line feature.
    pub part: u32,
    pub progress_start: f64,
    pub progress_end: f64,
    /// Projected length of the whole source line.
    pub line_length: f64,
}

/// A projected polygon outer ring and the quantities derived from it.
///
/// The ring and triangle vectors keep their capacity across generations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonRecord {
    pub ring: Vec<Point>,
    pub bounds: Rect,
    pub centroid: Point,
    /// Inner rings seen in the source; never triangulated.
    pub hole_count: usize,
    pub triangles: Vec<u32>,
}

/// Per-feature resolved style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureColorRecord {
    pub color: [f32; 4],
    pub intensity: f32,
}

impl Default for FeatureColorRecord {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0, 1.0],
            intensity: 1.0,
        }
    }
}

pub fn point_pool(opts: PoolOpts) -> ObjectPool<PointRecord> {
    ObjectPool::new("point", opts, PointRecord::default, |r| {
        *r = PointRecord::default();
    })
}

pub fn segment_pool(opts: PoolOpts) -> ObjectPool<SegmentRecord> {
    ObjectPool::new("segment", opts, SegmentRecord::default, |r| {
        *r = SegmentRecord::default();
    })
}

pub fn polygon_pool(opts: PoolOpts) -> ObjectPool<PolygonRecord> {
    ObjectPool::new("polygon", opts, PolygonRecord::default, |r| {
        r.ring.clear();
        r.triangles.clear();
        r.bounds = Rect::ZERO;
        r.centroid = Point::ZERO;
        r.hole_count = 0;
    })
}

pub fn color_pool(opts: PoolOpts) -> ObjectPool<FeatureColorRecord> {
    ObjectPool::new("feature-color", opts, FeatureColorRecord::default, |r| {
        *r = FeatureColorRecord::default();
    })
}

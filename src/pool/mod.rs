pub mod object_pool;
pub mod shapes;

use crate::pool::object_pool::{ObjectPool, PoolOpts, PoolStats};
use crate::pool::shapes::{
    FeatureColorRecord, PointRecord, PolygonRecord, SegmentRecord, color_pool, point_pool,
    polygon_pool, segment_pool,
};

/// Owns the shape-specific pools one layer draws from during rebuilds.
///
/// Pools are confined to the thread that owns the manager.
#[derive(Debug)]
pub struct PoolManager {
    pub points: ObjectPool<PointRecord>,
    pub segments: ObjectPool<SegmentRecord>,
    pub polygons: ObjectPool<PolygonRecord>,
    pub colors: ObjectPool<FeatureColorRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolManagerStats {
    pub points: PoolStats,
    pub segments: PoolStats,
    pub polygons: PoolStats,
    pub colors: PoolStats,
}

impl PoolManagerStats {
    pub fn in_use(&self) -> usize {
        self.points.in_use + self.segments.in_use + self.polygons.in_use + self.colors.in_use
    }

    pub fn total_created(&self) -> u64 {
        self.points.total_created
            + self.segments.total_created
            + self.polygons.total_created
            + self.colors.total_created
    }
}

impl PoolManager {
    pub fn new(opts: PoolOpts) -> Self {
        Self {
            points: point_pool(opts),
            segments: segment_pool(opts),
            polygons: polygon_pool(opts),
            colors: color_pool(opts),
        }
    }

    pub fn stats(&self) -> PoolManagerStats {
        PoolManagerStats {
            points: self.points.stats(),
            segments: self.segments.stats(),
            polygons: self.polygons.stats(),
            colors: self.colors.stats(),
        }
    }

    pub fn shrink_all(&mut self, n: usize) {
        self.points.shrink(n);
        self.segments.shrink(n);
        self.polygons.shrink(n);
        self.colors.shrink(n);
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.segments.clear();
        self.polygons.clear();
        self.colors.clear();
    }
}

impl Default for PoolManager {
    fn default() -> Self {
        Self::new(PoolOpts::default())
    }
}

use std::fmt;

use crate::foundation::error::{FxError, FxResult};

/// Growth and bound policy for an [`ObjectPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PoolOpts {
    /// Objects created per growth step.
    pub batch_size: usize,
    /// Upper bound on live objects (handed out + retained).
    pub max_size: usize,
}

impl Default for PoolOpts {
    fn default() -> Self {
        Self {
            batch_size: 64,
            max_size: 1 << 20,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PoolStats {
    pub total_created: u64,
    pub growth_count: u64,
    pub peak_usage: usize,
    pub in_use: usize,
    pub available: usize,
}

/// Bounded free-list allocator for ephemeral rebuild records.
///
/// `acquire` moves an object out and `release` moves it back after running the reset
/// function, so a released object cannot be touched again by the caller.
pub struct ObjectPool<T> {
    name: &'static str,
    opts: PoolOpts,
    stats: PoolStats,
    free: Vec<T>,
    factory: Box<dyn Fn() -> T>,
    reset: Box<dyn Fn(&mut T)>,
}

impl<T> ObjectPool<T> {
    pub fn new(
        name: &'static str,
        opts: PoolOpts,
        factory: impl Fn() -> T + 'static,
        reset: impl Fn(&mut T) + 'static,
    ) -> Self {
        Self {
            name,
            opts,
            stats: PoolStats::default(),
            free: Vec::new(),
            factory: Box::new(factory),
            reset: Box::new(reset),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn acquire(&mut self) -> FxResult<T> {
        if self.free.is_empty() {
            self.grow()?;
        }
        let obj = self
            .free
            .pop()
            .ok_or_else(|| FxError::allocation(format!("pool '{}' is empty", self.name)))?;
        self.stats.in_use += 1;
        self.stats.peak_usage = self.stats.peak_usage.max(self.stats.in_use);
        Ok(obj)
    }

    fn grow(&mut self) -> FxResult<()> {
        let live = self.stats.in_use + self.free.len();
        let room = self.opts.max_size.saturating_sub(live);
        if room == 0 {
            return Err(FxError::allocation(format!(
                "pool '{}' exhausted at {} live objects",
                self.name, self.opts.max_size
            )));
        }
        let batch = self.opts.batch_size.max(1).min(room);
        self.free.reserve(batch);
        for _ in 0..batch {
            self.free.push((self.factory)());
        }
        self.stats.total_created = self.stats.total_created.saturating_add(batch as u64);
        self.stats.growth_count = self.stats.growth_count.saturating_add(1);
        tracing::trace!(pool = self.name, batch, live = live + batch, "pool grew");
        Ok(())
    }

    pub fn release(&mut self, mut obj: T) {
        (self.reset)(&mut obj);
        self.stats.in_use = self.stats.in_use.saturating_sub(1);
        if self.stats.in_use + self.free.len() >= self.opts.max_size {
            return;
        }
        self.free.push(obj);
    }

    pub fn release_all(&mut self, objs: impl IntoIterator<Item = T>) {
        for obj in objs {
            self.release(obj);
        }
    }

    /// Drop up to `n` retained objects. Returns how many were dropped.
    pub fn shrink(&mut self, n: usize) -> usize {
        let keep = self.free.len().saturating_sub(n);
        let dropped = self.free.len() - keep;
        self.free.truncate(keep);
        dropped
    }

    /// Drop every retained object. Objects currently handed out are unaffected.
    pub fn clear(&mut self) {
        self.free.clear();
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            available: self.free.len(),
            ..self.stats.clone()
        }
    }
}

impl<T> fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("name", &self.name)
            .field("opts", &self.opts)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pool/object_pool.rs"]
mod tests;

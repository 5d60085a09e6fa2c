use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;

use crate::layout::{ComparisonLayout, ComparisonLayoutResult};
use crate::models::Viewport;

/// Maximum number of cached layouts to keep in memory.
const MAX_CACHE_ENTRIES: usize = 16;

/// Key for the layout cache: tile count plus exact viewport size.
///
/// Sizes are keyed by their bit patterns, so only an identical viewport hits.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
struct CacheKey {
    count: usize,
    width_bits: u64,
    height_bits: u64,
}

impl CacheKey {
    fn new(count: usize, viewport: Viewport) -> Self {
        Self {
            count,
            width_bits: viewport.width.to_bits(),
            height_bits: viewport.height.to_bits(),
        }
    }
}

/// LRU cache of solved comparison layouts.
///
/// Resizing back and forth between a handful of window sizes and paging
/// through a session re-solve the same inputs repeatedly; this keeps the
/// most recent results around.
pub struct LayoutCache {
    cache: Mutex<LruCache<CacheKey, ComparisonLayoutResult>>,
}

impl LayoutCache {
    /// Creates a new empty layout cache.
    pub fn new() -> Self {
        Self::with_capacity(MAX_CACHE_ENTRIES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns a cached result, marking it most recently used.
    pub fn get(&self, count: usize, viewport: Viewport) -> Option<ComparisonLayoutResult> {
        self.cache.lock().get(&CacheKey::new(count, viewport)).cloned()
    }

    pub fn set(&self, count: usize, viewport: Viewport, result: ComparisonLayoutResult) {
        self.cache.lock().put(CacheKey::new(count, viewport), result);
    }

    /// Clears the entire cache.
    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    /// Returns the number of cached layouts.
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Combines the layout solver with a result cache.
pub struct CachedLayoutSolver {
    layout: ComparisonLayout,
    cache: LayoutCache,
}

impl CachedLayoutSolver {
    pub fn new(layout: ComparisonLayout) -> Self {
        Self {
            layout,
            cache: LayoutCache::new(),
        }
    }

    pub fn layout(&self) -> &ComparisonLayout {
        &self.layout
    }

    /// Replaces the solver settings and drops every cached result.
    pub fn set_layout(&mut self, layout: ComparisonLayout) {
        if self.layout != layout {
            self.layout = layout;
            self.cache.clear();
        }
    }

    /// Computes the layout, using a cached result if available.
    pub fn compute(&self, count: usize, viewport: Viewport) -> ComparisonLayoutResult {
        if let Some(result) = self.cache.get(count, viewport) {
            trace!(count, ?viewport, "Layout cache hit");
            return result;
        }

        let result = self.layout.compute(count, viewport);
        self.cache.set(count, viewport, result.clone());
        result
    }

    /// Invalidates the cache, forcing recomputation on next call.
    pub fn invalidate(&self) {
        self.cache.clear();
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

impl Default for CachedLayoutSolver {
    fn default() -> Self {
        Self::new(ComparisonLayout::default())
    }
}

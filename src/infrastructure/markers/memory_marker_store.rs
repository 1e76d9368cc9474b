//! In-memory LRU load markers.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;

use crate::domain::errors::MarkerError;
use crate::domain::ports::LoadMarkerPort;

/// Default maximum number of remembered URLs.
pub const DEFAULT_MARKER_CAPACITY: usize = 1024;

/// Bounded marker store for ephemeral hosts. The least recently looked-up
/// URL is forgotten first.
pub struct MemoryMarkerStore {
    markers: Mutex<LruCache<String, ()>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryMarkerStore {
    /// Creates a store holding at most `capacity` URLs.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            markers: Mutex::new(LruCache::new(cap)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns lookup statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> MarkerStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        MarkerStats {
            hits,
            misses,
            hit_rate,
            size: self.markers.lock().len(),
        }
    }
}

impl Default for MemoryMarkerStore {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER_CAPACITY)
    }
}

/// Lookup statistics of a [`MemoryMarkerStore`].
#[derive(Debug, Clone)]
pub struct MarkerStats {
    /// Lookups that found a marker.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Hit rate as a percentage.
    pub hit_rate: f64,
    /// Number of remembered URLs.
    pub size: usize,
}

impl std::fmt::Display for MarkerStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Markers: {} urls, {:.1}% hit rate ({} hits, {} misses)",
            self.size, self.hit_rate, self.hits, self.misses
        )
    }
}

#[async_trait]
impl LoadMarkerPort for MemoryMarkerStore {
    async fn contains(&self, url: &str) -> Result<bool, MarkerError> {
        let hit = self.markers.lock().get(url).is_some();
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        trace!(url = %url, hit = hit, "Memory marker lookup");
        Ok(hit)
    }

    async fn mark(&self, url: &str) -> Result<(), MarkerError> {
        self.markers.lock().put(url.to_string(), ());
        Ok(())
    }
}

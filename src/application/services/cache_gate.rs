//! "Loaded before" gate in front of the marker store.

use std::sync::Arc;

use tracing::{trace, warn};

use crate::domain::ports::LoadMarkerPort;

/// Binary previously-loaded marker keyed by URL.
///
/// Store failures never surface: a failed lookup is a miss and a failed
/// write is logged.
#[derive(Clone)]
pub struct CacheGate {
    store: Arc<dyn LoadMarkerPort>,
}

impl std::fmt::Debug for CacheGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheGate").finish_non_exhaustive()
    }
}

impl CacheGate {
    /// Creates a gate over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn LoadMarkerPort>) -> Self {
        Self { store }
    }

    /// Returns whether `url` loaded successfully before.
    pub async fn get(&self, url: &str) -> bool {
        match self.store.contains(url).await {
            Ok(hit) => {
                trace!(url = %url, hit = hit, "Load marker lookup");
                hit
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Load marker lookup failed, treating as miss");
                false
            }
        }
    }

    /// Remembers that `url` loaded successfully.
    pub async fn set(&self, url: &str) {
        if let Err(e) = self.store.mark(url).await {
            warn!(url = %url, error = %e, "Failed to store load marker");
        }
    }
}

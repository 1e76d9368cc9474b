//! Port definition for the "loaded before" marker store.

use async_trait::async_trait;

use crate::domain::errors::MarkerError;

/// Port for remembering which URLs loaded successfully.
/// Keys are URLs; presence is the only information stored.
#[async_trait]
pub trait LoadMarkerPort: Send + Sync {
    /// Returns whether `url` was marked as loaded.
    async fn contains(&self, url: &str) -> Result<bool, MarkerError>;

    /// Marks `url` as loaded. Marking twice is a no-op.
    async fn mark(&self, url: &str) -> Result<(), MarkerError>;
}

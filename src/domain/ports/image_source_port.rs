//! Port definition for fetching image bytes.

use async_trait::async_trait;

use crate::domain::entities::{CrossOrigin, FetchedImage};
use crate::domain::errors::LoadError;

/// Port for a single native image fetch.
/// Implementations must be thread-safe.
#[async_trait]
pub trait ImageSourcePort: Send + Sync {
    /// Fetches the bytes behind `url` with the given cross-origin mode.
    async fn fetch(
        &self,
        url: &str,
        cross_origin: Option<CrossOrigin>,
    ) -> Result<FetchedImage, LoadError>;
}

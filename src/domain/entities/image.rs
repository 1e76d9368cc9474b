//! Domain types for image loading.

use std::sync::Arc;

use bytes::Bytes;

use crate::domain::errors::LoadError;

/// Unique identifier for a remembered image.
/// Generated from a hash of the URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageId(pub String);

impl ImageId {
    /// Creates a new `ImageId` from any string-like input.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates an `ImageId` from a URL by hashing it.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let result = hasher.finalize();
        Self(hex::encode(&result[..16]))
    }

    /// Returns the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ImageId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Status of an image in the loading pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageStatus {
    /// Nothing has been decided yet.
    #[default]
    NotStarted,
    /// Waiting for the target to become visible.
    Deferred,
    /// A fetch sequence is in flight (including retries).
    Loading,
    /// The target image is loaded and displayed.
    Ready,
    /// Loading failed after exhausting the retry budget.
    Failed(String),
}

impl ImageStatus {
    /// Returns true if the image is ready for rendering.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns true if the image is currently being loaded.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Returns true if loading failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Returns true once a load sequence has reached a terminal outcome.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed(_))
    }
}

/// Raw bytes returned by an image source for a single attempt.
#[derive(Debug, Clone)]
pub struct FetchedImage {
    /// Body bytes.
    pub bytes: Bytes,
    /// Content type reported by the source, if any.
    pub content_type: Option<String>,
}

impl FetchedImage {
    /// Creates a fetched payload.
    #[must_use]
    pub fn new(bytes: impl Into<Bytes>, content_type: Option<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type,
        }
    }
}

/// Terminal success event of a load sequence.
#[derive(Clone)]
pub struct LoadedImage {
    /// URL that was loaded.
    pub url: String,
    /// Number of attempts made, including the successful one.
    pub attempts: u32,
    /// Raw bytes of the image.
    pub bytes: Bytes,
    /// Content type reported by the source.
    pub content_type: Option<String>,
    /// Decoded image, present when the decode step was requested.
    pub image: Option<Arc<image::DynamicImage>>,
}

impl LoadedImage {
    /// Returns the decoded dimensions, if decoded.
    #[must_use]
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.image.as_ref().map(|img| (img.width(), img.height()))
    }
}

impl std::fmt::Debug for LoadedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedImage")
            .field("url", &self.url)
            .field("attempts", &self.attempts)
            .field("size", &self.bytes.len())
            .field("content_type", &self.content_type)
            .field("dimensions", &self.dimensions())
            .finish()
    }
}

/// Terminal failure event of a load sequence.
#[derive(Debug, Clone)]
pub struct FailedLoad {
    /// URL that failed.
    pub url: String,
    /// Number of attempts made before giving up.
    pub attempts: u32,
    /// Error of the last attempt.
    pub error: LoadError,
}

//! Disk-backed load markers that persist across sessions.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace, warn};

use crate::domain::entities::ImageId;
use crate::domain::errors::MarkerError;
use crate::domain::ports::LoadMarkerPort;

const MARKER_EXTENSION: &str = "mark";

/// One empty-ish file per loaded URL, named after the URL hash.
///
/// The file body holds the URL for inspection; only presence matters.
pub struct DiskMarkerStore {
    marker_dir: PathBuf,
    marker_count: AtomicUsize,
}

impl std::fmt::Debug for DiskMarkerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskMarkerStore")
            .field("marker_dir", &self.marker_dir)
            .field("marker_count", &self.marker_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl DiskMarkerStore {
    /// Opens a store in `marker_dir`, creating it if needed.
    ///
    /// # Errors
    /// Returns error if the directory cannot be created or read.
    pub async fn new(marker_dir: PathBuf) -> Result<Self, MarkerError> {
        fs::create_dir_all(&marker_dir)
            .await
            .map_err(|e| MarkerError::NotAvailable(format!("Failed to create marker dir: {e}")))?;

        let mut entries = fs::read_dir(&marker_dir)
            .await
            .map_err(|e| MarkerError::NotAvailable(format!("Failed to read marker dir: {e}")))?;

        let mut count = 0usize;
        while let Ok(Some(entry)) = entries.next_entry().await {
            if entry
                .path()
                .extension()
                .is_some_and(|ext| ext == MARKER_EXTENSION)
            {
                count += 1;
            }
        }

        debug!(path = %marker_dir.display(), count = count, "Opened load marker store");
        Ok(Self {
            marker_dir,
            marker_count: AtomicUsize::new(count),
        })
    }

    fn marker_path(&self, url: &str) -> PathBuf {
        let id = ImageId::from_url(url);
        self.marker_dir
            .join(format!("{}.{MARKER_EXTENSION}", id.as_str()))
    }

    /// Forgets `url`.
    pub async fn evict(&self, url: &str) {
        let path = self.marker_path(url);
        match fs::remove_file(&path).await {
            Ok(()) => {
                let _ = self
                    .marker_count
                    .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                        Some(n.saturating_sub(1))
                    });
                debug!(url = %url, "Evicted load marker");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(url = %url, error = %e, "Failed to evict load marker"),
        }
    }

    /// Removes every marker.
    ///
    /// # Errors
    /// Returns error if the marker directory cannot be read.
    pub async fn clear(&self) -> Result<(), MarkerError> {
        let mut entries = fs::read_dir(&self.marker_dir)
            .await
            .map_err(|e| MarkerError::ReadFailed(format!("Failed to read marker dir: {e}")))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| MarkerError::ReadFailed(format!("Failed to read entry: {e}")))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == MARKER_EXTENSION)
                && fs::remove_file(&path).await.is_err()
            {
                warn!(path = %path.display(), "Failed to remove marker file");
            }
        }
        self.marker_count.store(0, Ordering::Relaxed);
        debug!("Cleared load markers");
        Ok(())
    }

    /// Returns the number of markers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.marker_count.load(Ordering::Relaxed)
    }

    /// Returns true if no URL is marked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LoadMarkerPort for DiskMarkerStore {
    async fn contains(&self, url: &str) -> Result<bool, MarkerError> {
        let path = self.marker_path(url);
        let hit = fs::try_exists(&path)
            .await
            .map_err(|e| MarkerError::ReadFailed(format!("{}: {e}", path.display())))?;
        trace!(url = %url, hit = hit, "Disk marker lookup");
        Ok(hit)
    }

    async fn mark(&self, url: &str) -> Result<(), MarkerError> {
        let path = self.marker_path(url);
        let existed = fs::try_exists(&path).await.unwrap_or(false);

        let mut file = fs::File::create(&path)
            .await
            .map_err(|e| MarkerError::WriteFailed(format!("Failed to create marker file: {e}")))?;
        file.write_all(url.as_bytes())
            .await
            .map_err(|e| MarkerError::WriteFailed(format!("Failed to write marker file: {e}")))?;
        file.flush()
            .await
            .map_err(|e| MarkerError::WriteFailed(format!("Failed to flush marker file: {e}")))?;

        if !existed {
            self.marker_count.fetch_add(1, Ordering::Relaxed);
        }
        trace!(url = %url, path = %path.display(), "Stored load marker");
        Ok(())
    }
}

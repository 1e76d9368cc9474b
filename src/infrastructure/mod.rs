//! Infrastructure layer with adapters for the network, disk and viewport.

/// Application configuration.
pub mod config;
/// Image sources.
pub mod image;
/// Load marker stores.
pub mod markers;
/// Viewport intersection.
pub mod viewport;

pub use config::{AppConfig, CliArgs, ConfigError, LogLevel, StorageManager};
pub use image::HttpImageSource;
pub use markers::{DiskMarkerStore, MarkerStats, MemoryMarkerStore};
pub use viewport::ViewportIntersector;

//! Load marker stores.

mod disk_marker_store;
mod memory_marker_store;

pub use disk_marker_store::DiskMarkerStore;
pub use memory_marker_store::{DEFAULT_MARKER_CAPACITY, MarkerStats, MemoryMarkerStore};

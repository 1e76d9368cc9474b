//! Load orchestration services.

mod cache_gate;
mod imager;
mod observer;

pub use cache_gate::CacheGate;
pub use imager::Imager;
pub use observer::Observer;

//! Application layer composing the domain ports into load services.

/// Fetcher, visibility trigger and cache gate.
pub mod services;

pub use services::{CacheGate, Imager, Observer};

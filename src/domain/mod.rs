//! Domain layer with core entities, errors, pure services and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;
/// Pure decision logic.
pub mod services;

pub use entities::{DisplayedSource, ImageStatus, LoadRequest, RetryPolicy};
pub use errors::{LoadError, MarkerError};
pub use services::{RetryDecision, should_retry};

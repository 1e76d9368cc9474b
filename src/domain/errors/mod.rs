//! Domain error types.

mod load_error;
mod marker_error;

pub use load_error::LoadError;
pub use marker_error::MarkerError;

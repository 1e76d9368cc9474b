//! Load marker store error types.

use thiserror::Error;

/// Load marker store error variants.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum MarkerError {
    #[error("failed to read load marker: {0}")]
    ReadFailed(String),

    #[error("failed to write load marker: {0}")]
    WriteFailed(String),

    #[error("load marker store not available: {0}")]
    NotAvailable(String),
}

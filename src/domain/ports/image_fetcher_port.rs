//! Port definition for the retrying image fetcher.

use crate::domain::entities::{CrossOrigin, FailedLoad, LoadedImage, RetryPolicy};

/// Invoked once when a load sequence succeeds.
pub type SuccessCallback = Box<dyn FnOnce(LoadedImage) + Send + 'static>;

/// Invoked once when a load sequence exhausts its retry budget.
pub type FailureCallback = Box<dyn FnOnce(FailedLoad) + Send + 'static>;

/// Drives one load sequence at a time and reports exactly one terminal outcome.
pub trait ImageFetcherPort: Send {
    /// Starts a new load sequence, replacing any sequence in progress.
    fn load(
        &mut self,
        url: String,
        cross_origin: Option<CrossOrigin>,
        decode: bool,
        retry: RetryPolicy,
        on_failure: FailureCallback,
        on_success: SuccessCallback,
    );

    /// Cancels the current sequence. Idempotent.
    fn unload(&mut self);
}

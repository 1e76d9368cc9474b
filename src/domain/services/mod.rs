//! Pure domain services.

mod retry_policy;

pub use retry_policy::{RetryDecision, should_retry};

use std::time::Duration;

use crate::domain::entities::{DelayGrowth, RetryPolicy};

/// Outcome of consulting a retry policy after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDecision {
    /// Whether another attempt should be made.
    pub retry: bool,
    /// Wait before the next attempt.
    pub delay: Duration,
}

impl RetryDecision {
    const STOP: Self = Self {
        retry: false,
        delay: Duration::ZERO,
    };
}

/// Decides whether to retry after `attempt_index` failed attempts.
///
/// `attempt_index` is 0-based: it is 0 after the first failure.
#[must_use]
pub fn should_retry(attempt_index: u32, policy: &RetryPolicy) -> RetryDecision {
    if attempt_index >= policy.max_attempts() {
        return RetryDecision::STOP;
    }

    RetryDecision {
        retry: true,
        delay: retry_delay(attempt_index, policy),
    }
}

fn retry_delay(attempt_index: u32, policy: &RetryPolicy) -> Duration {
    let base = policy.base_delay();
    match policy.growth {
        DelayGrowth::Constant => base,
        DelayGrowth::Linear => base.saturating_mul(attempt_index.saturating_add(1)),
        DelayGrowth::Exponential => {
            base.saturating_mul(2_u32.saturating_pow(attempt_index.min(16)))
        }
    }
}

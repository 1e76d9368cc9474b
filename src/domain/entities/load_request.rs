//! Load request and retry configuration types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Cross-origin mode applied to the fetch of the target image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrossOrigin {
    /// Never send credentials. An empty attribute value means the same.
    #[serde(rename = "anonymous", alias = "")]
    Anonymous,
    /// Send configured credentials along with the request.
    #[serde(rename = "use-credentials")]
    UseCredentials,
}

impl CrossOrigin {
    /// Returns the attribute value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::UseCredentials => "use-credentials",
        }
    }

    /// Parses an attribute value. Unknown values fall back to anonymous.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("use-credentials") {
            Self::UseCredentials
        } else {
            Self::Anonymous
        }
    }
}

impl std::fmt::Display for CrossOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the retry delay evolves between attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelayGrowth {
    /// Same delay before every retry.
    #[default]
    Constant,
    /// Delay grows by the base delay on each retry.
    Linear,
    /// Delay doubles on each retry.
    Exponential,
}

/// Retry budget for a load sequence.
///
/// Both fields are optional on the wire; unset means zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub count: Option<u32>,
    /// Delay before each retry, in milliseconds.
    pub delay: Option<u64>,
    /// Delay growth between retries.
    #[serde(skip_serializing_if = "is_constant")]
    pub growth: DelayGrowth,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_constant(growth: &DelayGrowth) -> bool {
    *growth == DelayGrowth::Constant
}

impl RetryPolicy {
    /// No retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            count: None,
            delay: None,
            growth: DelayGrowth::Constant,
        }
    }

    /// Retries `count` times, waiting `delay_ms` before each retry.
    #[must_use]
    pub const fn new(count: u32, delay_ms: u64) -> Self {
        Self {
            count: Some(count),
            delay: Some(delay_ms),
            growth: DelayGrowth::Constant,
        }
    }

    /// Sets the delay growth.
    #[must_use]
    pub const fn with_growth(mut self, growth: DelayGrowth) -> Self {
        self.growth = growth;
        self
    }

    /// Returns the retry budget.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.count.unwrap_or(0)
    }

    /// Returns the configured base delay.
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.delay.unwrap_or(0))
    }
}

/// Everything that identifies one fetch sequence.
///
/// A change to any field starts a new sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadRequest {
    /// Target URL.
    pub url: String,
    /// Cross-origin mode.
    pub cross_origin: Option<CrossOrigin>,
    /// Whether an explicit decode step is required before success.
    pub decode: bool,
    /// Retry budget.
    pub retry: RetryPolicy,
}

impl LoadRequest {
    /// Creates a request with decode enabled and no retries.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cross_origin: None,
            decode: true,
            retry: RetryPolicy::none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        mode: CrossOrigin,
    }

    #[test]
    fn test_cross_origin_wire_values() {
        let parsed: Wrapper = toml::from_str(r#"mode = """#).expect("empty value");
        assert_eq!(parsed.mode, CrossOrigin::Anonymous);

        let parsed: Wrapper = toml::from_str(r#"mode = "use-credentials""#).expect("credentials");
        assert_eq!(parsed.mode, CrossOrigin::UseCredentials);

        assert_eq!(CrossOrigin::parse("USE-CREDENTIALS"), CrossOrigin::UseCredentials);
        assert_eq!(CrossOrigin::parse("whatever"), CrossOrigin::Anonymous);
    }

    #[test]
    fn test_retry_policy_unset_fields_are_zero() {
        let policy: RetryPolicy = toml::from_str("").expect("empty table");
        assert_eq!(policy, RetryPolicy::none());
        assert_eq!(policy.max_attempts(), 0);
        assert_eq!(policy.base_delay(), Duration::ZERO);

        let policy: RetryPolicy = toml::from_str("count = 3").expect("count only");
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.base_delay(), Duration::ZERO);
    }

    #[test]
    fn test_retry_policy_growth() {
        let policy: RetryPolicy =
            toml::from_str("count = 2\ndelay = 50\ngrowth = \"exponential\"").expect("growth");
        assert_eq!(policy.growth, DelayGrowth::Exponential);
        assert_eq!(policy.base_delay(), Duration::from_millis(50));
    }

    #[test]
    fn test_requests_differ_by_retry() {
        let a = LoadRequest::new("a.png");
        let mut b = a.clone();
        assert_eq!(a, b);
        b.retry = RetryPolicy::new(1, 0);
        assert_ne!(a, b);
    }
}

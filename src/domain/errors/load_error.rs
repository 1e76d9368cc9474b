//! Image load error types.

use thiserror::Error;

/// Failure of a single load attempt.
///
/// Both variants are retryable up to the configured budget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum LoadError {
    #[error("failed to fetch image: {message}")]
    Fetch {
        message: String,
        status: Option<u16>,
    },

    #[error("failed to decode image: {message}")]
    Decode { message: String },
}

impl LoadError {
    /// Creates fetch error.
    #[must_use]
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch {
            message: message.into(),
            status: None,
        }
    }

    /// Creates fetch error for a non-success HTTP status.
    #[must_use]
    pub fn http_status(status: u16, reason: Option<&str>) -> Self {
        Self::Fetch {
            message: format!("HTTP {status}: {}", reason.unwrap_or("Unknown")),
            status: Some(status),
        }
    }

    /// Creates decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Returns whether another attempt may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Decode { .. })
    }

    /// Returns whether the bytes arrived but could not be decoded.
    #[must_use]
    pub const fn is_decode_error(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_message() {
        let err = LoadError::http_status(404, Some("Not Found"));
        assert_eq!(err.to_string(), "failed to fetch image: HTTP 404: Not Found");
        assert!(matches!(err, LoadError::Fetch { status: Some(404), .. }));
    }

    #[test]
    fn test_both_kinds_are_retryable() {
        assert!(LoadError::fetch("connection reset").is_retryable());
        assert!(LoadError::decode("bad header").is_retryable());
        assert!(LoadError::decode("bad header").is_decode_error());
        assert!(!LoadError::fetch("timeout").is_decode_error());
    }
}

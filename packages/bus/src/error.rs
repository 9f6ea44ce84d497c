//! Transport errors.

use thiserror::Error;

/// Errors raised by a [`MessageBus`](crate::MessageBus).
///
/// None of these are fatal to the process. A failed subscription closes
/// the session that owned it; a failed publish is returned to the caller.
#[derive(Debug, Error)]
pub enum BusError {
    /// The endpoint could not be reached.
    #[error("connect to {host} failed: {message}")]
    Connect { host: String, message: String },

    /// Subscribing to a channel failed.
    #[error("subscribe to {channel} failed: {message}")]
    Subscribe { channel: String, message: String },

    /// The transport refused a publish.
    #[error("publish to {channel} failed: {message}")]
    Publish { channel: String, message: String },

    /// No transport is known for the host URL's scheme.
    #[error("unsupported transport scheme `{scheme}`")]
    UnsupportedScheme { scheme: String },

    /// The subscription ended and will not deliver again.
    #[error("subscription to {channel} closed")]
    Closed { channel: String },

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl BusError {
    pub(crate) fn subscribe(channel: impl ToString, error: impl ToString) -> Self {
        BusError::Subscribe {
            channel: channel.to_string(),
            message: error.to_string(),
        }
    }

    pub(crate) fn publish(channel: impl ToString, error: impl ToString) -> Self {
        BusError::Publish {
            channel: channel.to_string(),
            message: error.to_string(),
        }
    }
}

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, BusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_error_display() {
        let e = BusError::publish("UpdateParam:swap-mm-ethusd", "connection reset");
        let display = e.to_string();
        assert!(display.contains("UpdateParam:swap-mm-ethusd"));
        assert!(display.contains("connection reset"));
    }

    #[test]
    fn url_error_conversion() {
        let e: BusError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(e, BusError::UrlParse(_)));
    }

    #[test]
    fn unsupported_scheme_display() {
        let e = BusError::UnsupportedScheme {
            scheme: "ftp".into(),
        };
        assert_eq!(e.to_string(), "unsupported transport scheme `ftp`");
    }
}

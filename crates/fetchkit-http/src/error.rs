//! Error type shared by the resolver, the transport and the response helpers.

use thiserror::Error;

/// Everything that can go wrong between building a request and reading its body.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Only GET and POST are supported.
    #[error("unsupported HTTP method: {0} (only GET and POST are supported)")]
    UnsupportedMethod(String),

    /// The options cannot form a valid request (bad URL, bad header, POST without body).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid proxy URL {proxy:?}: {reason}")]
    InvalidProxyUrl { proxy: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// Connection, DNS, TLS or timeout failure before a response arrived.
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed to read response body: {0}")]
    ResponseRead(#[source] reqwest::Error),

    /// Body is not a JSON object.
    #[error("failed to decode JSON object: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to format JSON: {0}")]
    Format(#[source] serde_json::Error),
}

impl HttpError {
    pub(crate) fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub(crate) fn invalid_proxy(proxy: &str, reason: impl ToString) -> Self {
        Self::InvalidProxyUrl {
            proxy: proxy.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the underlying transport gave up because a deadline elapsed.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport(e) | Self::ResponseRead(e) => e.is_timeout(),
            _ => false,
        }
    }
}

/// Result alias using [`HttpError`].
pub type Result<T> = std::result::Result<T, HttpError>;

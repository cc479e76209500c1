//! CLI error handling and exit codes.

use std::io;
use std::process::ExitCode;

use fetchkit_http::HttpError;
use thiserror::Error;

/// CLI error type
#[derive(Debug, Error)]
pub enum CliError {
    /// Logging or environment setup failed.
    #[error("{message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: io::Error,
    },

    /// The request never produced a complete response.
    #[error("{source}")]
    Network {
        #[source]
        source: HttpError,
        url: String,
    },

    /// Method, URL, header, body or proxy were rejected before sending.
    #[error("{0}")]
    Validation(#[source] HttpError),

    /// The body could not be rendered in the requested output mode.
    #[error("{0}")]
    Output(#[source] HttpError),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Classify a library error.
    pub fn from_http(error: HttpError, url: &str) -> Self {
        match error {
            HttpError::UnsupportedMethod(_)
            | HttpError::InvalidRequest(_)
            | HttpError::InvalidProxyUrl { .. } => Self::Validation(error),
            HttpError::ClientBuild(_) | HttpError::Transport(_) | HttpError::ResponseRead(_) => {
                Self::Network {
                    source: error,
                    url: url.to_string(),
                }
            }
            HttpError::Decode(_) | HttpError::Format(_) => Self::Output(error),
        }
    }

    /// Create a config error
    pub fn config(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Config { .. } => 2,
            Self::Io { .. } => 3,
            Self::Network { .. } => 4,
            Self::Validation(_) => 5,
            Self::Output(_) | Self::Other(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_errors_are_classified() {
        let err = CliError::from_http(HttpError::UnsupportedMethod("PUT".into()), "http://x/");
        assert!(matches!(err, CliError::Validation(_)));
        assert_eq!(err.code(), 5);

        let err = CliError::from_http(
            HttpError::InvalidProxyUrl {
                proxy: "nope".into(),
                reason: "relative URL without a base".into(),
            },
            "http://x/",
        );
        assert_eq!(err.code(), 5);

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = CliError::from_http(HttpError::Format(json_err), "http://x/");
        assert!(matches!(err, CliError::Output(_)));
        assert_eq!(err.code(), 1);
    }

    #[test]
    fn test_config_and_io_codes() {
        let err = CliError::config("bad", io::Error::new(io::ErrorKind::Other, "x"));
        assert_eq!(err.code(), 2);
        assert_eq!(err.to_string(), "bad");

        let err = CliError::io("stdout closed", io::Error::new(io::ErrorKind::BrokenPipe, "x"));
        assert_eq!(err.code(), 3);
    }

    #[test]
    fn test_other_from_anyhow() {
        let err: CliError = anyhow::anyhow!("boom").into();
        assert_eq!(err.code(), 1);
        assert_eq!(err.to_string(), "boom");
    }
}

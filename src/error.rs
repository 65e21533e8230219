//! Error types for mockwire.

use thiserror::Error;

/// Main error type for all mockwire operations.
#[derive(Debug, Error)]
pub enum MockError {
    /// A handler predicate failed while testing a request.
    #[error("Predicate error in handler \"{handler}\": {message}")]
    Predicate {
        /// Header of the failing handler.
        handler: String,
        /// Failure description.
        message: String,
    },

    /// A handler resolver failed instead of responding or passing.
    #[error("Resolver error in handler \"{handler}\": {message}")]
    Resolver {
        /// Header of the failing handler.
        handler: String,
        /// Failure description.
        message: String,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// MsgPack serialization error.
    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// MsgPack deserialization error.
    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// Malformed route pattern.
    #[error("Invalid route \"{0}\"")]
    InvalidRoute(String),

    /// Method name that is not a supported HTTP method.
    #[error("Unknown HTTP method \"{0}\"")]
    UnknownMethod(String),

    /// Invalid engine configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The engine or the transport side of a request went away.
    #[error("Engine closed")]
    EngineClosed,
}

impl MockError {
    /// Build a resolver error from any displayable failure.
    ///
    /// The handler header is filled in by the engine when the error is reported.
    pub fn resolver(message: impl std::fmt::Display) -> Self {
        MockError::Resolver {
            handler: String::new(),
            message: message.to_string(),
        }
    }

    /// Attach the failing handler's header to a predicate or resolver error.
    pub(crate) fn with_handler(self, header: &str) -> Self {
        match self {
            MockError::Predicate { handler, message } if handler.is_empty() => {
                MockError::Predicate {
                    handler: header.to_string(),
                    message,
                }
            }
            MockError::Resolver { handler, message } if handler.is_empty() => {
                MockError::Resolver {
                    handler: header.to_string(),
                    message,
                }
            }
            other => other,
        }
    }

    /// Build a predicate error from any displayable failure.
    pub fn predicate(message: impl std::fmt::Display) -> Self {
        MockError::Predicate {
            handler: String::new(),
            message: message.to_string(),
        }
    }
}

/// Result type alias using MockError.
pub type Result<T> = std::result::Result<T, MockError>;

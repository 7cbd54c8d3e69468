//! Error types for the GraphQL client.
//!
//! Failures are split by the stage that produces them:
//!
//! - [`TransportError`]: the [`RequestExecutor`](crate::RequestExecutor) could
//!   not complete the HTTP round trip.
//! - [`Error::MalformedResponse`]: the round trip completed but the body is not
//!   a GraphQL response envelope.
//! - [`ExtractError`]: a value could not be pulled out of a parsed response.
//!   These are raised lazily, one extraction at a time.
//!
//! GraphQL-level errors (the `errors` array of a parsed response) are not
//! failures of the client. They are exposed on the response and only become an
//! [`Error::Execution`] when the caller asks for it through
//! [`GraphQLResponse::into_result`](crate::GraphQLResponse::into_result).

use crate::response::GraphQLExecutionError;

/// A specialized Result type for GraphQL client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the GraphQL client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request executor failed before a response was received.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The HTTP body is not a valid GraphQL response envelope.
    #[error("malformed GraphQL response (HTTP {status}): {message}")]
    MalformedResponse { status: u16, message: String },

    /// The request payload could not be serialized.
    #[error("failed to serialize GraphQL request: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The configured endpoint is not a valid URL.
    #[error("invalid endpoint URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The operation cannot be executed by this client.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The server answered with GraphQL errors.
    #[error(transparent)]
    Execution(#[from] GraphQLExecutionError),

    /// A value could not be extracted from the response data.
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

impl Error {
    /// Create a malformed response error.
    pub fn malformed(status: u16, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            status,
            message: message.into(),
        }
    }

    /// Check whether this error was raised by the transport.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Failures reported by a [`RequestExecutor`](crate::RequestExecutor).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Connection refused or failed.
    #[error("connection error: {0}")]
    Connection(String),
    /// The request timed out.
    #[error("request timed out")]
    Timeout,
    /// TLS handshake or certificate failure.
    #[error("TLS error: {0}")]
    Tls(String),
    /// The request could not be built or sent.
    #[error("request error: {0}")]
    Request(String),
    /// I/O failure while reading or writing.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut => Self::Timeout,
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted => Self::Connection(err.to_string()),
            _ => Self::Io(err.to_string()),
        }
    }
}

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

/// Errors raised while extracting values from response data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    /// The path expression is not syntactically valid.
    #[error("invalid path '{path}' at offset {offset}: {message}")]
    InvalidPath {
        path: String,
        offset: usize,
        message: String,
    },

    /// A step of the path did not resolve.
    #[error("field not found: '{path}' does not resolve at '{at}'")]
    FieldNotFound { path: String, at: String },

    /// The resolved value does not fit the requested shape.
    #[error("type mismatch at '{at}': expected {expected}, {message}")]
    TypeMismatch {
        at: String,
        expected: String,
        message: String,
    },

    /// The shape names a custom scalar with no registered coercion.
    #[error("no coercion registered for scalar '{scalar}' (at '{at}')")]
    UnknownScalar { at: String, scalar: String },
}

impl ExtractError {
    pub(crate) fn invalid_path(
        path: impl Into<String>,
        offset: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidPath {
            path: path.into(),
            offset,
            message: message.into(),
        }
    }

    pub(crate) fn type_mismatch(
        at: impl Into<String>,
        expected: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            at: at.into(),
            expected: expected.into(),
            message: message.into(),
        }
    }

    /// Check whether the path failed to resolve.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FieldNotFound { .. })
    }

    /// Check whether the value had the wrong shape.
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. })
    }
}

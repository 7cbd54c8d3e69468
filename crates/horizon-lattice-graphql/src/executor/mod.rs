//! Pluggable HTTP transport.
//!
//! The client never opens sockets. Every round trip goes through a
//! [`RequestExecutor`], a single-method capability that receives the endpoint
//! URL, the outbound headers and the serialized body, and returns the status,
//! body and (optionally) headers of the reply. TLS, connection reuse, retries
//! and timeouts are all the executor's business.
//!
//! Any closure with the right signature is an executor, which keeps tests
//! free of network access:
//!
//! ```
//! use horizon_lattice_graphql::executor::{Headers, HttpResult};
//! use horizon_lattice_graphql::{GraphQLClient, TransportError};
//!
//! let executor = |_url: &str, _headers: &Headers, _body: &str| {
//!     Ok::<_, TransportError>(HttpResult::new(200, r#"{"data":{"ping":"pong"}}"#))
//! };
//!
//! let client = GraphQLClient::builder("https://api.example.com/graphql")
//!     .build()
//!     .unwrap();
//! let response = client
//!     .execute_query("{ ping }", Default::default(), None, &executor)
//!     .unwrap();
//! assert_eq!(response.extract::<String>("ping").unwrap(), "pong");
//! ```
//!
//! With the `reqwest` feature (enabled by default), [`ReqwestExecutor`]
//! provides a blocking HTTP implementation.

#[cfg(feature = "reqwest")]
mod blocking;

#[cfg(feature = "reqwest")]
pub use blocking::{ReqwestExecutor, ReqwestExecutorBuilder, ReqwestExecutorConfig};

use std::collections::HashMap;

use crate::error::TransportError;

/// HTTP headers: each name maps to its values in the order they were sent.
///
/// Names are compared case-sensitively.
pub type Headers = HashMap<String, Vec<String>>;

/// The outcome of one HTTP round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResult {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
    /// Response headers, if the executor captured them.
    pub headers: Option<Headers>,
}

impl HttpResult {
    /// Create a result without headers.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: None,
        }
    }

    /// Attach captured headers.
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Append one header value.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Headers::new)
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Check if the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs the HTTP round trip for a GraphQL request.
///
/// Implementations may be called from several threads at once if the caller
/// shares them; the client itself only requires that each call produces one
/// [`HttpResult`] or one [`TransportError`].
pub trait RequestExecutor {
    /// POST `body` to `url` with the given headers.
    fn execute(
        &self,
        url: &str,
        headers: &Headers,
        body: &str,
    ) -> Result<HttpResult, TransportError>;
}

impl<F> RequestExecutor for F
where
    F: Fn(&str, &Headers, &str) -> Result<HttpResult, TransportError>,
{
    fn execute(
        &self,
        url: &str,
        headers: &Headers,
        body: &str,
    ) -> Result<HttpResult, TransportError> {
        self(url, headers, body)
    }
}

/// Set a header, replacing any value stored under a case-insensitive match.
pub(crate) fn set_header(headers: &mut Headers, name: &str, value: impl Into<String>) {
    headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), vec![value.into()]);
}

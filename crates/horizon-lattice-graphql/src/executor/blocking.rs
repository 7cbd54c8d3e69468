//! Blocking HTTP executor backed by reqwest.

use std::sync::Arc;
use std::time::Duration;

use super::{Headers, HttpResult, RequestExecutor};
use crate::error::TransportError;

/// Configuration for [`ReqwestExecutor`].
#[derive(Clone, Debug)]
pub struct ReqwestExecutorConfig {
    /// Request timeout.
    pub timeout: Option<Duration>,
    /// Connect timeout.
    pub connect_timeout: Option<Duration>,
    /// User agent sent with every request.
    pub user_agent: Option<String>,
    /// Proxy URL.
    pub proxy: Option<String>,
    /// Accept invalid TLS certificates.
    pub danger_accept_invalid_certs: bool,
}

impl Default for ReqwestExecutorConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
            user_agent: Some(format!(
                "HorizonLattice-GraphQL/{} (Rust)",
                env!("CARGO_PKG_VERSION")
            )),
            proxy: None,
            danger_accept_invalid_certs: false,
        }
    }
}

/// Builder for [`ReqwestExecutor`].
#[derive(Debug, Default)]
pub struct ReqwestExecutorBuilder {
    config: ReqwestExecutorConfig,
}

impl ReqwestExecutorBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Disable request timeout.
    pub fn no_timeout(mut self) -> Self {
        self.config.timeout = None;
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Set a proxy URL.
    pub fn proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.config.proxy = Some(proxy_url.into());
        self
    }

    /// Accept invalid TLS certificates.
    ///
    /// # Warning
    ///
    /// This is insecure and should only be used for testing.
    pub fn danger_accept_invalid_certs(mut self) -> Self {
        self.config.danger_accept_invalid_certs = true;
        self
    }

    /// Build the executor.
    pub fn build(self) -> Result<ReqwestExecutor, TransportError> {
        let mut builder = reqwest::blocking::Client::builder();

        // Unlike the async client, the blocking builder defaults to a 30s
        // timeout, so `None` has to be passed explicitly.
        builder = builder.timeout(self.config.timeout);
        if let Some(connect_timeout) = self.config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        if let Some(ref ua) = self.config.user_agent {
            builder = builder.user_agent(ua);
        }

        if let Some(ref proxy_url) = self.config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| TransportError::Request(format!("invalid proxy: {e}")))?;
            builder = builder.proxy(proxy);
        }

        if self.config.danger_accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Tls(e.to_string()))?;

        Ok(ReqwestExecutor {
            inner: Arc::new(ReqwestExecutorInner {
                client,
                config: self.config,
            }),
        })
    }
}

struct ReqwestExecutorInner {
    client: reqwest::blocking::Client,
    config: ReqwestExecutorConfig,
}

/// A [`RequestExecutor`] that POSTs over HTTP with a blocking reqwest client.
///
/// The executor is cheaply cloneable; clones share the connection pool.
/// It must not be used from inside an async runtime worker: call it from a
/// plain thread or through `spawn_blocking`.
///
/// # Example
///
/// ```no_run
/// use horizon_lattice_graphql::{GraphQLClient, ReqwestExecutor};
/// use std::time::Duration;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let executor = ReqwestExecutor::builder()
///     .timeout(Duration::from_secs(10))
///     .build()?;
/// let client = GraphQLClient::builder("https://api.example.com/graphql").build()?;
///
/// let response = client.execute_query("{ viewer { login } }", Default::default(), None, &executor)?;
/// let login: String = response.extract("viewer.login")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ReqwestExecutor {
    inner: Arc<ReqwestExecutorInner>,
}

impl ReqwestExecutor {
    /// Create an executor with default configuration.
    pub fn new() -> Result<Self, TransportError> {
        ReqwestExecutorBuilder::new().build()
    }

    /// Create a builder for configuring a new executor.
    pub fn builder() -> ReqwestExecutorBuilder {
        ReqwestExecutorBuilder::new()
    }

    /// Get the executor's configuration.
    pub fn config(&self) -> &ReqwestExecutorConfig {
        &self.inner.config
    }
}

impl RequestExecutor for ReqwestExecutor {
    fn execute(
        &self,
        url: &str,
        headers: &Headers,
        body: &str,
    ) -> Result<HttpResult, TransportError> {
        let mut request = self.inner.client.post(url);
        for (name, values) in headers {
            for value in values {
                request = request.header(name.as_str(), value.as_str());
            }
        }

        let response = request.body(body.to_string()).send()?;
        let status = response.status().as_u16();

        let mut captured = Headers::new();
        for (name, value) in response.headers() {
            captured
                .entry(name.as_str().to_string())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }

        let body = response.text()?;

        Ok(HttpResult {
            status,
            body,
            headers: Some(captured),
        })
    }
}

impl std::fmt::Debug for ReqwestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestExecutor")
            .field("config", &self.inner.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = ReqwestExecutorConfig::default();
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(10)));
        assert!(config.user_agent.is_some());
        assert!(!config.danger_accept_invalid_certs);
    }

    #[test]
    fn test_builder_overrides() {
        let builder = ReqwestExecutor::builder()
            .no_timeout()
            .connect_timeout(Duration::from_secs(2))
            .user_agent("tests/1.0")
            .proxy("http://proxy.local:3128");

        assert_eq!(builder.config.timeout, None);
        assert_eq!(builder.config.connect_timeout, Some(Duration::from_secs(2)));
        assert_eq!(builder.config.user_agent.as_deref(), Some("tests/1.0"));
        assert_eq!(
            builder.config.proxy.as_deref(),
            Some("http://proxy.local:3128")
        );
    }

    #[test]
    fn test_invalid_proxy_is_rejected() {
        let err = ReqwestExecutor::builder()
            .proxy("http://[invalid")
            .build()
            .unwrap_err();
        assert!(matches!(err, TransportError::Request(_)));
    }
}

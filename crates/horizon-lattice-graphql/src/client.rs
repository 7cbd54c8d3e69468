//! GraphQL client implementation.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::executor::{self, Headers, RequestExecutor};
use crate::request::{GraphQLRequest, INTROSPECTION_QUERY};
use crate::response::GraphQLResponse;
use crate::scalar::{Coercing, ScalarRegistry};

const JSON_CONTENT_TYPE: &str = "application/json";

/// Builder for creating a GraphQL client.
pub struct GraphQLClientBuilder {
    url: String,
    default_headers: Headers,
    scalars: ScalarRegistry,
}

impl GraphQLClientBuilder {
    /// Create a new builder with the specified GraphQL endpoint URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            default_headers: Headers::new(),
            scalars: ScalarRegistry::new(),
        }
    }

    /// Add a default header to all requests.
    ///
    /// Replaces any earlier default header with the same name, ignoring case.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        executor::set_header(&mut self.default_headers, &name, value);
        self
    }

    /// Add multiple headers.
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        for (name, value) in headers {
            executor::set_header(&mut self.default_headers, &name, value);
        }
        self
    }

    /// Set bearer token authentication.
    pub fn bearer_auth(self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.header("Authorization", format!("Bearer {token}"))
    }

    /// Register a custom scalar coercion for responses produced by this client.
    pub fn scalar<C: Coercing>(mut self, name: impl Into<String>, coercing: C) -> Self {
        self.scalars.register(name, coercing);
        self
    }

    /// Replace the scalar registry.
    pub fn scalars(mut self, registry: ScalarRegistry) -> Self {
        self.scalars = registry;
        self
    }

    /// Build the GraphQL client.
    pub fn build(self) -> Result<GraphQLClient> {
        url::Url::parse(&self.url).map_err(|source| Error::InvalidUrl {
            url: self.url.clone(),
            source,
        })?;

        Ok(GraphQLClient {
            inner: Arc::new(GraphQLClientInner {
                url: self.url,
                default_headers: self.default_headers,
                scalars: Arc::new(self.scalars),
            }),
        })
    }
}

struct GraphQLClientInner {
    url: String,
    default_headers: Headers,
    scalars: Arc<ScalarRegistry>,
}

/// A GraphQL client for queries and mutations over HTTP.
///
/// The client holds only immutable configuration and is cheap to clone. The
/// HTTP round trip is delegated to the [`RequestExecutor`] passed to each call.
///
/// # Example
///
/// ```
/// use horizon_lattice_graphql::executor::{Headers, HttpResult};
/// use horizon_lattice_graphql::{GraphQLClient, GraphQLRequest, TransportError};
///
/// let executor = |_url: &str, _headers: &Headers, _body: &str| {
///     Ok::<_, TransportError>(HttpResult::new(
///         200,
///         r#"{"data":{"user":{"id":"1","name":"John"}}}"#,
///     ))
/// };
///
/// let client = GraphQLClient::builder("https://api.example.com/graphql")
///     .bearer_auth("my-token")
///     .build()
///     .unwrap();
///
/// let request = GraphQLRequest::query("query($id: ID!) { user(id: $id) { id name } }")
///     .variable("id", "1");
/// let response = client.execute(&request, &executor).unwrap();
///
/// let name: String = response.extract("user.name").unwrap();
/// assert_eq!(name, "John");
/// ```
#[derive(Clone)]
pub struct GraphQLClient {
    inner: Arc<GraphQLClientInner>,
}

impl GraphQLClient {
    /// Create a new GraphQL client with the specified endpoint URL.
    pub fn new(url: impl Into<String>) -> GraphQLClientBuilder {
        GraphQLClientBuilder::new(url)
    }

    /// Create a new builder for configuring a GraphQL client.
    pub fn builder(url: impl Into<String>) -> GraphQLClientBuilder {
        GraphQLClientBuilder::new(url)
    }

    /// Get the HTTP endpoint URL.
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Get the headers sent with every request.
    pub fn default_headers(&self) -> &Headers {
        &self.inner.default_headers
    }

    /// Get the scalar registry attached to every response.
    pub fn scalars(&self) -> &Arc<ScalarRegistry> {
        &self.inner.scalars
    }

    /// Execute a GraphQL operation (query or mutation).
    ///
    /// The executor is invoked exactly once. A transport failure is returned
    /// as [`Error::Transport`]; otherwise the body is parsed whatever the
    /// HTTP status, and GraphQL errors are left on the response.
    pub fn execute<E>(&self, request: &GraphQLRequest, executor: &E) -> Result<GraphQLResponse>
    where
        E: RequestExecutor + ?Sized,
    {
        if request.is_subscription() {
            return Err(Error::UnsupportedOperation(
                "subscriptions cannot be executed over HTTP".into(),
            ));
        }

        let body = request.to_body()?;

        let mut headers = self.inner.default_headers.clone();
        executor::set_header(&mut headers, "Content-Type", JSON_CONTENT_TYPE);
        executor::set_header(&mut headers, "Accept", JSON_CONTENT_TYPE);

        tracing::debug!(
            target: "horizon_lattice_graphql::client",
            "Dispatching {:?} operation '{}' to {}",
            request.operation_type(),
            request.name().unwrap_or("<anonymous>"),
            self.inner.url
        );

        let result = executor
            .execute(&self.inner.url, &headers, &body)
            .inspect_err(|e| {
                tracing::debug!(target: "horizon_lattice_graphql::client", "Transport failure: {}", e);
            })?;

        let response = GraphQLResponse::from_http_result(result).inspect_err(|e| {
            tracing::warn!(target: "horizon_lattice_graphql::client", "Unparseable GraphQL response: {}", e);
        })?;

        tracing::debug!(
            target: "horizon_lattice_graphql::client",
            "Received HTTP {} with {} GraphQL error(s)",
            response.status(),
            response.errors().len()
        );

        Ok(response.with_scalars(Arc::clone(&self.inner.scalars)))
    }

    /// Execute a query document with variables and an optional operation name.
    ///
    /// The operation type is inferred from the document.
    pub fn execute_query<E>(
        &self,
        query: &str,
        variables: Map<String, Value>,
        operation_name: Option<&str>,
        executor: &E,
    ) -> Result<GraphQLResponse>
    where
        E: RequestExecutor + ?Sized,
    {
        let mut request = GraphQLRequest::new(query).variables(variables);
        if let Some(name) = operation_name {
            request = request.operation_name(name);
        }
        self.execute(&request, executor)
    }

    /// Execute a query and deserialize its `data`.
    ///
    /// Any GraphQL error fails the call with [`Error::Execution`].
    pub fn query<T, E>(
        &self,
        query: impl Into<String>,
        variables: Map<String, Value>,
        executor: &E,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        E: RequestExecutor + ?Sized,
    {
        let request = GraphQLRequest::query(query).variables(variables);
        self.fetch_data(&request, executor)
    }

    /// Execute a mutation and deserialize its `data`.
    ///
    /// Any GraphQL error fails the call with [`Error::Execution`].
    pub fn mutate<T, E>(
        &self,
        mutation: impl Into<String>,
        variables: Map<String, Value>,
        executor: &E,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        E: RequestExecutor + ?Sized,
    {
        let request = GraphQLRequest::mutation(mutation).variables(variables);
        self.fetch_data(&request, executor)
    }

    /// Fetch the schema using introspection.
    ///
    /// Returns the raw introspection response.
    pub fn introspect<E>(&self, executor: &E) -> Result<GraphQLResponse>
    where
        E: RequestExecutor + ?Sized,
    {
        let request = GraphQLRequest::query(INTROSPECTION_QUERY).operation_name("IntrospectionQuery");
        self.execute(&request, executor)
    }

    fn fetch_data<T, E>(&self, request: &GraphQLRequest, executor: &E) -> Result<T>
    where
        T: DeserializeOwned,
        E: RequestExecutor + ?Sized,
    {
        let response = self.execute(request, executor)?.into_result()?;
        Ok(response.data()?)
    }
}

impl std::fmt::Debug for GraphQLClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQLClient")
            .field("url", &self.inner.url)
            .field("scalars", &self.inner.scalars)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::executor::HttpResult;

    #[test]
    fn test_builder_defaults() {
        let client = GraphQLClient::new("https://api.example.com/graphql")
            .build()
            .unwrap();

        assert_eq!(client.url(), "https://api.example.com/graphql");
        assert!(client.default_headers().is_empty());
        assert!(client.scalars().is_empty());
    }

    #[test]
    fn test_invalid_url() {
        let err = GraphQLClient::builder("not a url").build().unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { ref url, .. } if url == "not a url"));
    }

    #[test]
    fn test_bearer_auth_replaces_authorization() {
        let client = GraphQLClient::builder("https://api.example.com/graphql")
            .header("authorization", "Basic xyz")
            .bearer_auth("token")
            .build()
            .unwrap();

        assert_eq!(client.default_headers().len(), 1);
        assert_eq!(client.default_headers()["Authorization"], vec!["Bearer token"]);
    }

    #[test]
    fn test_content_type_cannot_be_overridden() {
        let client = GraphQLClient::builder("https://api.example.com/graphql")
            .header("content-type", "text/plain")
            .header("X-Api-Key", "k")
            .build()
            .unwrap();

        let executor = |_: &str, headers: &Headers, _: &str| {
            assert_eq!(headers.len(), 3);
            assert_eq!(headers["Content-Type"], vec![JSON_CONTENT_TYPE]);
            assert_eq!(headers["Accept"], vec![JSON_CONTENT_TYPE]);
            assert_eq!(headers["X-Api-Key"], vec!["k"]);
            Ok::<_, TransportError>(HttpResult::new(200, r#"{"data":{}}"#))
        };

        client.execute_query("{ a }", Map::new(), None, &executor).unwrap();
    }

    #[test]
    fn test_subscription_rejected() {
        let client = GraphQLClient::builder("https://api.example.com/graphql")
            .build()
            .unwrap();
        let executor = |_: &str, _: &Headers, _: &str| -> std::result::Result<HttpResult, TransportError> {
            panic!("executor must not be called for subscriptions")
        };

        let documents = [
            "subscription { events { id } }",
            "# live feed\nsubscription { events { id } }",
            "fragment E on Event { id }\nsubscription { events { ...E } }",
        ];
        for document in documents {
            let err = client
                .execute_query(document, Map::new(), None, &executor)
                .unwrap_err();
            assert!(matches!(err, Error::UnsupportedOperation(_)), "{document:?}");
        }

        let err = client
            .execute_query(
                "query Feed { feed { id } }\nsubscription Live { feed { id } }",
                Map::new(),
                Some("Live"),
                &executor,
            )
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation(_)));
    }

    #[test]
    fn test_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<GraphQLClient>();
    }
}

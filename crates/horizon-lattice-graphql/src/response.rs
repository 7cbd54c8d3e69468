//! GraphQL response types.
//!
//! A [`GraphQLResponse`] owns the parsed JSON reply and answers path queries
//! against its `data` object. Parsing only checks the envelope; values are
//! pulled out lazily, and every extraction fails or succeeds on its own.
//!
//! # Example
//!
//! ```
//! use horizon_lattice_graphql::{GraphQLResponse, TypeDescriptor};
//!
//! let body = r#"{
//!     "data": {"submitReview": {"edges": [
//!         {"node": {"submittedBy": "a@x.com"}},
//!         {"node": {"submittedBy": "b@x.com"}}
//!     ]}}
//! }"#;
//! let response = GraphQLResponse::parse(body, 200, None).unwrap();
//!
//! let first: String = response.extract("submitReview.edges[0].node.submittedBy").unwrap();
//! assert_eq!(first, "a@x.com");
//!
//! let all = response
//!     .extract_value(
//!         "submitReview.edges[*].node.submittedBy",
//!         &TypeDescriptor::list_of(TypeDescriptor::string()),
//!     )
//!     .unwrap();
//! assert_eq!(all.into_strings().unwrap(), ["a@x.com", "b@x.com"]);
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Error, ExtractError, Result};
use crate::executor::{Headers, HttpResult};
use crate::path::Path;
use crate::scalar::{ScalarError, ScalarRegistry};
use crate::shape::{self, Projection, TypeDescriptor};

/// A GraphQL error returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLError {
    /// The error message.
    pub message: String,

    /// Locations in the document where the error occurred.
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub locations: Vec<GraphQLLocation>,

    /// Path to the field that caused the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,

    /// Additional error metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphQLError {
    /// Create an error carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: None,
            extensions: None,
        }
    }

    /// Render the error path in extraction syntax, e.g. `user.friends[0].name`.
    pub fn path_string(&self) -> Option<String> {
        let path = self.path.as_ref()?;
        let mut rendered = String::new();
        for segment in path {
            match segment {
                PathSegment::Field(name) => {
                    if !rendered.is_empty() {
                        rendered.push('.');
                    }
                    rendered.push_str(name);
                }
                PathSegment::Index(idx) => {
                    rendered.push_str(&format!("[{idx}]"));
                }
            }
        }
        Some(rendered)
    }
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(path) = self.path_string() {
            write!(f, " (at {path})")?;
        }
        Ok(())
    }
}

impl std::error::Error for GraphQLError {}

/// A location in a GraphQL document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQLLocation {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed).
    pub column: u32,
}

/// A segment in an error path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// A field name.
    Field(String),
    /// An array index.
    Index(usize),
}

/// The GraphQL errors of a response, raised as a failure.
///
/// Parsing never produces this. It is returned by
/// [`GraphQLResponse::into_result`] and the client's typed conveniences, for
/// callers that want to treat any server error as fatal.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQLExecutionError {
    errors: Vec<GraphQLError>,
}

impl GraphQLExecutionError {
    /// The server errors, in wire order.
    pub fn errors(&self) -> &[GraphQLError] {
        &self.errors
    }

    /// Consume the error, returning the server errors.
    pub fn into_errors(self) -> Vec<GraphQLError> {
        self.errors
    }
}

impl fmt::Display for GraphQLExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GraphQL error: ")?;
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for GraphQLExecutionError {}

/// A parsed GraphQL response.
///
/// Both `data` and `errors` may be present at once (partial success). Reading
/// `data` never looks at `errors`.
#[derive(Debug, Clone)]
pub struct GraphQLResponse {
    data: Option<Value>,
    errors: Vec<GraphQLError>,
    extensions: Option<Value>,
    status: u16,
    headers: Headers,
    scalars: Arc<ScalarRegistry>,
}

static NULL: Value = Value::Null;

impl GraphQLResponse {
    /// Parse a response body received with the given HTTP status.
    ///
    /// The status does not influence parsing: a non-2xx reply that carries a
    /// GraphQL envelope is a valid response.
    pub fn parse(body: &str, status: u16, headers: Option<Headers>) -> Result<Self> {
        let document: Value = serde_json::from_str(body)
            .map_err(|e| Error::malformed(status, format!("body is not valid JSON: {e}")))?;

        let Value::Object(mut envelope) = document else {
            return Err(Error::malformed(
                status,
                format!("expected a JSON object, found {}", shape::json_kind(&document)),
            ));
        };

        if !envelope.contains_key("data") && !envelope.contains_key("errors") {
            return Err(Error::malformed(
                status,
                "response has neither 'data' nor 'errors'",
            ));
        }

        let errors = match envelope.remove("errors") {
            None | Some(Value::Null) => Vec::new(),
            Some(errors) => parse_errors(errors, status)?,
        };
        let data = envelope.remove("data").filter(|data| !data.is_null());
        let extensions = envelope.remove("extensions").filter(|ext| !ext.is_null());

        Ok(Self {
            data,
            errors,
            extensions,
            status,
            headers: headers.unwrap_or_default(),
            scalars: Arc::new(ScalarRegistry::new()),
        })
    }

    /// Parse the outcome of a request executor.
    pub fn from_http_result(result: HttpResult) -> Result<Self> {
        Self::parse(&result.body, result.status, result.headers)
    }

    /// Attach the scalar registry used by [`Self::extract_value`] and
    /// [`Self::extract_scalar`].
    pub fn with_scalars(mut self, scalars: Arc<ScalarRegistry>) -> Self {
        self.scalars = scalars;
        self
    }

    /// Check if the response contains errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Check if the response was successful (has data and no errors).
    pub fn is_success(&self) -> bool {
        self.data.is_some() && self.errors.is_empty()
    }

    /// The server errors, in wire order.
    pub fn errors(&self) -> &[GraphQLError] {
        &self.errors
    }

    /// Get the first error, if any.
    pub fn first_error(&self) -> Option<&GraphQLError> {
        self.errors.first()
    }

    /// Get all error messages joined with `"; "`.
    pub fn error_message(&self) -> Option<String> {
        if self.errors.is_empty() {
            None
        } else {
            Some(
                self.errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        }
    }

    /// The errors as a [`GraphQLExecutionError`], if there are any.
    pub fn execution_error(&self) -> Option<GraphQLExecutionError> {
        self.has_errors().then(|| GraphQLExecutionError {
            errors: self.errors.clone(),
        })
    }

    /// Get raw data without parsing.
    pub fn raw_data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Response-level extensions.
    pub fn extensions(&self) -> Option<&Value> {
        self.extensions.as_ref()
    }

    /// HTTP status the response arrived with.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response headers, keyed as received. Empty when the executor did not
    /// capture any.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// First value of a header. The name is matched case-sensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// The scalar registry used for custom shapes.
    pub fn scalars(&self) -> &ScalarRegistry {
        &self.scalars
    }

    /// Evaluate a path against `data` and return the raw subtree.
    ///
    /// The subtree is borrowed unless the path contains a wildcard.
    pub fn select(&self, path: &str) -> std::result::Result<Cow<'_, Value>, ExtractError> {
        Path::parse(path)?.resolve(self.data_root())
    }

    /// Evaluate a path and project the result into `shape`.
    pub fn extract_value(
        &self,
        path: &str,
        shape: &TypeDescriptor,
    ) -> std::result::Result<Projection, ExtractError> {
        let path = Path::parse(path)?;
        let value = path.resolve(self.data_root())?;
        shape::project(&value, shape, &self.scalars, path.as_str())
    }

    /// Evaluate a path and deserialize the result.
    ///
    /// # Example
    ///
    /// ```
    /// use horizon_lattice_graphql::GraphQLResponse;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct User {
    ///     id: String,
    ///     name: String,
    /// }
    ///
    /// let response = GraphQLResponse::parse(
    ///     r#"{"data": {"user": {"id": "1", "name": "John"}}}"#,
    ///     200,
    ///     None,
    /// )
    /// .unwrap();
    ///
    /// let user: User = response.extract("user").unwrap();
    /// assert_eq!(user.name, "John");
    /// ```
    pub fn extract<T: DeserializeOwned>(&self, path: &str) -> std::result::Result<T, ExtractError> {
        let path = Path::parse(path)?;
        let value = path.resolve(self.data_root())?;
        T::deserialize(value.as_ref()).map_err(|e| {
            ExtractError::type_mismatch(path.as_str(), std::any::type_name::<T>(), e.to_string())
        })
    }

    /// Evaluate a path and coerce the result with a registered custom scalar.
    pub fn extract_scalar<T: 'static>(
        &self,
        path: &str,
        scalar: &str,
    ) -> std::result::Result<T, ExtractError> {
        let path = Path::parse(path)?;
        let value = path.resolve(self.data_root())?;
        let at = path.as_str();
        self.scalars
            .parse_value::<T>(scalar, &value)
            .map_err(|err| match err {
                ScalarError::Unknown(scalar) => ExtractError::UnknownScalar {
                    at: at.to_string(),
                    scalar,
                },
                other => ExtractError::type_mismatch(at, scalar, other.to_string()),
            })
    }

    /// Deserialize the whole `data` object.
    ///
    /// Errors in the response are ignored; see [`Self::into_result`].
    pub fn data<T: DeserializeOwned>(&self) -> std::result::Result<T, ExtractError> {
        self.extract("")
    }

    /// Convert errors to a Result.
    ///
    /// Returns `Ok(self)` if there are no errors, or
    /// [`Error::Execution`] carrying all of them.
    pub fn into_result(self) -> Result<Self> {
        if self.errors.is_empty() {
            Ok(self)
        } else {
            Err(Error::Execution(GraphQLExecutionError {
                errors: self.errors,
            }))
        }
    }

    fn data_root(&self) -> &Value {
        self.data.as_ref().unwrap_or(&NULL)
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn parse_errors(errors: Value, status: u16) -> Result<Vec<GraphQLError>> {
    let Value::Array(entries) = errors else {
        return Err(Error::malformed(
            status,
            format!("'errors' must be an array, found {}", shape::json_kind(&errors)),
        ));
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            if !entry.get("message").is_some_and(Value::is_string) {
                return Err(Error::malformed(
                    status,
                    format!("errors[{index}] has no string 'message'"),
                ));
            }
            serde_json::from_value(entry)
                .map_err(|e| Error::malformed(status, format!("errors[{index}]: {e}")))
        })
        .collect()
}

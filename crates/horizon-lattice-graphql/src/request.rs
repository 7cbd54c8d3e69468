//! GraphQL request types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// A GraphQL operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// A query operation (read-only).
    #[default]
    Query,
    /// A mutation operation (modifies data).
    Mutation,
    /// A subscription operation. Not executable over plain HTTP.
    Subscription,
}

/// A GraphQL request.
///
/// Serializes to the standard POST body:
///
/// ```json
/// { "query": "...", "operationName": "...", "variables": { } }
/// ```
///
/// `operationName` is left out when no name was set. `variables` is always
/// present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLRequest {
    query: String,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "operationName"
    )]
    operation_name: Option<String>,

    #[serde(default)]
    variables: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    extensions: Option<Value>,

    #[serde(skip)]
    operation_type: OperationType,

    #[serde(skip)]
    inferred: bool,
}

impl GraphQLRequest {
    /// Create a new query request.
    ///
    /// # Example
    ///
    /// ```
    /// use horizon_lattice_graphql::GraphQLRequest;
    ///
    /// let request = GraphQLRequest::query(r#"
    ///     query GetUsers {
    ///         users {
    ///             id
    ///             name
    ///         }
    ///     }
    /// "#);
    /// ```
    pub fn query(query: impl Into<String>) -> Self {
        Self::with_type(query.into(), OperationType::Query)
    }

    /// Create a new mutation request.
    ///
    /// # Example
    ///
    /// ```
    /// use horizon_lattice_graphql::GraphQLRequest;
    ///
    /// let request = GraphQLRequest::mutation(r#"
    ///     mutation CreateUser($name: String!) {
    ///         createUser(name: $name) {
    ///             id
    ///         }
    ///     }
    /// "#)
    /// .variable("name", "John");
    /// ```
    pub fn mutation(query: impl Into<String>) -> Self {
        Self::with_type(query.into(), OperationType::Mutation)
    }

    /// Create a new subscription request.
    ///
    /// Subscriptions need a streaming transport; the HTTP client rejects them.
    pub fn subscription(query: impl Into<String>) -> Self {
        Self::with_type(query.into(), OperationType::Subscription)
    }

    /// Create a new request from a raw query string.
    ///
    /// The operation type is taken from the first operation in the document,
    /// or from the operation selected later with [`Self::operation_name`].
    /// Defaults to Query.
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into();
        let operation_type = infer_operation_type(&query, None);
        Self {
            inferred: true,
            ..Self::with_type(query, operation_type)
        }
    }

    fn with_type(query: String, operation_type: OperationType) -> Self {
        Self {
            query,
            operation_name: None,
            variables: Map::new(),
            extensions: None,
            operation_type,
            inferred: false,
        }
    }

    /// Set a variable value.
    ///
    /// Values that cannot be represented as JSON are logged and skipped.
    ///
    /// # Example
    ///
    /// ```
    /// use horizon_lattice_graphql::GraphQLRequest;
    ///
    /// let request = GraphQLRequest::query("...")
    ///     .variable("id", "123")
    ///     .variable("limit", 10);
    /// ```
    pub fn variable(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
        let name = name.into();
        match serde_json::to_value(value) {
            Ok(value) => {
                self.variables.insert(name, value);
            }
            Err(e) => {
                tracing::error!(target: "horizon_lattice_graphql::request", "Failed to serialize variable '{}': {}", name, e);
            }
        }
        self
    }

    /// Replace all variables.
    pub fn variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = variables;
        self
    }

    /// Replace all variables with a serializable value.
    ///
    /// The value must serialize to a JSON object.
    ///
    /// # Example
    ///
    /// ```
    /// use horizon_lattice_graphql::GraphQLRequest;
    ///
    /// let request = GraphQLRequest::query("...")
    ///     .try_variables(serde_json::json!({
    ///         "id": "123",
    ///         "limit": 10
    ///     }))
    ///     .unwrap();
    /// ```
    pub fn try_variables(mut self, variables: impl Serialize) -> Result<Self> {
        match serde_json::to_value(variables).map_err(Error::Serialize)? {
            Value::Object(map) => {
                self.variables = map;
                Ok(self)
            }
            Value::Null => {
                self.variables = Map::new();
                Ok(self)
            }
            other => Err(Error::Serialize(serde::ser::Error::custom(format!(
                "variables must serialize to an object, found {}",
                crate::shape::json_kind(&other)
            )))),
        }
    }

    /// Set the operation name.
    ///
    /// Required when the query document contains multiple operations. An
    /// empty name is treated as no name.
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.operation_name = (!name.is_empty()).then_some(name);
        if self.inferred {
            self.operation_type = infer_operation_type(&self.query, self.name());
        }
        self
    }

    /// Set extensions (implementation-specific metadata).
    pub fn extensions(mut self, extensions: impl Serialize) -> Self {
        match serde_json::to_value(extensions) {
            Ok(value) => self.extensions = Some(value),
            Err(e) => {
                tracing::error!(target: "horizon_lattice_graphql::request", "Failed to serialize extensions: {}", e);
            }
        }
        self
    }

    /// Get the query document.
    pub fn query_text(&self) -> &str {
        &self.query
    }

    /// Get the operation name, if set.
    pub fn name(&self) -> Option<&str> {
        self.operation_name.as_deref()
    }

    /// Get the variables.
    pub fn variable_map(&self) -> &Map<String, Value> {
        &self.variables
    }

    /// Get the extensions, if set.
    pub fn extension_value(&self) -> Option<&Value> {
        self.extensions.as_ref()
    }

    /// Get the operation type.
    pub fn operation_type(&self) -> OperationType {
        self.operation_type
    }

    /// Check if this is a subscription.
    pub fn is_subscription(&self) -> bool {
        self.operation_type == OperationType::Subscription
    }

    /// Serialize the request to a JSON body.
    pub fn to_body(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Error::Serialize)
    }
}

/// Operation type of the named operation, or of the first one in the document.
fn infer_operation_type(document: &str, name: Option<&str>) -> OperationType {
    let operations = scan_operations(document);
    name.and_then(|name| operations.iter().find(|(_, op)| *op == Some(name)))
        .or(operations.first())
        .map_or(OperationType::Query, |(kind, _)| *kind)
}

/// Top-level operations of a document, in order, with their names.
///
/// Fragments and other definitions are skipped along with their bodies.
fn scan_operations(document: &str) -> Vec<(OperationType, Option<&str>)> {
    let mut operations = Vec::new();
    let mut rest = skip_ignored(document);

    while !rest.is_empty() {
        let keyword = leading_name(rest);
        let kind = match keyword {
            "query" => Some(OperationType::Query),
            "mutation" => Some(OperationType::Mutation),
            "subscription" => Some(OperationType::Subscription),
            "" if rest.starts_with('{') => Some(OperationType::Query),
            _ => None,
        };
        if let Some(kind) = kind {
            let name = leading_name(skip_ignored(&rest[keyword.len()..]));
            operations.push((kind, (!name.is_empty()).then_some(name)));
        }
        rest = skip_ignored(skip_definition(rest));
    }

    operations
}

/// Skip whitespace, commas and `#` comments.
fn skip_ignored(mut s: &str) -> &str {
    loop {
        s = s.trim_start_matches(|c: char| c.is_whitespace() || c == ',' || c == '\u{feff}');
        if s.starts_with('#') {
            s = &s[line_len(s)..];
        } else {
            return s;
        }
    }
}

fn leading_name(s: &str) -> &str {
    let end = s
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(s.len());
    &s[..end]
}

/// Return what follows the first balanced `{ ... }` block of `s`.
fn skip_definition(s: &str) -> &str {
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'#' => i += line_len(&s[i..]),
            b'"' => i += string_len(&s[i..]),
            b'{' => {
                depth += 1;
                i += 1;
            }
            b'}' => {
                i += 1;
                if depth <= 1 {
                    return &s[i..];
                }
                depth -= 1;
            }
            _ => i += 1,
        }
    }

    ""
}

fn line_len(s: &str) -> usize {
    s.find('\n').unwrap_or(s.len())
}

/// Length of the string literal at the start of `s`, quotes included.
fn string_len(s: &str) -> usize {
    if let Some(body) = s.strip_prefix("\"\"\"") {
        return body.find("\"\"\"").map_or(s.len(), |end| end + 6);
    }

    let bytes = s.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            b'\n' => return i,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Standard introspection query for schema metadata.
pub const INTROSPECTION_QUERY: &str = r#"
    query IntrospectionQuery {
        __schema {
            queryType { name }
            mutationType { name }
            subscriptionType { name }
            types {
                ...FullType
            }
            directives {
                name
                description
                locations
                args {
                    ...InputValue
                }
            }
        }
    }

    fragment FullType on __Type {
        kind
        name
        description
        fields(includeDeprecated: true) {
            name
            description
            args {
                ...InputValue
            }
            type {
                ...TypeRef
            }
            isDeprecated
            deprecationReason
        }
        inputFields {
            ...InputValue
        }
        interfaces {
            ...TypeRef
        }
        enumValues(includeDeprecated: true) {
            name
            description
            isDeprecated
            deprecationReason
        }
        possibleTypes {
            ...TypeRef
        }
    }

    fragment InputValue on __InputValue {
        name
        description
        type {
            ...TypeRef
        }
        defaultValue
    }

    fragment TypeRef on __Type {
        kind
        name
        ofType {
            kind
            name
            ofType {
                kind
                name
                ofType {
                    kind
                    name
                    ofType {
                        kind
                        name
                        ofType {
                            kind
                            name
                            ofType {
                                kind
                                name
                                ofType {
                                    kind
                                    name
                                }
                            }
                        }
                    }
                }
            }
        }
    }
"#;

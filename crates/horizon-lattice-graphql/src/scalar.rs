//! Custom scalar coercion.
//!
//! GraphQL servers often expose scalars that JSON cannot represent natively:
//! arbitrary-precision decimals, timestamps, opaque identifiers. The client
//! does not know how to interpret them. Instead, callers implement
//! [`Coercing`] for each such scalar and register it by name in a
//! [`ScalarRegistry`]. Extraction consults the registry whenever a target
//! shape names a custom scalar.
//!
//! # Example
//!
//! ```
//! use horizon_lattice_graphql::scalar::{Coercing, CoercingError, ScalarRegistry};
//! use serde_json::{Value, json};
//!
//! struct Cents;
//!
//! impl Coercing for Cents {
//!     type Output = u64;
//!
//!     fn serialize(&self, value: &u64) -> Result<Value, CoercingError> {
//!         Ok(Value::String(value.to_string()))
//!     }
//!
//!     fn parse_value(&self, input: &Value) -> Result<u64, CoercingError> {
//!         input
//!             .as_str()
//!             .and_then(|s| s.parse().ok())
//!             .ok_or_else(|| CoercingError::new("expected a numeric string"))
//!     }
//! }
//!
//! let registry = ScalarRegistry::new().with("Cents", Cents);
//! let cents: u64 = registry.parse_value("Cents", &json!("1250")).unwrap();
//! assert_eq!(cents, 1250);
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Number, Value};

/// Error returned by a [`Coercing`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CoercingError {
    message: String,
}

impl CoercingError {
    /// Create a coercion error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors raised when using a [`ScalarRegistry`] directly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScalarError {
    /// No coercion is registered under this name.
    #[error("no coercion registered for scalar '{0}'")]
    Unknown(String),

    /// The coercion rejected the value.
    #[error("cannot coerce scalar '{scalar}': {source}")]
    Coercion {
        scalar: String,
        #[source]
        source: CoercingError,
    },

    /// The caller asked for a different type than the coercion produces.
    #[error("scalar '{scalar}' coerces to {actual}, not {requested}")]
    OutputType {
        scalar: String,
        requested: &'static str,
        actual: &'static str,
    },
}

/// A GraphQL value literal as it appears in a document.
///
/// Numeric literals keep their source text so a coercion can parse them
/// without going through a floating-point representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// `null`
    Null,
    /// An integer literal, e.g. `42`.
    Int(String),
    /// A float literal, e.g. `1.5e3`.
    Float(String),
    /// A string literal, already unescaped.
    String(String),
    /// `true` or `false`.
    Boolean(bool),
    /// An enum value, e.g. `ACTIVE`.
    Enum(String),
    /// A list literal.
    List(Vec<Literal>),
    /// An input object literal, fields in document order.
    Object(Vec<(String, Literal)>),
}

impl Literal {
    /// Convert the literal to its JSON equivalent.
    ///
    /// Enum values become strings. Numeric text that JSON cannot hold is kept
    /// as a string.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Int(text) | Self::Float(text) => text
                .parse::<Number>()
                .map(Value::Number)
                .unwrap_or_else(|_| Value::String(text.clone())),
            Self::String(s) | Self::Enum(s) => Value::String(s.clone()),
            Self::Boolean(b) => Value::Bool(*b),
            Self::List(items) => Value::Array(items.iter().map(Literal::to_json).collect()),
            Self::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }
}

/// Conversion between the wire representation of a custom scalar and an
/// application type.
///
/// Implementations must be thread-safe: a registry is shared by every clone of
/// a client and every response it produces.
pub trait Coercing: Send + Sync + 'static {
    /// The application-level type of the scalar.
    type Output: Send + Sync + 'static;

    /// Convert an application value to its wire representation.
    fn serialize(&self, value: &Self::Output) -> Result<Value, CoercingError>;

    /// Convert a wire value (from a response or a variable) to the
    /// application type.
    fn parse_value(&self, input: &Value) -> Result<Self::Output, CoercingError>;

    /// Convert a literal from a GraphQL document to the application type.
    ///
    /// Defaults to [`parse_value`](Self::parse_value) on the JSON form of the
    /// literal.
    fn parse_literal(&self, literal: &Literal) -> Result<Self::Output, CoercingError> {
        self.parse_value(&literal.to_json())
    }
}

/// A value produced by a custom scalar coercion.
pub struct CustomValue {
    scalar: String,
    type_name: &'static str,
    value: Box<dyn Any + Send + Sync>,
}

impl CustomValue {
    /// The name of the scalar that produced this value.
    pub fn scalar(&self) -> &str {
        &self.scalar
    }

    /// The Rust type name of the contained value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrow the value as `T`, if it has that type.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Take the value as `T`, returning `self` unchanged on a type mismatch.
    pub fn downcast<T: 'static>(self) -> Result<T, Self> {
        match self.value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(Self {
                scalar: self.scalar,
                type_name: self.type_name,
                value,
            }),
        }
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomValue")
            .field("scalar", &self.scalar)
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}

type AnyValue = Box<dyn Any + Send + Sync>;

/// Object-safe view of a [`Coercing`] implementation.
trait ErasedCoercing: Send + Sync {
    fn parse_value(&self, input: &Value) -> Result<AnyValue, CoercingError>;
    fn parse_literal(&self, literal: &Literal) -> Result<AnyValue, CoercingError>;
    /// Returns `None` when `value` is not of the output type.
    fn serialize(&self, value: &dyn Any) -> Option<Result<Value, CoercingError>>;
    fn output_type(&self) -> &'static str;
}

impl<C: Coercing> ErasedCoercing for C {
    fn parse_value(&self, input: &Value) -> Result<AnyValue, CoercingError> {
        Coercing::parse_value(self, input).map(|value| Box::new(value) as AnyValue)
    }

    fn parse_literal(&self, literal: &Literal) -> Result<AnyValue, CoercingError> {
        Coercing::parse_literal(self, literal).map(|value| Box::new(value) as AnyValue)
    }

    fn serialize(&self, value: &dyn Any) -> Option<Result<Value, CoercingError>> {
        value
            .downcast_ref::<C::Output>()
            .map(|value| Coercing::serialize(self, value))
    }

    fn output_type(&self) -> &'static str {
        std::any::type_name::<C::Output>()
    }
}

/// Custom scalar coercions keyed by scalar name.
#[derive(Default)]
pub struct ScalarRegistry {
    coercions: HashMap<String, Box<dyn ErasedCoercing>>,
}

impl ScalarRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a coercion, replacing any previous one with the same name.
    pub fn register<C: Coercing>(&mut self, name: impl Into<String>, coercing: C) {
        self.coercions.insert(name.into(), Box::new(coercing));
    }

    /// Register a coercion, builder style.
    pub fn with<C: Coercing>(mut self, name: impl Into<String>, coercing: C) -> Self {
        self.register(name, coercing);
        self
    }

    /// Check if a coercion is registered for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.coercions.contains_key(name)
    }

    /// Names of all registered scalars, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.coercions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered coercions.
    pub fn len(&self) -> usize {
        self.coercions.len()
    }

    /// Check if no coercion is registered.
    pub fn is_empty(&self) -> bool {
        self.coercions.is_empty()
    }

    /// Coerce a wire value with the named scalar, into its output type.
    pub fn parse_value<T: 'static>(&self, name: &str, input: &Value) -> Result<T, ScalarError> {
        let value = self.parse_value_any(name, input)?;
        downcast_output(name, value)
    }

    /// Coerce a document literal with the named scalar, into its output type.
    pub fn parse_literal<T: 'static>(
        &self,
        name: &str,
        literal: &Literal,
    ) -> Result<T, ScalarError> {
        let coercing = self.lookup(name)?;
        let value = coercing
            .parse_literal(literal)
            .map_err(|source| coercion_error(name, source))?;
        downcast_output(
            name,
            CustomValue {
                scalar: name.to_string(),
                type_name: coercing.output_type(),
                value,
            },
        )
    }

    /// Convert an application value to its wire representation.
    pub fn serialize<T: 'static>(&self, name: &str, value: &T) -> Result<Value, ScalarError> {
        let coercing = self.lookup(name)?;
        match coercing.serialize(value) {
            Some(result) => result.map_err(|source| coercion_error(name, source)),
            None => Err(ScalarError::OutputType {
                scalar: name.to_string(),
                requested: std::any::type_name::<T>(),
                actual: coercing.output_type(),
            }),
        }
    }

    /// Coerce a wire value with the named scalar without naming its type.
    pub fn parse_value_any(&self, name: &str, input: &Value) -> Result<CustomValue, ScalarError> {
        let coercing = self.lookup(name)?;
        let value = coercing
            .parse_value(input)
            .map_err(|source| coercion_error(name, source))?;
        Ok(CustomValue {
            scalar: name.to_string(),
            type_name: coercing.output_type(),
            value,
        })
    }

    fn lookup(&self, name: &str) -> Result<&dyn ErasedCoercing, ScalarError> {
        self.coercions
            .get(name)
            .map(|coercing| &**coercing)
            .ok_or_else(|| ScalarError::Unknown(name.to_string()))
    }
}

impl fmt::Debug for ScalarRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarRegistry")
            .field("scalars", &self.names())
            .finish()
    }
}

fn coercion_error(name: &str, source: CoercingError) -> ScalarError {
    ScalarError::Coercion {
        scalar: name.to_string(),
        source,
    }
}

fn downcast_output<T: 'static>(name: &str, value: CustomValue) -> Result<T, ScalarError> {
    value.downcast::<T>().map_err(|value| ScalarError::OutputType {
        scalar: name.to_string(),
        requested: std::any::type_name::<T>(),
        actual: value.type_name,
    })
}

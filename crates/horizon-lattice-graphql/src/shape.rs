//! Target shapes for extracted values.
//!
//! A [`TypeDescriptor`] tells the extractor what the caller expects to find at
//! a path. The resolved JSON is checked against the descriptor and converted
//! into a [`Projection`]: scalars become typed variants, lists are projected
//! element by element and records pick their fields by name or by sub-path.
//!
//! ```
//! use horizon_lattice_graphql::shape::{FieldBinding, TypeDescriptor};
//!
//! # fn main() -> Result<(), horizon_lattice_graphql::ExtractError> {
//! let review = TypeDescriptor::record([
//!     FieldBinding::new("id", TypeDescriptor::id()),
//!     FieldBinding::at("author", "submittedBy.email", TypeDescriptor::string())?,
//!     FieldBinding::new("score", TypeDescriptor::int().nullable()),
//! ]);
//! let reviews = TypeDescriptor::list_of(review);
//! # let _ = reviews;
//! # Ok(())
//! # }
//! ```
//!
//! For caller-defined Rust types, [`GraphQLResponse::extract`] deserializes
//! through serde instead.
//!
//! [`GraphQLResponse::extract`]: crate::GraphQLResponse::extract

use std::fmt;

use serde_json::Value;

use crate::error::ExtractError;
use crate::path::Path;
use crate::scalar::{CustomValue, ScalarError, ScalarRegistry};

/// Built-in scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// A JSON string.
    String,
    /// An integral JSON number that fits in an `i64`.
    Int,
    /// Any JSON number.
    Float,
    /// A JSON boolean.
    Boolean,
    /// A string or an integer, projected as a string.
    Id,
    /// Any JSON value, passed through unchanged.
    Json,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "String",
            Self::Int => "Int",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
            Self::Id => "ID",
            Self::Json => "JSON",
        };
        f.write_str(name)
    }
}

/// Description of the value a caller expects at a path.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    /// A built-in scalar.
    Scalar(ScalarKind),
    /// A custom scalar, resolved through the [`ScalarRegistry`].
    Custom(String),
    /// A list whose elements all have the inner shape.
    List(Box<TypeDescriptor>),
    /// An object projected into named fields.
    Record(Vec<FieldBinding>),
    /// The inner shape, or `null`.
    Nullable(Box<TypeDescriptor>),
}

impl TypeDescriptor {
    /// A `String` scalar.
    pub fn string() -> Self {
        Self::Scalar(ScalarKind::String)
    }

    /// An `Int` scalar.
    pub fn int() -> Self {
        Self::Scalar(ScalarKind::Int)
    }

    /// A `Float` scalar.
    pub fn float() -> Self {
        Self::Scalar(ScalarKind::Float)
    }

    /// A `Boolean` scalar.
    pub fn boolean() -> Self {
        Self::Scalar(ScalarKind::Boolean)
    }

    /// An `ID` scalar.
    pub fn id() -> Self {
        Self::Scalar(ScalarKind::Id)
    }

    /// Any JSON value.
    pub fn json() -> Self {
        Self::Scalar(ScalarKind::Json)
    }

    /// A custom scalar registered under `name`.
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom(name.into())
    }

    /// A list of `inner`.
    pub fn list_of(inner: TypeDescriptor) -> Self {
        Self::List(Box::new(inner))
    }

    /// A record with the given field bindings.
    pub fn record(fields: impl IntoIterator<Item = FieldBinding>) -> Self {
        Self::Record(fields.into_iter().collect())
    }

    /// Allow `null` in place of this shape.
    pub fn nullable(self) -> Self {
        match self {
            Self::Nullable(_) => self,
            other => Self::Nullable(Box::new(other)),
        }
    }

    /// Check if this shape accepts `null`.
    pub fn is_nullable(&self) -> bool {
        matches!(self, Self::Nullable(_) | Self::Scalar(ScalarKind::Json))
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{kind}"),
            Self::Custom(name) => f.write_str(name),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::Record(fields) => {
                f.write_str("{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.shape)?;
                }
                f.write_str("}")
            }
            Self::Nullable(inner) => write!(f, "{inner}?"),
        }
    }
}

/// One field of a record shape.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldBinding {
    name: String,
    path: Path,
    shape: TypeDescriptor,
}

impl FieldBinding {
    /// Bind the field `name` of the source object.
    pub fn new(name: impl Into<String>, shape: TypeDescriptor) -> Self {
        let name = name.into();
        Self {
            path: Path::field(name.clone()),
            name,
            shape,
        }
    }

    /// Bind `name` to the value at `path`, relative to the source object.
    pub fn at(
        name: impl Into<String>,
        path: &str,
        shape: TypeDescriptor,
    ) -> Result<Self, ExtractError> {
        Ok(Self {
            name: name.into(),
            path: Path::parse(path)?,
            shape,
        })
    }

    /// The name of the field in the projected record.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The path of the source value, relative to the record.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The expected shape of the field.
    pub fn shape(&self) -> &TypeDescriptor {
        &self.shape
    }
}

/// A value projected into a [`TypeDescriptor`].
#[derive(Debug)]
pub enum Projection {
    /// `null`, only produced for nullable shapes.
    Null,
    /// A `String` or `ID`.
    String(String),
    /// An `Int`.
    Int(i64),
    /// A `Float`.
    Float(f64),
    /// A `Boolean`.
    Boolean(bool),
    /// A raw JSON value.
    Json(Value),
    /// The output of a custom scalar coercion.
    Custom(CustomValue),
    /// A list of projections.
    List(Vec<Projection>),
    /// Record fields in declaration order.
    Record(Vec<(String, Projection)>),
}

impl Projection {
    /// Check if this is `null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the numeric value. Integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Get the boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the raw JSON value.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Get the list elements.
    pub fn as_list(&self) -> Option<&[Projection]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get a record field by name.
    pub fn field(&self, name: &str) -> Option<&Projection> {
        match self {
            Self::Record(fields) => fields
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Borrow a custom scalar value as `T`.
    pub fn custom<T: 'static>(&self) -> Option<&T> {
        match self {
            Self::Custom(value) => value.downcast_ref(),
            _ => None,
        }
    }

    /// Take a custom scalar value as `T`.
    pub fn into_custom<T: 'static>(self) -> Option<T> {
        match self {
            Self::Custom(value) => value.downcast().ok(),
            _ => None,
        }
    }

    /// Collect list elements into strings.
    ///
    /// Returns `None` if this is not a list or an element is not a string.
    pub fn into_strings(self) -> Option<Vec<String>> {
        match self {
            Self::List(items) => items
                .into_iter()
                .map(|item| match item {
                    Self::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }
}

/// Project `value` into `shape`.
///
/// `trail` is the location of `value` inside the response data and is used in
/// error reports.
pub(crate) fn project(
    value: &Value,
    shape: &TypeDescriptor,
    scalars: &ScalarRegistry,
    trail: &str,
) -> Result<Projection, ExtractError> {
    let mismatch = |message: String| ExtractError::type_mismatch(trail, shape.to_string(), message);

    match shape {
        TypeDescriptor::Nullable(inner) => {
            if value.is_null() {
                Ok(Projection::Null)
            } else {
                project(value, inner, scalars, trail)
            }
        }
        TypeDescriptor::Scalar(ScalarKind::Json) => Ok(Projection::Json(value.clone())),
        _ if value.is_null() => Err(mismatch("found null".into())),
        TypeDescriptor::Scalar(kind) => project_scalar(value, *kind).ok_or_else(|| {
            mismatch(format!("found {}", json_kind(value)))
        }),
        TypeDescriptor::Custom(name) => match scalars.parse_value_any(name, value) {
            Ok(custom) => Ok(Projection::Custom(custom)),
            Err(ScalarError::Unknown(scalar)) => Err(ExtractError::UnknownScalar {
                at: trail.to_string(),
                scalar,
            }),
            Err(err) => Err(mismatch(err.to_string())),
        },
        TypeDescriptor::List(inner) => {
            let items = value
                .as_array()
                .ok_or_else(|| mismatch(format!("found {}", json_kind(value))))?;
            items
                .iter()
                .enumerate()
                .map(|(index, item)| project(item, inner, scalars, &format!("{trail}[{index}]")))
                .collect::<Result<Vec<_>, _>>()
                .map(Projection::List)
        }
        TypeDescriptor::Record(fields) => {
            if !value.is_object() {
                return Err(mismatch(format!("found {}", json_kind(value))));
            }
            fields
                .iter()
                .map(|field| {
                    let source = field.path.resolve_within(value, trail)?;
                    let at = join_trail(trail, field.path.as_str());
                    project(&source, &field.shape, scalars, &at)
                        .map(|projected| (field.name.clone(), projected))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Projection::Record)
        }
    }
}

fn project_scalar(value: &Value, kind: ScalarKind) -> Option<Projection> {
    match kind {
        ScalarKind::String => value.as_str().map(|s| Projection::String(s.to_string())),
        ScalarKind::Int => value.as_i64().map(Projection::Int),
        ScalarKind::Float => value.as_f64().map(Projection::Float),
        ScalarKind::Boolean => value.as_bool().map(Projection::Boolean),
        ScalarKind::Id => match value {
            Value::String(s) => Some(Projection::String(s.clone())),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(Projection::String(n.to_string())),
            _ => None,
        },
        ScalarKind::Json => Some(Projection::Json(value.clone())),
    }
}

fn join_trail(trail: &str, path: &str) -> String {
    if trail.is_empty() {
        path.to_string()
    } else if path.is_empty() || path.starts_with('[') {
        format!("{trail}{path}")
    } else {
        format!("{trail}.{path}")
    }
}

/// Name of the JSON kind of `value`, for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

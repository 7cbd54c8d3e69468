//! Path expressions over GraphQL response data.
//!
//! A path addresses a value inside the `data` object of a response:
//!
//! - `user.name` - dotted field access
//! - `user.posts[0].title` - array index
//! - `user.posts[*].title` - wildcard, collects one value per array element
//!
//! Several brackets may follow one field (`matrix[0][1]`). The empty path
//! addresses the whole tree.
//!
//! # Example
//!
//! ```
//! use horizon_lattice_graphql::Path;
//! use serde_json::json;
//!
//! let data = json!({"posts": [{"title": "a"}, {"title": "b"}]});
//! let path: Path = "posts[*].title".parse().unwrap();
//!
//! assert_eq!(*path.resolve(&data).unwrap(), json!(["a", "b"]));
//! ```

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::ExtractError;

/// A single navigation step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    /// Select an object field by name.
    Field(String),
    /// Select an array element by position.
    Index(usize),
    /// Fan out over every array element.
    Wildcard,
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    source: String,
    steps: Vec<PathStep>,
}

impl Path {
    /// Parse a path expression.
    pub fn parse(path: &str) -> Result<Self, ExtractError> {
        Ok(Self {
            source: path.to_string(),
            steps: parse_steps(path)?,
        })
    }

    /// The path addressing the root value.
    pub fn root() -> Self {
        Self {
            source: String::new(),
            steps: Vec::new(),
        }
    }

    /// A path selecting a single field.
    ///
    /// The name is taken verbatim, without any parsing.
    pub fn field(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            steps: vec![PathStep::Field(name.clone())],
            source: name,
        }
    }

    /// The steps of this path, in evaluation order.
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// The expression this path was parsed from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Check if this path addresses the root value.
    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    /// Check if this path contains a wildcard step.
    pub fn has_wildcard(&self) -> bool {
        self.steps.contains(&PathStep::Wildcard)
    }

    /// Evaluate the path against a JSON tree.
    ///
    /// Paths without wildcards borrow the addressed subtree. A wildcard
    /// produces a new array holding one result per element of the source
    /// array, in source order; nested wildcards produce nested arrays.
    pub fn resolve<'a>(&self, root: &'a Value) -> Result<Cow<'a, Value>, ExtractError> {
        self.walk(root, 0, String::new())
    }

    /// Evaluate the path against a subtree located at `trail`.
    ///
    /// Errors report locations prefixed with `trail`.
    pub(crate) fn resolve_within<'a>(
        &self,
        root: &'a Value,
        trail: &str,
    ) -> Result<Cow<'a, Value>, ExtractError> {
        self.walk(root, 0, trail.to_string())
    }

    fn walk<'a>(
        &self,
        value: &'a Value,
        start: usize,
        mut trail: String,
    ) -> Result<Cow<'a, Value>, ExtractError> {
        let mut current = value;

        for (position, step) in self.steps.iter().enumerate().skip(start) {
            match step {
                PathStep::Field(name) => {
                    push_field(&mut trail, name);
                    current = match current.get(name.as_str()) {
                        Some(next) => next,
                        None => return Err(self.not_found(trail)),
                    };
                }
                PathStep::Index(index) => {
                    trail.push_str(&format!("[{index}]"));
                    current = match current.as_array().and_then(|items| items.get(*index)) {
                        Some(next) => next,
                        None => return Err(self.not_found(trail)),
                    };
                }
                PathStep::Wildcard => {
                    let Some(items) = current.as_array() else {
                        trail.push_str("[*]");
                        return Err(self.not_found(trail));
                    };

                    let projected = items
                        .iter()
                        .enumerate()
                        .map(|(index, item)| {
                            self.walk(item, position + 1, format!("{trail}[{index}]"))
                                .map(Cow::into_owned)
                        })
                        .collect::<Result<Vec<_>, _>>()?;

                    return Ok(Cow::Owned(Value::Array(projected)));
                }
            }
        }

        Ok(Cow::Borrowed(current))
    }

    fn not_found(&self, at: String) -> ExtractError {
        ExtractError::FieldNotFound {
            path: self.source.clone(),
            at,
        }
    }
}

impl FromStr for Path {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Path {
    type Error = ExtractError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn push_field(trail: &mut String, name: &str) {
    if !trail.is_empty() {
        trail.push('.');
    }
    trail.push_str(name);
}

fn parse_steps(path: &str) -> Result<Vec<PathStep>, ExtractError> {
    let invalid = |offset: usize, message: String| ExtractError::invalid_path(path, offset, message);

    let bytes = path.as_bytes();
    let mut steps = Vec::new();
    let mut pos = 0;
    // True at the start of the path and right after a '.'.
    let mut expect_field = true;

    while pos < bytes.len() {
        match bytes[pos] {
            b'.' => {
                if expect_field {
                    return Err(invalid(pos, "empty field name".into()));
                }
                expect_field = true;
                pos += 1;
            }
            b'[' => {
                if expect_field && pos != 0 {
                    return Err(invalid(pos, "expected a field name before '['".into()));
                }
                let close = path[pos + 1..]
                    .find(']')
                    .map(|i| pos + 1 + i)
                    .ok_or_else(|| invalid(pos, "unterminated '['".into()))?;
                let inner = &path[pos + 1..close];

                let step = if inner == "*" {
                    PathStep::Wildcard
                } else if !inner.is_empty() && inner.bytes().all(|b| b.is_ascii_digit()) {
                    let index = inner
                        .parse()
                        .map_err(|_| invalid(pos + 1, format!("index '{inner}' is too large")))?;
                    PathStep::Index(index)
                } else {
                    return Err(invalid(
                        pos + 1,
                        format!("expected an index or '*', found '{inner}'"),
                    ));
                };

                steps.push(step);
                expect_field = false;
                pos = close + 1;
            }
            b']' => return Err(invalid(pos, "unexpected ']'".into())),
            b if b.is_ascii_whitespace() => {
                return Err(invalid(pos, "unexpected whitespace".into()));
            }
            _ => {
                if !expect_field {
                    return Err(invalid(pos, "expected '.' or '['".into()));
                }
                let end = path[pos..]
                    .find(|c: char| matches!(c, '.' | '[' | ']') || c.is_whitespace())
                    .map_or(path.len(), |i| pos + i);

                steps.push(PathStep::Field(path[pos..end].to_string()));
                expect_field = false;
                pos = end;
            }
        }
    }

    if expect_field && !path.is_empty() {
        return Err(invalid(path.len(), "path ends with '.'".into()));
    }

    Ok(steps)
}

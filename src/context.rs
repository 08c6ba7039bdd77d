//! Evaluation contexts.
//!
//! Every predicate and resolution receives the caller's context by
//! reference. The engine is generic over the context type; the only
//! capability it ever asks for is named attribute lookup, through
//! [`Attributes`], and only for the built-in attribute predicates.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, PolicyResult};
use crate::value::Value;

/// Named attribute access over a caller-defined context.
pub trait Attributes {
    /// Returns the attribute called `name`, if present.
    fn attribute(&self, name: &str) -> Option<&Value>;
}

impl Attributes for BTreeMap<String, Value> {
    fn attribute(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

impl<S: std::hash::BuildHasher> Attributes for HashMap<String, Value, S> {
    fn attribute(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

/// A ready-made attribute map describing subject, action and environment.
///
/// # Example
/// ```
/// use verdict::{Attributes, Context, Value};
///
/// let ctx = Context::new().with("role", "admin").with("level", 3);
/// assert_eq!(ctx.attribute("role"), Some(&Value::from("admin")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(BTreeMap<String, Value>);

impl Context {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this context with `name` set to `value`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Sets `name` to `value`, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    /// Builds a context from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::InvalidContext` for anything other than an object.
    pub fn from_json(document: serde_json::Value) -> PolicyResult<Self> {
        match document {
            serde_json::Value::Object(fields) => Ok(Self(
                fields
                    .into_iter()
                    .map(|(name, value)| (name, Value::from(value)))
                    .collect(),
            )),
            other => Err(PolicyError::invalid_context(format!(
                "expected a JSON object, found {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Parses a context from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::InvalidContext` if `text` is not valid JSON or
    /// is not an object.
    pub fn from_json_str(text: &str) -> PolicyResult<Self> {
        let document: serde_json::Value =
            serde_json::from_str(text).map_err(|e| PolicyError::invalid_context(e.to_string()))?;
        Self::from_json(document)
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no attribute is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Attributes for Context {
    fn attribute(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl TryFrom<serde_json::Value> for Context {
    type Error = PolicyError;

    fn try_from(document: serde_json::Value) -> PolicyResult<Self> {
        Self::from_json(document)
    }
}

const fn json_type_name(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

//! Decisions and the result records attached to them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// The four authorization outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecisionKind {
    /// Access is granted.
    Permit,
    /// Access is refused.
    Deny,
    /// No policy spoke to this request.
    NotApplicable,
    /// A policy matched but could not reach an outcome.
    Indeterminate,
}

impl DecisionKind {
    /// All four kinds, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Permit,
        Self::Deny,
        Self::NotApplicable,
        Self::Indeterminate,
    ];

    /// Returns a short stable identifier suitable for logging.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Permit => "permit",
            Self::Deny => "deny",
            Self::NotApplicable => "not_applicable",
            Self::Indeterminate => "indeterminate",
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permit => write!(f, "Permit"),
            Self::Deny => write!(f, "Deny"),
            Self::NotApplicable => write!(f, "NotApplicable"),
            Self::Indeterminate => write!(f, "Indeterminate"),
        }
    }
}

/// Fields written by resolutions while a decision is being finalized.
///
/// Keys are kept in name order so serialized decisions are stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultRecord(BTreeMap<String, Value>);

impl ResultRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    /// Returns the value stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Removes `name`, returning its value if it was set.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    /// Returns true if `name` is set.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of fields set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Outcome of evaluating a policy against one context.
///
/// The kind is fixed when the decision is produced and cannot be changed
/// afterwards; only the accumulated result is handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    kind: DecisionKind,
    #[serde(default)]
    result: ResultRecord,
}

impl Decision {
    pub(crate) const fn new(kind: DecisionKind, result: ResultRecord) -> Self {
        Self { kind, result }
    }

    /// A bare `NotApplicable` decision with an empty record.
    #[must_use]
    pub fn not_applicable() -> Self {
        Self::new(DecisionKind::NotApplicable, ResultRecord::new())
    }

    /// A bare `Indeterminate` decision with an empty record.
    #[must_use]
    pub fn indeterminate() -> Self {
        Self::new(DecisionKind::Indeterminate, ResultRecord::new())
    }

    /// The decision kind.
    #[must_use]
    pub const fn kind(&self) -> DecisionKind {
        self.kind
    }

    /// The record written by resolutions.
    #[must_use]
    pub const fn result(&self) -> &ResultRecord {
        &self.result
    }

    /// Consumes the decision, keeping only its result record.
    #[must_use]
    pub fn into_result(self) -> ResultRecord {
        self.result
    }

    /// Returns true for a Permit.
    #[must_use]
    pub const fn is_permit(&self) -> bool {
        matches!(self.kind, DecisionKind::Permit)
    }

    /// Returns true for a Deny.
    #[must_use]
    pub const fn is_deny(&self) -> bool {
        matches!(self.kind, DecisionKind::Deny)
    }

    /// Returns true for NotApplicable.
    #[must_use]
    pub const fn is_not_applicable(&self) -> bool {
        matches!(self.kind, DecisionKind::NotApplicable)
    }

    /// Returns true for Indeterminate.
    #[must_use]
    pub const fn is_indeterminate(&self) -> bool {
        matches!(self.kind, DecisionKind::Indeterminate)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.result.is_empty() {
            write!(f, " {{")?;
            for (i, (name, value)) in self.result.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, " {name}: {value}")?;
            }
            write!(f, " }}")?;
        }
        Ok(())
    }
}

/// Returns true if `decision` is a Permit.
#[must_use]
pub const fn is_permit(decision: &Decision) -> bool {
    decision.is_permit()
}

/// Returns true if `decision` is a Deny.
#[must_use]
pub const fn is_deny(decision: &Decision) -> bool {
    decision.is_deny()
}

/// Returns true if `decision` is NotApplicable.
#[must_use]
pub const fn is_not_applicable(decision: &Decision) -> bool {
    decision.is_not_applicable()
}

/// Returns true if `decision` is Indeterminate.
#[must_use]
pub const fn is_indeterminate(decision: &Decision) -> bool {
    decision.is_indeterminate()
}

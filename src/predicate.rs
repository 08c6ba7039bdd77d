//! Composable boolean predicates over an evaluation context.
//!
//! A [`Predicate`] wraps a pure `&C -> bool` function behind an `Arc`, so
//! cloning is cheap and combinators never touch their operands: `and`,
//! `or` and `not` each return a fresh predicate that holds shared
//! references to the originals. Combined predicates evaluate left to
//! right and short-circuit.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};
use std::sync::Arc;

use regex::Regex;

use crate::context::Attributes;
use crate::error::{PolicyError, PolicyResult};
use crate::value::Value;

type PredicateFn<C> = dyn Fn(&C) -> bool + Send + Sync;

/// An immutable `&C -> bool` test.
///
/// # Example
/// ```
/// use verdict::{always_false, always_true};
///
/// let p = always_true::<()>().and(always_false().or(always_true()));
/// assert!(p.evaluate(&()));
/// assert!(!p.not().evaluate(&()));
/// ```
pub struct Predicate<C> {
    eval: Arc<PredicateFn<C>>,
}

impl<C: 'static> Predicate<C> {
    /// Wraps a plain function as a predicate.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        Self { eval: Arc::new(f) }
    }

    /// Tests the predicate against `ctx`.
    pub fn evaluate(&self, ctx: &C) -> bool {
        (self.eval)(ctx)
    }

    /// Logical conjunction. `other` is only evaluated when `self` holds.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        let (lhs, rhs) = (self.eval, other.eval);
        Self::new(move |ctx| lhs(ctx) && rhs(ctx))
    }

    /// Logical disjunction. `other` is only evaluated when `self` fails.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        let (lhs, rhs) = (self.eval, other.eval);
        Self::new(move |ctx| lhs(ctx) || rhs(ctx))
    }

    /// Logical negation.
    #[must_use]
    pub fn not(self) -> Self {
        let inner = self.eval;
        Self::new(move |ctx| !inner(ctx))
    }
}

impl<C> Clone for Predicate<C> {
    fn clone(&self) -> Self {
        Self {
            eval: Arc::clone(&self.eval),
        }
    }
}

impl<C> fmt::Debug for Predicate<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate").finish_non_exhaustive()
    }
}

impl<C: 'static> Not for Predicate<C> {
    type Output = Self;

    fn not(self) -> Self {
        Predicate::not(self)
    }
}

impl<C: 'static> BitAnd for Predicate<C> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.and(rhs)
    }
}

impl<C: 'static> BitOr for Predicate<C> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.or(rhs)
    }
}

/// Lifts a user factory into a constructor of combinable predicates.
///
/// The factory is called once per constructed predicate, mirroring how the
/// built-in constructors such as [`always_true`] behave.
///
/// # Example
/// ```
/// use verdict::predicate;
///
/// let is_one = predicate(|| |ctx: &i32| *ctx == 1);
/// let p = is_one().and(is_one().or(is_one()));
/// assert!(p.evaluate(&1));
/// assert!(!p.evaluate(&2));
/// ```
pub fn predicate<C, F, P>(factory: F) -> impl Fn() -> Predicate<C>
where
    C: 'static,
    F: Fn() -> P,
    P: Fn(&C) -> bool + Send + Sync + 'static,
{
    move || Predicate::new(factory())
}

/// A predicate that always holds.
#[must_use]
pub fn always_true<C: 'static>() -> Predicate<C> {
    Predicate::new(|_| true)
}

/// A predicate that never holds. Also the default policy target.
#[must_use]
pub fn always_false<C: 'static>() -> Predicate<C> {
    Predicate::new(|_| false)
}

/// Negates `p`.
#[must_use]
pub fn not<C: 'static>(p: Predicate<C>) -> Predicate<C> {
    p.not()
}

/// Holds when attribute `field` is present and strictly equal to `literal`.
pub fn property_equals<C>(field: impl Into<String>, literal: impl Into<Value>) -> Predicate<C>
where
    C: Attributes + 'static,
{
    let field = field.into();
    let literal = literal.into();
    Predicate::new(move |ctx: &C| ctx.attribute(&field) == Some(&literal))
}

/// Holds when attribute `field` is present, whatever its value.
pub fn property_present<C>(field: impl Into<String>) -> Predicate<C>
where
    C: Attributes + 'static,
{
    let field = field.into();
    Predicate::new(move |ctx: &C| ctx.attribute(&field).is_some())
}

/// Holds when attribute `field` strictly equals one of `literals`.
pub fn property_in<C, I, V>(field: impl Into<String>, literals: I) -> Predicate<C>
where
    C: Attributes + 'static,
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let field = field.into();
    let literals: Vec<Value> = literals.into_iter().map(Into::into).collect();
    Predicate::new(move |ctx: &C| {
        ctx.attribute(&field)
            .is_some_and(|value| literals.contains(value))
    })
}

/// Holds when attribute `field` is a string matching `pattern`.
///
/// Non-string attributes never match.
///
/// # Errors
///
/// Returns `PolicyError::InvalidPattern` if `pattern` is not a valid
/// regular expression.
pub fn property_matches<C>(field: impl Into<String>, pattern: &str) -> PolicyResult<Predicate<C>>
where
    C: Attributes + 'static,
{
    let regex = Regex::new(pattern).map_err(|e| PolicyError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;
    let field = field.into();
    Ok(Predicate::new(move |ctx: &C| {
        ctx.attribute(&field)
            .and_then(Value::as_string)
            .is_some_and(|s| regex.is_match(s))
    }))
}

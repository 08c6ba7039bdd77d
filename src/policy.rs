//! Policies: a target predicate guarding a then/otherwise branch.
//!
//! ```
//! use verdict::{deny, permit, property_equals, when, Context};
//!
//! let policy = when(property_equals("role", "admin"))
//!     .then(permit())
//!     .otherwise(deny());
//!
//! assert!(policy.evaluate(&Context::new().with("role", "admin")).is_permit());
//! assert!(policy.evaluate(&Context::new().with("role", "guest")).is_deny());
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::combining::Combination;
use crate::decision::Decision;
use crate::predicate::{always_false, Predicate};
use crate::resolution::Terminal;

/// What a policy does once its target has been tested.
pub enum Branch<C> {
    /// Finalize a decision through a resolution chain.
    Terminal(Terminal<C>),
    /// Delegate to another policy with the same context.
    Nested(Arc<Policy<C>>),
    /// Delegate to a combining algorithm over several policies.
    Combined(Combination<C>),
}

impl<C: 'static> Branch<C> {
    /// Evaluates the branch against `ctx`.
    pub fn evaluate(&self, ctx: &C) -> Decision {
        match self {
            Self::Terminal(terminal) => terminal.evaluate(ctx),
            Self::Nested(policy) => policy.evaluate(ctx),
            Self::Combined(combination) => combination.evaluate(ctx),
        }
    }
}

impl<C> Clone for Branch<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Terminal(t) => Self::Terminal(t.clone()),
            Self::Nested(p) => Self::Nested(Arc::clone(p)),
            Self::Combined(c) => Self::Combined(c.clone()),
        }
    }
}

impl<C> fmt::Debug for Branch<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminal(t) => f.debug_tuple("Terminal").field(t).finish(),
            Self::Nested(p) => f.debug_tuple("Nested").field(p).finish(),
            Self::Combined(c) => f.debug_tuple("Combined").field(c).finish(),
        }
    }
}

impl<C> From<Terminal<C>> for Branch<C> {
    fn from(terminal: Terminal<C>) -> Self {
        Self::Terminal(terminal)
    }
}

impl<C> From<Policy<C>> for Branch<C> {
    fn from(policy: Policy<C>) -> Self {
        Self::Nested(Arc::new(policy))
    }
}

impl<C> From<Terminal<C>> for Option<Branch<C>> {
    fn from(terminal: Terminal<C>) -> Self {
        Some(Branch::from(terminal))
    }
}

impl<C> From<Policy<C>> for Option<Branch<C>> {
    fn from(policy: Policy<C>) -> Self {
        Some(Branch::from(policy))
    }
}

/// A target predicate with optional then/otherwise branches.
///
/// Policies are immutable once built; [`otherwise`](Self::otherwise)
/// returns a new policy. Cloning is cheap.
pub struct Policy<C> {
    target: Predicate<C>,
    then_branch: Option<Branch<C>>,
    otherwise_branch: Option<Branch<C>>,
}

impl<C: 'static> Policy<C> {
    pub(crate) fn new(
        target: Predicate<C>,
        then_branch: Option<Branch<C>>,
        otherwise_branch: Option<Branch<C>>,
    ) -> Self {
        Self {
            target,
            then_branch,
            otherwise_branch,
        }
    }

    /// Sets the branch taken when the target does not hold.
    ///
    /// Passing `None` leaves the branch absent, which yields NotApplicable.
    #[must_use]
    pub fn otherwise(self, branch: impl Into<Option<Branch<C>>>) -> Self {
        Self {
            otherwise_branch: branch.into(),
            ..self
        }
    }

    /// Evaluates the policy against `ctx`.
    ///
    /// - target holds, then-branch absent: Indeterminate
    /// - target fails, otherwise-branch absent: NotApplicable
    pub fn evaluate(&self, ctx: &C) -> Decision {
        if self.target.evaluate(ctx) {
            match &self.then_branch {
                Some(branch) => branch.evaluate(ctx),
                None => {
                    trace!("target matched without a then-branch");
                    Decision::indeterminate()
                }
            }
        } else {
            match &self.otherwise_branch {
                Some(branch) => branch.evaluate(ctx),
                None => {
                    trace!("target missed without an otherwise-branch");
                    Decision::not_applicable()
                }
            }
        }
    }

    /// Turns the policy into a plain function of the context.
    pub fn into_fn(self) -> impl Fn(&C) -> Decision + Send + Sync {
        move |ctx: &C| self.evaluate(ctx)
    }

    /// Returns true if a then-branch was supplied.
    #[must_use]
    pub const fn has_then(&self) -> bool {
        self.then_branch.is_some()
    }

    /// Returns true if an otherwise-branch was supplied.
    #[must_use]
    pub const fn has_otherwise(&self) -> bool {
        self.otherwise_branch.is_some()
    }
}

impl<C> Clone for Policy<C> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            then_branch: self.then_branch.clone(),
            otherwise_branch: self.otherwise_branch.clone(),
        }
    }
}

impl<C> fmt::Debug for Policy<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Policy")
            .field("then", &self.then_branch)
            .field("otherwise", &self.otherwise_branch)
            .finish_non_exhaustive()
    }
}

/// First stage of the policy builder: a target awaiting its then-branch.
pub struct When<C> {
    target: Predicate<C>,
}

/// Starts a policy guarded by `target`.
///
/// `when(None)` uses the default target, which never holds.
pub fn when<C: 'static>(target: impl Into<Option<Predicate<C>>>) -> When<C> {
    When {
        target: target.into().unwrap_or_else(always_false),
    }
}

impl<C: 'static> When<C> {
    /// Tests the target alone against `ctx`.
    ///
    /// The default target never holds, so `when(None)` evaluates to false
    /// for every context.
    pub fn evaluate(&self, ctx: &C) -> bool {
        self.target.evaluate(ctx)
    }

    /// Sets the branch taken when the target holds.
    ///
    /// Passing `None` leaves the branch absent, which yields Indeterminate.
    #[must_use]
    pub fn then(self, branch: impl Into<Option<Branch<C>>>) -> Policy<C> {
        Policy::new(self.target, branch.into(), None)
    }
}

impl<C> fmt::Debug for When<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("When").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::decision::DecisionKind;
    use crate::predicate::{always_true, property_equals};
    use crate::resolution::{deny, permit};

    #[test]
    fn test_when_stage_tests_target() {
        assert!(!when::<()>(None).evaluate(&()));
        assert!(when(always_true::<()>()).evaluate(&()));

        let admins = when(property_equals("role", "admin"));
        assert!(admins.evaluate(&Context::new().with("role", "admin")));
        assert!(!admins.evaluate(&Context::new()));
    }

    #[test]
    fn test_then_resolves_on_true_target() {
        let policy = when(always_true::<()>()).then(permit()).otherwise(deny());
        assert!(policy.evaluate(&()).is_permit());
    }

    #[test]
    fn test_default_target_takes_otherwise() {
        let policy = when(None).then(permit()).otherwise(deny());
        assert!(policy.evaluate(&()).is_deny());
    }

    #[test]
    fn test_default_target_denies_any_context() {
        let policy = when(None).then(permit()).otherwise(deny());
        for ctx in [Context::new(), Context::new().with("role", "admin")] {
            assert_eq!(policy.evaluate(&ctx).kind(), DecisionKind::Deny);
        }
    }

    #[test]
    fn test_missing_otherwise_is_not_applicable() {
        let policy = when(always_false::<()>()).then(permit());
        assert!(policy.evaluate(&()).is_not_applicable());
    }

    #[test]
    fn test_missing_then_is_indeterminate() {
        let then_only = when(always_true::<()>()).then(None);
        let both_absent = when(always_true::<()>()).then(None).otherwise(None);
        assert!(then_only.evaluate(&()).is_indeterminate());
        assert!(both_absent.evaluate(&()).is_indeterminate());
    }

    #[test]
    fn test_empty_policy_with_default_target_is_not_applicable() {
        let policy = when::<()>(None).then(None);
        assert!(policy.evaluate(&()).is_not_applicable());
        assert!(!policy.has_then());
        assert!(!policy.has_otherwise());
    }

    #[test]
    fn test_nested_policy_branch() {
        let inner = when(property_equals("mfa", true)).then(permit()).otherwise(deny());
        let outer = when(property_equals("role", "admin"))
            .then(inner)
            .otherwise(None);

        let admin_mfa = Context::new().with("role", "admin").with("mfa", true);
        let admin_no_mfa = Context::new().with("role", "admin").with("mfa", false);
        let guest = Context::new().with("role", "guest");

        assert!(outer.evaluate(&admin_mfa).is_permit());
        assert!(outer.evaluate(&admin_no_mfa).is_deny());
        assert!(outer.evaluate(&guest).is_not_applicable());
    }

    #[test]
    fn test_otherwise_returns_new_policy() {
        let base = when(always_false::<()>()).then(permit());
        let with_deny = base.clone().otherwise(deny());
        assert!(base.evaluate(&()).is_not_applicable());
        assert!(with_deny.evaluate(&()).is_deny());
    }

    #[test]
    fn test_policy_as_function() {
        let f = when(property_equals("n", 1)).then(permit()).otherwise(deny()).into_fn();
        assert!(f(&Context::new().with("n", 1)).is_permit());
        assert!(f(&Context::new().with("n", 2)).is_deny());
    }
}

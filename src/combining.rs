//! Combining algorithms.
//!
//! A combining algorithm evaluates an ordered list of policies left to
//! right and reduces their decisions to one. The result is itself a
//! [`Policy`], so combined policies nest to any depth.
//!
//! The overrides algorithms pick the highest-ranked sub-decision under a
//! fixed total order:
//!
//! | algorithm          | lowest → highest                                   |
//! |--------------------|----------------------------------------------------|
//! | `permit_overrides` | NotApplicable, Indeterminate, Deny, Permit          |
//! | `deny_overrides`   | NotApplicable, Indeterminate, Permit, Deny          |
//!
//! Taking a maximum is associative, commutative and idempotent, so nesting
//! a combined policy inside another gives the same kind as flattening the
//! two lists. Evaluation stops at the first sub-decision of the top rank.
//! Ties keep the earliest sub-decision, including its result record.
//!
//! Indeterminate only needs to outrank NotApplicable, so a list holding
//! nothing but Indeterminate sub-decisions stays Indeterminate; NotApplicable
//! is reserved for lists where no sub-policy applied at all.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::decision::{Decision, DecisionKind};
use crate::policy::{Branch, Policy};
use crate::predicate::always_true;

/// The supported combining algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombiningAlgorithm {
    /// A Permit anywhere wins.
    PermitOverrides,
    /// A Deny anywhere wins.
    DenyOverrides,
    /// The first sub-decision that is not NotApplicable wins.
    FirstApplicable,
}

impl CombiningAlgorithm {
    /// Returns a short stable identifier suitable for logging.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PermitOverrides => "permit_overrides",
            Self::DenyOverrides => "deny_overrides",
            Self::FirstApplicable => "first_applicable",
        }
    }

    /// Decision kinds from lowest to highest precedence, for the
    /// algorithms that reduce by precedence.
    #[must_use]
    pub const fn precedence(self) -> Option<[DecisionKind; 4]> {
        use DecisionKind::{Deny, Indeterminate, NotApplicable, Permit};
        match self {
            Self::PermitOverrides => Some([NotApplicable, Indeterminate, Deny, Permit]),
            Self::DenyOverrides => Some([NotApplicable, Indeterminate, Permit, Deny]),
            Self::FirstApplicable => None,
        }
    }

    /// Reduces `decisions` to a single decision.
    ///
    /// The iterator is consumed lazily and dropped as soon as the outcome
    /// is settled. An empty input yields NotApplicable.
    pub fn combine<I>(self, decisions: I) -> Decision
    where
        I: IntoIterator<Item = Decision>,
    {
        let Some(order) = self.precedence() else {
            return decisions
                .into_iter()
                .find(|d| !d.is_not_applicable())
                .unwrap_or_else(Decision::not_applicable);
        };

        let rank = |kind: DecisionKind| order.iter().position(|k| *k == kind).unwrap_or(0);
        let top = order[order.len() - 1];

        let mut best: Option<Decision> = None;
        for decision in decisions {
            if decision.kind() == top {
                return decision;
            }
            let replace = match &best {
                Some(current) => rank(decision.kind()) > rank(current.kind()),
                None => true,
            };
            if replace {
                best = Some(decision);
            }
        }
        best.unwrap_or_else(Decision::not_applicable)
    }

    /// Builds a policy that combines `policies` with this algorithm.
    pub fn policy<C, I>(self, policies: I) -> Policy<C>
    where
        C: 'static,
        I: IntoIterator<Item = Policy<C>>,
    {
        let combination = Combination {
            algorithm: self,
            policies: policies.into_iter().collect(),
        };
        Policy::new(always_true(), Some(Branch::Combined(combination)), None)
    }
}

impl fmt::Display for CombiningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An algorithm together with the ordered policies it combines.
pub struct Combination<C> {
    algorithm: CombiningAlgorithm,
    policies: Arc<[Policy<C>]>,
}

impl<C> Combination<C> {
    /// The algorithm used to reduce sub-decisions.
    #[must_use]
    pub const fn algorithm(&self) -> CombiningAlgorithm {
        self.algorithm
    }

    /// The combined policies, in evaluation order.
    #[must_use]
    pub fn policies(&self) -> &[Policy<C>] {
        &self.policies
    }
}

impl<C: 'static> Combination<C> {
    /// Evaluates the sub-policies in order and reduces their decisions.
    pub fn evaluate(&self, ctx: &C) -> Decision {
        let decision = self
            .algorithm
            .combine(self.policies.iter().map(|policy| policy.evaluate(ctx)));
        debug!(
            algorithm = self.algorithm.name(),
            policies = self.policies.len(),
            decision = %decision.kind(),
            "combined decision"
        );
        decision
    }
}

impl<C> Clone for Combination<C> {
    fn clone(&self) -> Self {
        Self {
            algorithm: self.algorithm,
            policies: Arc::clone(&self.policies),
        }
    }
}

impl<C> fmt::Debug for Combination<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Combination")
            .field("algorithm", &self.algorithm)
            .field("policies", &self.policies)
            .finish()
    }
}

/// Combines `policies` so that any Permit wins.
pub fn permit_overrides<C: 'static>(policies: impl IntoIterator<Item = Policy<C>>) -> Policy<C> {
    CombiningAlgorithm::PermitOverrides.policy(policies)
}

/// Combines `policies` so that any Deny wins.
pub fn deny_overrides<C: 'static>(policies: impl IntoIterator<Item = Policy<C>>) -> Policy<C> {
    CombiningAlgorithm::DenyOverrides.policy(policies)
}

/// Combines `policies` so that the first applicable decision wins.
pub fn first_applicable<C: 'static>(policies: impl IntoIterator<Item = Policy<C>>) -> Policy<C> {
    CombiningAlgorithm::FirstApplicable.policy(policies)
}

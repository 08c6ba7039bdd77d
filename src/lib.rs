//! # Verdict - An Embeddable Access-Control Decision Engine
//!
//! Verdict evaluates authorization policies against a caller-supplied
//! context and produces one of four decisions: Permit, Deny, NotApplicable
//! or Indeterminate. Policies are plain values built from composable parts.
//!
//! ## Core Concepts
//!
//! - **Predicate**: A pure boolean test over the context, combinable with `and`/`or`/`not`
//! - **Resolution**: A named step that writes fields into a decision's result record
//! - **Policy**: A target predicate guarding a then-branch and an otherwise-branch
//! - **Combining algorithm**: Reduces the decisions of several policies to one
//!
//! ## Usage
//!
//! ```rust
//! use verdict::{
//!     deny, deny_overrides, permit_overrides, property_equals, resolution,
//!     resolutions, when, Context, ResultRecord,
//! };
//!
//! let r = resolutions([(
//!     "audit",
//!     resolution(|| |ctx: &Context, mut rec: ResultRecord| {
//!         rec.set("audited", ctx.len() as i64);
//!         rec
//!     }),
//! )]);
//!
//! let admins = when(property_equals("role", "admin")).then(r["audit"].chain().permit());
//! let blocked = when(property_equals("blocked", true)).then(deny());
//!
//! let policy = deny_overrides([blocked, permit_overrides([admins])]);
//!
//! let ctx = Context::new().with("role", "admin");
//! let decision = policy.evaluate(&ctx);
//! assert!(decision.is_permit());
//! assert!(decision.result().contains("audited"));
//!
//! let ctx = Context::new().with("role", "admin").with("blocked", true);
//! assert!(policy.evaluate(&ctx).is_deny());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core values
pub mod context;
pub mod decision;
pub mod error;
pub mod util;
pub mod value;

// Policy construction and evaluation
pub mod combining;
pub mod policy;
pub mod predicate;
pub mod resolution;

// Re-export primary types at crate root for convenience
pub use context::{Attributes, Context};
pub use decision::{
    is_deny, is_indeterminate, is_not_applicable, is_permit, Decision, DecisionKind, ResultRecord,
};
pub use error::{PolicyError, PolicyResult};
pub use util::map_indexed;
pub use value::Value;

pub use combining::{
    deny_overrides, first_applicable, permit_overrides, Combination, CombiningAlgorithm,
};
pub use policy::{when, Branch, Policy, When};
pub use predicate::{
    always_false, always_true, not, predicate, property_equals, property_in, property_matches,
    property_present, Predicate,
};
pub use resolution::{
    deny, permit, resolution, resolutions, Pipeline, Resolution, ResolutionDef, Resolutions,
    Terminal,
};

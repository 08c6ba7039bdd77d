//! Resolution pipelines.
//!
//! A resolution is a named `(&C, ResultRecord) -> ResultRecord` step.
//! Steps are collected into a [`Pipeline`] without running anything; the
//! pipeline becomes a [`Terminal`] once a decision kind is chosen with
//! [`Pipeline::permit`] or [`Pipeline::deny`]. Evaluating the terminal runs
//! every step in declaration order against a fresh record.
//!
//! ```
//! use verdict::{resolution, resolutions, Context, ResultRecord};
//!
//! let r = resolutions([
//!     ("stamp", resolution(|| |_: &Context, mut rec: ResultRecord| {
//!         rec.set("audited", true);
//!         rec
//!     })),
//! ]);
//!
//! let decision = r["stamp"].chain().deny().deny().permit().evaluate(&Context::new());
//! assert!(decision.is_permit());
//! assert!(decision.result().contains("audited"));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use tracing::trace;

use crate::decision::{Decision, DecisionKind, ResultRecord};
use crate::error::{PolicyError, PolicyResult};
use crate::util::map_indexed;

type StepFn<C> = dyn Fn(&C, ResultRecord) -> ResultRecord + Send + Sync;

/// A resolution step that has been declared but not yet named.
///
/// Produced by [`resolution`]; named when registered through
/// [`resolutions`] or [`ResolutionDef::named`].
pub struct ResolutionDef<C> {
    step: Arc<StepFn<C>>,
}

impl<C> ResolutionDef<C> {
    /// Attaches a name, producing an invocable [`Resolution`].
    #[must_use]
    pub fn named(&self, name: impl Into<String>) -> Resolution<C> {
        Resolution {
            name: Arc::from(name.into()),
            step: Arc::clone(&self.step),
        }
    }
}

impl<C> Clone for ResolutionDef<C> {
    fn clone(&self) -> Self {
        Self {
            step: Arc::clone(&self.step),
        }
    }
}

impl<C> fmt::Debug for ResolutionDef<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionDef").finish_non_exhaustive()
    }
}

/// Declares one resolution step from a factory.
///
/// The factory runs once, here; the step it returns may mutate the record
/// it receives and hand it back, or return a replacement.
pub fn resolution<C, F, S>(factory: F) -> ResolutionDef<C>
where
    C: 'static,
    F: FnOnce() -> S,
    S: Fn(&C, ResultRecord) -> ResultRecord + Send + Sync + 'static,
{
    ResolutionDef {
        step: Arc::new(factory()),
    }
}

/// A named, invocable resolution step.
pub struct Resolution<C> {
    name: Arc<str>,
    step: Arc<StepFn<C>>,
}

impl<C> Resolution<C> {
    /// Creates a named resolution directly from a step function.
    pub fn new<S>(name: impl Into<String>, step: S) -> Self
    where
        S: Fn(&C, ResultRecord) -> ResultRecord + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name.into()),
            step: Arc::new(step),
        }
    }

    /// The name this step was registered under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs this single step.
    pub fn apply(&self, ctx: &C, record: ResultRecord) -> ResultRecord {
        (self.step)(ctx, record)
    }

    /// Starts a pipeline containing only this step.
    #[must_use]
    pub fn chain(&self) -> Pipeline<C> {
        Pipeline::new().resolve(self)
    }
}

impl<C> Clone for Resolution<C> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            step: Arc::clone(&self.step),
        }
    }
}

impl<C> fmt::Debug for Resolution<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolution")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Named resolutions, looked up by the name they were registered under.
pub struct Resolutions<C> {
    entries: BTreeMap<String, Resolution<C>>,
}

/// Registers a set of declared resolutions under their names.
///
/// A name given twice keeps the last declaration.
pub fn resolutions<C, I, K>(mapping: I) -> Resolutions<C>
where
    I: IntoIterator<Item = (K, ResolutionDef<C>)>,
    K: Into<String>,
{
    let defs: BTreeMap<String, ResolutionDef<C>> = mapping
        .into_iter()
        .map(|(name, def)| (name.into(), def))
        .collect();
    Resolutions {
        entries: map_indexed(&defs, |def, name, _| def.named(name.clone())),
    }
}

impl<C> Resolutions<C> {
    /// Looks up a resolution by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Resolution<C>> {
        self.entries.get(name)
    }

    /// Like [`get`](Self::get) but reports a missing name as an error.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::UnknownResolution` if `name` is not registered.
    pub fn require(&self, name: &str) -> PolicyResult<&Resolution<C>> {
        self.entries
            .get(name)
            .ok_or_else(|| PolicyError::UnknownResolution {
                name: name.to_string(),
            })
    }

    /// Builds a pipeline from registered names, in the order given.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::UnknownResolution` for the first name that is
    /// not registered.
    pub fn pipeline<'a, I>(&self, names: I) -> PolicyResult<Pipeline<C>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .try_fold(Pipeline::new(), |pipeline, name| Ok(pipeline.resolve(self.require(name)?)))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of registered resolutions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C> Index<&str> for Resolutions<C> {
    type Output = Resolution<C>;

    /// # Panics
    ///
    /// Panics if `name` is not registered; use [`Resolutions::require`]
    /// when the name comes from outside the program.
    fn index(&self, name: &str) -> &Resolution<C> {
        match self.entries.get(name) {
            Some(r) => r,
            None => panic!("resolution '{name}' is not registered"),
        }
    }
}

impl<C> fmt::Debug for Resolutions<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

/// An ordered list of resolution steps awaiting a decision kind.
pub struct Pipeline<C> {
    steps: Vec<Resolution<C>>,
}

impl<C> Pipeline<C> {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Appends `resolution` after the steps already collected.
    #[must_use]
    pub fn resolve(mut self, resolution: &Resolution<C>) -> Self {
        self.steps.push(resolution.clone());
        self
    }

    /// Finalizes the pipeline as a Permit.
    #[must_use]
    pub fn permit(self) -> Terminal<C> {
        Terminal::new(DecisionKind::Permit, self.steps)
    }

    /// Finalizes the pipeline as a Deny.
    #[must_use]
    pub fn deny(self) -> Terminal<C> {
        Terminal::new(DecisionKind::Deny, self.steps)
    }

    /// Number of collected steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if no step has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<C> Default for Pipeline<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for Pipeline<C> {
    fn clone(&self) -> Self {
        Self {
            steps: self.steps.clone(),
        }
    }
}

impl<C> fmt::Debug for Pipeline<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.steps.iter().map(Resolution::name))
            .finish()
    }
}

/// A finalized resolution chain: a decision kind plus the steps that build
/// its result record.
///
/// Calling [`permit`](Self::permit) or [`deny`](Self::deny) again replaces
/// the kind; the last call wins. Steps may still be appended with
/// [`resolve`](Self::resolve) after a kind has been chosen.
pub struct Terminal<C> {
    kind: DecisionKind,
    steps: Arc<[Resolution<C>]>,
}

impl<C> Terminal<C> {
    fn new(kind: DecisionKind, steps: Vec<Resolution<C>>) -> Self {
        Self {
            kind,
            steps: steps.into(),
        }
    }

    /// Appends `resolution` after the steps already collected, keeping the
    /// current kind.
    #[must_use]
    pub fn resolve(self, resolution: &Resolution<C>) -> Self {
        let mut steps = self.steps.to_vec();
        steps.push(resolution.clone());
        Self::new(self.kind, steps)
    }

    /// Revises the kind to Permit.
    #[must_use]
    pub fn permit(self) -> Self {
        Self {
            kind: DecisionKind::Permit,
            steps: self.steps,
        }
    }

    /// Revises the kind to Deny.
    #[must_use]
    pub fn deny(self) -> Self {
        Self {
            kind: DecisionKind::Deny,
            steps: self.steps,
        }
    }

    /// The kind the terminal currently resolves to.
    #[must_use]
    pub const fn kind(&self) -> DecisionKind {
        self.kind
    }

    /// Names of the steps, in the order they run.
    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(Resolution::name)
    }

    /// Runs every step against an empty record and returns the decision.
    pub fn evaluate(&self, ctx: &C) -> Decision {
        let result = self.steps.iter().fold(ResultRecord::new(), |record, step| {
            trace!(resolution = step.name(), kind = %self.kind, "applying resolution");
            step.apply(ctx, record)
        });
        Decision::new(self.kind, result)
    }
}

impl<C> Clone for Terminal<C> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            steps: Arc::clone(&self.steps),
        }
    }
}

impl<C> fmt::Debug for Terminal<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Terminal")
            .field("kind", &self.kind)
            .field("steps", &self.step_names().collect::<Vec<_>>())
            .finish()
    }
}

/// A Permit with no resolutions.
#[must_use]
pub fn permit<C>() -> Terminal<C> {
    Pipeline::new().permit()
}

/// A Deny with no resolutions.
#[must_use]
pub fn deny<C>() -> Terminal<C> {
    Pipeline::new().deny()
}

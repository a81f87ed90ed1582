//! Step graph and executor.
//!
//! A pipeline is a set of named steps, one entry step, and exactly one
//! outgoing transition per step. A transition is either a fixed edge or a
//! decision function that inspects the state and names the next step.
//! Execution stops when a transition yields [`END`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::error::PipelineError;

/// Terminal marker. Not a step; reaching it ends the run.
pub const END: &str = "__end__";

/// Default cap on steps executed in one run.
pub const DEFAULT_STEP_LIMIT: usize = 25;

/// A named unit of work over state `S`.
///
/// Steps take the state by value and hand back the updated value.
#[async_trait]
pub trait Step<S: Send + 'static>: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, state: S) -> Result<S, PipelineError>;
}

/// Picks the next step name from the current state.
pub type Decision<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

/// Outgoing transition of a step.
pub enum Transition<S> {
    /// Always go to the named step (or [`END`]).
    To(String),
    /// Ask `decide`; `targets` lists every name it may return.
    Branch {
        decide: Decision<S>,
        targets: Vec<String>,
    },
}

impl<S> Transition<S> {
    fn next(&self, state: &S) -> Result<String, PipelineError> {
        match self {
            Self::To(target) => Ok(target.clone()),
            Self::Branch { decide, targets } => {
                let next = decide(state);
                if targets.iter().any(|t| *t == next) {
                    Ok(next)
                } else {
                    Err(PipelineError::UndeclaredBranch(next))
                }
            }
        }
    }

    fn targets(&self) -> Vec<&str> {
        match self {
            Self::To(target) => vec![target.as_str()],
            Self::Branch { targets, .. } => targets.iter().map(String::as_str).collect(),
        }
    }
}

impl<S> fmt::Debug for Transition<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::To(target) => f.debug_tuple("To").field(target).finish(),
            Self::Branch { targets, .. } => {
                f.debug_struct("Branch").field("targets", targets).finish()
            }
        }
    }
}

// ── Builder ─────────────────────────────────────────────────────────

/// Collects steps and edges, then validates them into a [`Pipeline`].
///
/// Registration errors are deferred and reported by [`PipelineBuilder::build`]
/// so the builder can be chained.
pub struct PipelineBuilder<S: Send + 'static> {
    steps: HashMap<String, Arc<dyn Step<S>>>,
    order: Vec<String>,
    edges: HashMap<String, Transition<S>>,
    entry: Option<String>,
    step_limit: usize,
    error: Option<PipelineError>,
}

impl<S: Send + 'static> PipelineBuilder<S> {
    pub fn new() -> Self {
        Self {
            steps: HashMap::new(),
            order: Vec::new(),
            edges: HashMap::new(),
            entry: None,
            step_limit: DEFAULT_STEP_LIMIT,
            error: None,
        }
    }

    /// Register a step under its own name.
    pub fn add_step(mut self, step: Arc<dyn Step<S>>) -> Self {
        let name = step.name().to_string();
        if name == END {
            self.fail(PipelineError::ReservedStepName(name));
            return self;
        }
        if self.steps.contains_key(&name) {
            self.fail(PipelineError::DuplicateStep(name));
            return self;
        }
        self.order.push(name.clone());
        self.steps.insert(name, step);
        self
    }

    pub fn set_entry(mut self, name: &str) -> Self {
        self.entry = Some(name.to_string());
        self
    }

    /// Unconditional edge `from -> to`.
    pub fn add_edge(self, from: &str, to: &str) -> Self {
        self.add_transition(from, Transition::To(to.to_string()))
    }

    /// State-dependent edge leaving `from`. `decide` must return one of
    /// `targets`; anything else fails the run.
    pub fn add_conditional_edge<F, I, T>(self, from: &str, decide: F, targets: I) -> Self
    where
        F: Fn(&S) -> String + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.add_transition(
            from,
            Transition::Branch {
                decide: Arc::new(decide),
                targets: targets.into_iter().map(Into::into).collect(),
            },
        )
    }

    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = limit;
        self
    }

    fn add_transition(mut self, from: &str, transition: Transition<S>) -> Self {
        if self.edges.contains_key(from) {
            self.fail(PipelineError::DuplicateEdge(from.to_string()));
            return self;
        }
        self.edges.insert(from.to_string(), transition);
        self
    }

    fn fail(&mut self, error: PipelineError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Validate the graph.
    pub fn build(self) -> Result<Pipeline<S>, PipelineError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let entry = self.entry.ok_or(PipelineError::MissingEntry)?;
        if !self.steps.contains_key(&entry) {
            return Err(PipelineError::UnknownStep(entry));
        }

        for from in self.edges.keys() {
            if !self.steps.contains_key(from) {
                return Err(PipelineError::UnknownStep(from.clone()));
            }
        }

        for name in &self.order {
            let transition = self
                .edges
                .get(name)
                .ok_or_else(|| PipelineError::MissingEdge(name.clone()))?;
            for target in transition.targets() {
                if target != END && !self.steps.contains_key(target) {
                    return Err(PipelineError::UnknownStep(target.to_string()));
                }
            }
        }

        debug!(
            steps = self.order.len(),
            entry = %entry,
            "Pipeline built"
        );

        Ok(Pipeline {
            steps: self.steps,
            edges: self.edges,
            entry,
            step_limit: self.step_limit,
        })
    }
}

impl<S: Send + 'static> Default for PipelineBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

// ── Executor ────────────────────────────────────────────────────────

/// A validated step graph. Holds no per-run state, so one pipeline can
/// serve any number of runs, concurrently or not.
pub struct Pipeline<S: Send + 'static> {
    steps: HashMap<String, Arc<dyn Step<S>>>,
    edges: HashMap<String, Transition<S>>,
    entry: String,
    step_limit: usize,
}

impl<S: Send + 'static> Pipeline<S> {
    pub fn builder() -> PipelineBuilder<S> {
        PipelineBuilder::new()
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Drive `state` from the entry step until [`END`].
    ///
    /// Step errors are returned as-is; steps after the failing one do not run.
    pub async fn run(&self, mut state: S) -> Result<S, PipelineError> {
        let mut current = self.entry.clone();
        let mut executed = 0usize;

        while current != END {
            if executed >= self.step_limit {
                return Err(PipelineError::StepLimitExceeded {
                    limit: self.step_limit,
                });
            }

            let step = self
                .steps
                .get(&current)
                .ok_or_else(|| PipelineError::UnknownStep(current.clone()))?;

            trace!(step = %current, "Running step");
            state = step.run(state).await?;
            executed += 1;

            let transition = self
                .edges
                .get(&current)
                .ok_or_else(|| PipelineError::MissingEdge(current.clone()))?;
            let next = transition.next(&state)?;
            debug!(from = %current, to = %next, "Transition");
            current = next;
        }

        Ok(state)
    }
}

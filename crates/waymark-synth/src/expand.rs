//! Graph expansion: turns a state graph into closed plans.
//!
//! A state with one outgoing transition extends the current plan in place.
//! A state with several clones the plan once per untaken transition; each
//! clone becomes an independent continuation. Continuations never recurse
//! into each other: the sequential driver keeps them on an explicit stack and
//! the parallel driver spawns them into one rayon scope, whose end is the
//! join barrier. Stack depth therefore does not grow with the number of
//! nested branch points.
//!
//! A transition is taken at most once per path, which bounds every path by
//! the number of transitions and guarantees termination on cyclic graphs.

use std::sync::Mutex;

use waymark_model::graph::{State, StateGraph, StateId, Transition, TransitionId};

use crate::context::GenerationContext;
use crate::diagnostics::Diagnostic;
use crate::plan::{PathId, PlanBuilder};
use crate::stub::StubSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpandOptions {
    /// Expand sibling branch continuations on the rayon pool. Output is the
    /// same either way.
    pub parallel_branches: bool,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            parallel_branches: true,
        }
    }
}

/// Conditions that abort the whole run. Model problems that only affect one
/// path are diagnostics instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpandError {
    #[error("Model '{0}' has no initial state")]
    NoInitialState(String),

    #[error("State {0} does not exist")]
    UnknownState(StateId),

    #[error("Transition {0} does not exist")]
    UnknownTransition(TransitionId),

    #[error("More than {0} test plans")]
    PlanLimitExceeded(usize),
}

/// How guards on a taken transition enter the plan.
#[derive(Debug, Clone, Copy)]
enum GuardMode {
    /// Sole transition: the test observes the guard.
    Assert,
    /// One of several: the test coerces the guard to pick this branch.
    Force,
}

/// A branch clone waiting to be walked from `state`.
type Continuation = (StateId, PlanBuilder);

/// First failure seen by any continuation. A plan limit breach outranks
/// structural errors; among structural errors the lowest path wins, so the
/// reported error does not depend on scheduling.
#[derive(Default)]
struct Failure {
    first: Mutex<Option<(PathId, ExpandError)>>,
}

impl Failure {
    fn record(&self, path: PathId, error: ExpandError) {
        let mut first = self
            .first
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let replace = match &*first {
            None => true,
            Some((_, ExpandError::PlanLimitExceeded(_))) => false,
            Some(_) if matches!(error, ExpandError::PlanLimitExceeded(_)) => true,
            Some((seen, _)) => path < *seen,
        };
        if replace {
            *first = Some((path, error));
        }
    }

    fn into_result(self) -> Result<(), ExpandError> {
        let first = self
            .first
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match first {
            Some((_, error)) => Err(error),
            None => Ok(()),
        }
    }
}

/// Expand `graph` from its initial state, filling the registries in `ctx`.
pub fn expand(
    graph: &StateGraph,
    ctx: &GenerationContext<'_>,
    options: ExpandOptions,
) -> Result<(), ExpandError> {
    let initial = graph
        .initial()
        .ok_or_else(|| ExpandError::NoInitialState(graph.name.clone()))?;
    tracing::debug!(model = %graph.name, "expanding from initial state");
    Expander::new(graph, ctx, options).expand_from(initial, PlanBuilder::new())
}

pub struct Expander<'g, 'c, 's> {
    graph: &'g StateGraph,
    ctx: &'c GenerationContext<'s>,
    options: ExpandOptions,
}

impl<'g, 'c, 's> Expander<'g, 'c, 's> {
    pub fn new(
        graph: &'g StateGraph,
        ctx: &'c GenerationContext<'s>,
        options: ExpandOptions,
    ) -> Self {
        Self {
            graph,
            ctx,
            options,
        }
    }

    fn state(&self, id: StateId) -> Result<&'g State, ExpandError> {
        self.graph.state(id).ok_or(ExpandError::UnknownState(id))
    }

    fn transition(&self, id: TransitionId) -> Result<&'g Transition, ExpandError> {
        self.graph
            .transition(id)
            .ok_or(ExpandError::UnknownTransition(id))
    }

    /// Expand from `start` with an accumulated plan and every continuation it
    /// spawns. Returns once all of them have finished. Closed plans land in
    /// the context's plan registry; an abandoned or cyclic path closes
    /// nothing.
    pub fn expand_from(&self, start: StateId, plan: PlanBuilder) -> Result<(), ExpandError> {
        let failure = Failure::default();
        if self.options.parallel_branches {
            rayon::scope(|scope| self.spawn(scope, &failure, (start, plan)));
        } else {
            self.drain(&failure, (start, plan));
        }
        failure.into_result()
    }

    /// Depth-first over an explicit stack. Children are pushed in reverse so
    /// the lowest ordinal is walked first.
    fn drain(&self, failure: &Failure, root: Continuation) {
        let mut pending = vec![root];
        while let Some(continuation) = pending.pop() {
            if self.ctx.plan_limit_exceeded() {
                break;
            }
            if let Some(children) = self.step(failure, continuation) {
                pending.extend(children.into_iter().rev());
            }
        }
    }

    fn spawn<'scope>(
        &'scope self,
        scope: &rayon::Scope<'scope>,
        failure: &'scope Failure,
        continuation: Continuation,
    ) {
        scope.spawn(move |scope| {
            if self.ctx.plan_limit_exceeded() {
                return;
            }
            for child in self.step(failure, continuation).into_iter().flatten() {
                self.spawn(scope, failure, child);
            }
        });
    }

    /// Walk one continuation, recording its error if it fails.
    fn step(&self, failure: &Failure, (start, plan): Continuation) -> Option<Vec<Continuation>> {
        let path = plan.path().clone();
        match self.walk(start, plan) {
            Ok(children) => Some(children),
            Err(error) => {
                failure.record(path, error);
                None
            }
        }
    }

    /// Follow linear transitions in place until the path closes, dies, or
    /// reaches a branch point. Returns the branch clones still to walk.
    fn walk(
        &self,
        start: StateId,
        mut plan: PlanBuilder,
    ) -> Result<Vec<Continuation>, ExpandError> {
        let mut current = start;
        loop {
            let state = self.state(current)?;
            let assert_state = self.ctx.stub(
                &plan,
                StubSource::State {
                    name: &state.name,
                    is_initial: state.is_initial,
                },
            );
            plan.push_assert(&assert_state);

            let mut continuations = Vec::new();
            match state.outgoing.as_slice() {
                [] if !state.is_final => {
                    self.ctx.report(
                        plan.path(),
                        Diagnostic::ModelIncomplete {
                            state: state.name.clone(),
                        },
                    );
                    return Ok(continuations);
                }
                [] => {}
                [tid] => {
                    let tid = *tid;
                    if !plan.visit(tid) {
                        return Ok(continuations);
                    }
                    let transition = self.transition(tid)?;
                    self.take(&mut plan, state, tid, transition, GuardMode::Assert);

                    if !state.is_final {
                        match transition.target {
                            Some(target) => {
                                current = target;
                                continue;
                            }
                            None => {
                                self.report_missing_target(&plan, state, tid, transition);
                                return Ok(continuations);
                            }
                        }
                    }
                    if transition.target.is_none() {
                        self.report_missing_target(&plan, state, tid, transition);
                    }
                }
                outgoing => continuations = self.branch(&plan, state, outgoing)?,
            }

            if state.is_final {
                self.ctx.close(plan.close())?;
            }
            return Ok(continuations);
        }
    }

    /// Clone `plan` once per transition not already taken on the incoming
    /// path and take that transition on the clone.
    fn branch(
        &self,
        plan: &PlanBuilder,
        state: &State,
        outgoing: &[TransitionId],
    ) -> Result<Vec<Continuation>, ExpandError> {
        let mut continuations = Vec::with_capacity(outgoing.len());
        for (ordinal, &tid) in outgoing.iter().enumerate() {
            if plan.has_visited(tid) {
                continue;
            }
            let transition = self.transition(tid)?;
            let mut clone = plan.branch(ordinal as u32);
            clone.visit(tid);
            self.take(&mut clone, state, tid, transition, GuardMode::Force);

            match transition.target {
                Some(target) if !state.is_final => continuations.push((target, clone)),
                Some(_) => {}
                None => self.report_missing_target(&clone, state, tid, transition),
            }
        }

        tracing::debug!(
            state = %state.name,
            path = %plan.path(),
            continuations = continuations.len(),
            "branch fan-out"
        );
        Ok(continuations)
    }

    /// Append guard and trigger steps for taking `transition`.
    fn take(
        &self,
        plan: &mut PlanBuilder,
        state: &State,
        tid: TransitionId,
        transition: &Transition,
        mode: GuardMode,
    ) {
        for body in &transition.guards {
            if body.trim().is_empty() {
                self.ctx.report(
                    plan.path(),
                    Diagnostic::EmptyGuardExpression {
                        state: state.name.clone(),
                        transition: transition.label(tid),
                    },
                );
                continue;
            }
            match mode {
                GuardMode::Assert => {
                    let stub = self.ctx.stub(plan, StubSource::GuardAssertion(body));
                    plan.push_assert(&stub);
                }
                GuardMode::Force => {
                    let stub = self.ctx.stub(plan, StubSource::GuardForce(body));
                    plan.push_call(&stub);
                }
            }
        }

        for trigger in &transition.triggers {
            let stub = self.ctx.stub(plan, StubSource::Trigger(trigger));
            plan.push_call(&stub);
        }
    }

    fn report_missing_target(
        &self,
        plan: &PlanBuilder,
        state: &State,
        tid: TransitionId,
        transition: &Transition,
    ) {
        self.ctx.report(
            plan.path(),
            Diagnostic::MissingTarget {
                state: state.name.clone(),
                transition: transition.label(tid),
            },
        );
    }
}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::expand::ExpandError;
use crate::plan::{NamedPlan, PathId, Plan, PlanBuilder, PlanRegistry};
use crate::stub::{Stub, StubOrigin, StubRegistry, StubSource};

/// State shared by every continuation of one generation run.
///
/// Owns the two registries and borrows the diagnostic sink. Plan builders are
/// not part of it; each continuation owns its own.
pub struct GenerationContext<'a> {
    stubs: StubRegistry,
    plans: PlanRegistry,
    sink: &'a dyn DiagnosticSink,
    plan_limit: Option<usize>,
    closed: AtomicUsize,
}

impl<'a> GenerationContext<'a> {
    pub fn new(sink: &'a dyn DiagnosticSink) -> Self {
        Self {
            stubs: StubRegistry::new(),
            plans: PlanRegistry::new(),
            sink,
            plan_limit: None,
            closed: AtomicUsize::new(0),
        }
    }

    /// Fail the run once more than `limit` plans have closed.
    pub fn with_plan_limit(mut self, limit: usize) -> Self {
        self.plan_limit = Some(limit);
        self
    }

    pub fn report(&self, origin: &PathId, diagnostic: Diagnostic) {
        tracing::warn!(path = %origin, "{diagnostic}");
        self.sink.report(origin, diagnostic);
    }

    /// Fetch or create the stub for `source` as the next step of `plan`,
    /// forwarding any naming diagnostic on behalf of the plan's path.
    pub fn stub(&self, plan: &PlanBuilder, source: StubSource<'_>) -> Arc<Stub> {
        let origin = StubOrigin::new(plan.path().clone(), plan.steps().len());
        let resolved = self.stubs.get_or_create(&origin, source);
        if let Some(diagnostic) = resolved.diagnostic {
            self.report(plan.path(), diagnostic);
        }
        resolved.stub
    }

    pub fn close(&self, plan: Plan) -> Result<PathId, ExpandError> {
        let count = self.closed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(limit) = self.plan_limit {
            if count > limit {
                return Err(ExpandError::PlanLimitExceeded(limit));
            }
        }
        tracing::debug!(path = %plan.path, steps = plan.steps.len(), "plan closed");
        Ok(self.plans.register(plan))
    }

    /// Whether the plan limit has already been crossed. Continuations still
    /// queued use this to stop early.
    pub fn plan_limit_exceeded(&self) -> bool {
        self.plan_limit
            .is_some_and(|limit| self.closed.load(Ordering::Relaxed) > limit)
    }

    /// Release the registries once every continuation has finished.
    pub fn finish(self) -> (Vec<Arc<Stub>>, Vec<NamedPlan>) {
        let stubs = self.stubs.snapshot();
        let plans = self.plans.into_named();
        (stubs, plans)
    }
}

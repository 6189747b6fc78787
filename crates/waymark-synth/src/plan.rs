//! Plans: ordered assertion/invocation steps for one execution path.

use std::collections::HashSet;
use std::fmt;

use crossbeam::queue::SegQueue;
use serde::{Deserialize, Serialize};

use waymark_model::graph::TransitionId;

use crate::naming;
use crate::stub::Stub;

/// One step of a plan, naming the stub it uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "stub", rename_all = "snake_case")]
pub enum Step {
    Assert(String),
    Call(String),
}

impl Step {
    pub fn stub_name(&self) -> &str {
        match self {
            Step::Assert(name) | Step::Call(name) => name,
        }
    }
}

/// Branch ordinals taken from the root to reach a continuation.
///
/// Lexicographic order on paths is the order in which a sequential
/// depth-first traversal closes plans, which makes it the numbering order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathId(Vec<u32>);

impl PathId {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn child(&self, ordinal: u32) -> Self {
        let mut ordinals = self.0.clone();
        ordinals.push(ordinal);
        Self(ordinals)
    }

    pub fn ordinals(&self) -> &[u32] {
        &self.0
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("root")?;
        for ordinal in &self.0 {
            write!(f, ".{ordinal}")?;
        }
        Ok(())
    }
}

/// An open plan, exclusively owned by one continuation.
#[derive(Debug, Clone, Default)]
pub struct PlanBuilder {
    path: PathId,
    steps: Vec<Step>,
    visited: HashSet<TransitionId>,
    taken: Vec<TransitionId>,
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(&self) -> &PathId {
        &self.path
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn push_assert(&mut self, stub: &Stub) {
        self.steps.push(Step::Assert(stub.name.clone()));
    }

    pub fn push_call(&mut self, stub: &Stub) {
        self.steps.push(Step::Call(stub.name.clone()));
    }

    pub fn has_visited(&self, transition: TransitionId) -> bool {
        self.visited.contains(&transition)
    }

    /// Mark `transition` as taken on this path. Returns false, leaving the
    /// plan untouched, if it was already taken.
    pub fn visit(&mut self, transition: TransitionId) -> bool {
        if !self.visited.insert(transition) {
            return false;
        }
        self.taken.push(transition);
        true
    }

    /// Independent copy for the `ordinal`-th outgoing transition of a branch.
    pub fn branch(&self, ordinal: u32) -> PlanBuilder {
        PlanBuilder {
            path: self.path.child(ordinal),
            steps: self.steps.clone(),
            visited: self.visited.clone(),
            taken: self.taken.clone(),
        }
    }

    pub fn close(self) -> Plan {
        Plan {
            path: self.path,
            steps: self.steps,
            transitions: self.taken,
        }
    }
}

/// A plan whose path reached a final state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub path: PathId,
    pub steps: Vec<Step>,
    /// Transitions taken, in traversal order.
    pub transitions: Vec<TransitionId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedPlan {
    pub name: String,
    pub plan: Plan,
}

/// Append-only, lock-free collection of closed plans.
#[derive(Debug, Default)]
pub struct PlanRegistry {
    plans: SegQueue<Plan>,
}

impl PlanRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, plan: Plan) -> PathId {
        let id = plan.path.clone();
        self.plans.push(plan);
        id
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    /// Drain into display-named plans, numbered `testPlan_1..` in path order.
    pub fn into_named(self) -> Vec<NamedPlan> {
        let mut plans = Vec::with_capacity(self.plans.len());
        while let Some(plan) = self.plans.pop() {
            plans.push(plan);
        }
        plans.sort_by(|a, b| a.path.cmp(&b.path));
        plans
            .into_iter()
            .enumerate()
            .map(|(i, plan)| NamedPlan {
                name: naming::plan_name(i + 1),
                plan,
            })
            .collect()
    }
}

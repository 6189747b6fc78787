//! Machine-readable companion to the rendered class.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use waymark_synth::{NamedPlan, Step, Stub};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub model: String,
    pub stubs: Vec<StubRecord>,
    pub plans: Vec<PlanRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StubRecord {
    pub name: String,
    pub kind: String,
    pub documentation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRecord {
    pub name: String,
    /// Branch ordinals taken from the initial state.
    pub path: Vec<u32>,
    /// Transition indices in traversal order.
    pub transitions: Vec<u32>,
    pub steps: Vec<Step>,
}

impl Manifest {
    pub fn build(model_name: &str, stubs: &[Arc<Stub>], plans: &[NamedPlan]) -> Self {
        Self {
            model: model_name.to_string(),
            stubs: stubs
                .iter()
                .map(|s| StubRecord {
                    name: s.name.clone(),
                    kind: s.kind.as_str().to_string(),
                    documentation: s.documentation.clone(),
                })
                .collect(),
            plans: plans
                .iter()
                .map(|p| PlanRecord {
                    name: p.name.clone(),
                    path: p.plan.path.ordinals().to_vec(),
                    transitions: p.plan.transitions.iter().map(|t| t.0).collect(),
                    steps: p.plan.steps.clone(),
                })
                .collect(),
        }
    }
}

pub fn render_manifest(
    model_name: &str,
    stubs: &[Arc<Stub>],
    plans: &[NamedPlan],
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&Manifest::build(model_name, stubs, plans))
}

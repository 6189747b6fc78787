use std::collections::{HashMap, HashSet};

use crate::graph::{StateGraph, TransitionId};

/// Structural precondition violations. Any of these aborts a generation run,
/// since traversal termination relies on stable transition identity and
/// resolvable targets.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Model '{model}' has no initial state")]
    MissingInitialState { model: String },

    #[error("Model has more than one initial state: {}", .names.join(", "))]
    MultipleInitialStates { names: Vec<String> },

    #[error("Duplicate state name '{name}'")]
    DuplicateStateName { name: String },

    #[error("Transition '{transition}' from state '{state}' targets unknown state '{target}'")]
    UnknownTarget {
        state: String,
        transition: String,
        target: String,
    },

    #[error("State '{state}' lists transition {transition} which it does not own")]
    DanglingTransition {
        state: String,
        transition: TransitionId,
    },

    #[error("Trigger of kind '{kind}' on transition '{transition}' from state '{state}' is missing '{field}'")]
    IncompleteTrigger {
        state: String,
        transition: String,
        kind: String,
        field: &'static str,
    },
}

pub fn validate_graph(graph: &StateGraph) -> Result<(), Vec<ModelError>> {
    let mut errors = Vec::new();
    validate_initial(graph, &mut errors);
    validate_state_names(graph, &mut errors);
    validate_ownership(graph, &mut errors);
    validate_targets(graph, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Exactly one synthetic start state.
fn validate_initial(graph: &StateGraph, errors: &mut Vec<ModelError>) {
    let initials: Vec<String> = graph
        .states()
        .filter(|(_, s)| s.is_initial)
        .map(|(_, s)| s.name.clone())
        .collect();
    match initials.len() {
        0 => errors.push(ModelError::MissingInitialState {
            model: graph.name.clone(),
        }),
        1 => {}
        _ => errors.push(ModelError::MultipleInitialStates { names: initials }),
    }
}

/// State names are the stub identity, so they must be unique.
fn validate_state_names(graph: &StateGraph, errors: &mut Vec<ModelError>) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for (_, state) in graph.states() {
        if !seen.insert(state.name.as_str()) && reported.insert(state.name.as_str()) {
            errors.push(ModelError::DuplicateStateName {
                name: state.name.clone(),
            });
        }
    }
}

/// Every outgoing id must resolve to a transition owned by that state, and
/// appear in exactly one outgoing list.
fn validate_ownership(graph: &StateGraph, errors: &mut Vec<ModelError>) {
    let mut owners: HashMap<TransitionId, usize> = HashMap::new();
    for (state_id, state) in graph.states() {
        for &tid in &state.outgoing {
            let owned = graph
                .transition(tid)
                .map(|t| t.source == state_id)
                .unwrap_or(false);
            let count = owners.entry(tid).or_insert(0);
            *count += 1;
            if !owned || *count > 1 {
                errors.push(ModelError::DanglingTransition {
                    state: state.name.clone(),
                    transition: tid,
                });
            }
        }
    }
}

fn validate_targets(graph: &StateGraph, errors: &mut Vec<ModelError>) {
    for (tid, transition) in graph.transitions() {
        if let Some(target) = transition.target {
            if graph.state(target).is_none() {
                let state = graph
                    .state(transition.source)
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| transition.source.to_string());
                errors.push(ModelError::UnknownTarget {
                    state,
                    transition: transition.label(tid),
                    target: target.to_string(),
                });
            }
        }
    }
}

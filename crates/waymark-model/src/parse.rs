use serde::{Deserialize, Serialize};

use crate::graph::{StateGraph, StateId, Transition, Trigger};
use crate::validate::ModelError;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialized form of a state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDocument {
    pub name: String,
    pub states: Vec<StateDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateDocument {
    pub name: String,
    #[serde(default)]
    pub initial: bool,
    #[serde(default, rename = "final")]
    pub is_final: bool,
    #[serde(default)]
    pub transitions: Vec<TransitionDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionDocument {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub guards: Vec<String>,
    #[serde(default)]
    pub triggers: Vec<TriggerDocument>,
    /// Target state name.
    #[serde(default)]
    pub target: Option<String>,
}

/// Flat trigger record. `kind` selects which of the optional fields apply;
/// unrecognized kinds become [`Trigger::Other`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerDocument {
    pub kind: String,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub operation_name: Option<String>,
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub when: Option<String>,
}

pub fn parse_model(json: &str) -> Result<ModelDocument, ParseError> {
    Ok(serde_json::from_str(json)?)
}

impl StateGraph {
    /// Resolve a parsed document into an arena graph. Target names are looked
    /// up against the document's states; unknown names are reported together.
    pub fn from_document(doc: &ModelDocument) -> Result<StateGraph, Vec<ModelError>> {
        let mut graph = StateGraph::new(doc.name.clone());
        for state in &doc.states {
            graph.push_state(state.name.clone(), state.initial, state.is_final);
        }

        let mut errors = Vec::new();
        for (index, state) in doc.states.iter().enumerate() {
            let source = StateId(index as u32);
            for (position, t) in state.transitions.iter().enumerate() {
                let label = t
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("{}#{}", state.name, position));

                let target = match &t.target {
                    Some(name) => match graph.find_state(name) {
                        Some(id) => Some(id),
                        None => {
                            errors.push(ModelError::UnknownTarget {
                                state: state.name.clone(),
                                transition: label,
                                target: name.clone(),
                            });
                            continue;
                        }
                    },
                    None => None,
                };

                let mut triggers = Vec::with_capacity(t.triggers.len());
                for trigger in &t.triggers {
                    match convert_trigger(trigger) {
                        Ok(tr) => triggers.push(tr),
                        Err(field) => errors.push(ModelError::IncompleteTrigger {
                            state: state.name.clone(),
                            transition: label.clone(),
                            kind: trigger.kind.clone(),
                            field,
                        }),
                    }
                }

                graph.add_transition(
                    source,
                    Transition {
                        name: t.name.clone(),
                        source,
                        guards: t.guards.clone(),
                        triggers,
                        target,
                    },
                );
            }
        }

        if errors.is_empty() {
            Ok(graph)
        } else {
            Err(errors)
        }
    }
}

/// Map a flat trigger record onto the closed [`Trigger`] variant set.
/// Returns the name of the first missing required field.
fn convert_trigger(doc: &TriggerDocument) -> Result<Trigger, &'static str> {
    let event_name = || doc.event_name.clone().unwrap_or_default();
    match doc.kind.as_str() {
        "call" => Ok(Trigger::Call {
            class_name: doc.class_name.clone().ok_or("class_name")?,
            operation_name: doc.operation_name.clone().ok_or("operation_name")?,
        }),
        "change" => Ok(Trigger::Change {
            event_name: event_name(),
            condition: doc.condition.clone(),
        }),
        "time" => Ok(Trigger::Time {
            event_name: event_name(),
            when: doc.when.clone(),
        }),
        other => Ok(Trigger::Other {
            event_name: doc.event_name.clone().ok_or("event_name")?,
            kind: other.to_string(),
        }),
    }
}

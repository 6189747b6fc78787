pub mod graph;
pub mod parse;
pub mod validate;

pub use graph::{State, StateGraph, StateId, Transition, TransitionId, Trigger};
pub use parse::parse_model;
pub use validate::{validate_graph, ModelError};

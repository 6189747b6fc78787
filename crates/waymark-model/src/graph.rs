use std::fmt;

/// Index of a state in a [`StateGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub u32);

/// Index of a transition in a [`StateGraph`].
///
/// This is the identity used for cycle detection. Two transitions that share
/// both source and target still have distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionId(pub u32);

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// A node of the behavioral model.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub name: String,
    /// Synthetic start marker. Its assertion stub is always `InitialState`.
    pub is_initial: bool,
    pub is_final: bool,
    /// Outgoing transitions in model order.
    pub outgoing: Vec<TransitionId>,
}

/// The event that causes a transition to fire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// An operation invoked on a class.
    Call {
        class_name: String,
        operation_name: String,
    },
    /// A change in a boolean condition.
    Change {
        event_name: String,
        condition: Option<String>,
    },
    /// A timed event.
    Time {
        event_name: String,
        when: Option<String>,
    },
    /// Any event kind the generator has no dedicated naming for.
    Other { event_name: String, kind: String },
}

impl Trigger {
    pub fn call(class_name: impl Into<String>, operation_name: impl Into<String>) -> Self {
        Trigger::Call {
            class_name: class_name.into(),
            operation_name: operation_name.into(),
        }
    }

    pub fn change(event_name: impl Into<String>, condition: impl Into<String>) -> Self {
        Trigger::Change {
            event_name: event_name.into(),
            condition: Some(condition.into()),
        }
    }

    pub fn time(event_name: impl Into<String>, when: impl Into<String>) -> Self {
        Trigger::Time {
            event_name: event_name.into(),
            when: Some(when.into()),
        }
    }
}

/// A directed, optionally guarded edge between two states.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub name: Option<String>,
    /// Owning state. Set by [`StateGraph::add_transition`].
    pub source: StateId,
    /// Guard expression bodies, kept as free-form text.
    pub guards: Vec<String>,
    pub triggers: Vec<Trigger>,
    /// Only a final state may own a transition without a target.
    pub target: Option<StateId>,
}

impl Transition {
    pub fn to(target: StateId) -> Self {
        Self {
            name: None,
            source: StateId(0),
            guards: Vec::new(),
            triggers: Vec::new(),
            target: Some(target),
        }
    }

    pub fn dangling() -> Self {
        Self {
            target: None,
            ..Self::to(StateId(0))
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn guard(mut self, body: impl Into<String>) -> Self {
        self.guards.push(body.into());
        self
    }

    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    /// Human-readable label for diagnostics.
    pub fn label(&self, id: TransitionId) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => id.to_string(),
        }
    }
}

/// Read-only view of a state machine, stored as two arenas.
#[derive(Debug, Clone, Default)]
pub struct StateGraph {
    pub name: String,
    states: Vec<State>,
    transitions: Vec<Transition>,
    initial: Option<StateId>,
}

impl StateGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            states: Vec::new(),
            transitions: Vec::new(),
            initial: None,
        }
    }

    pub(crate) fn push_state(&mut self, name: String, is_initial: bool, is_final: bool) -> StateId {
        let id = StateId(self.states.len() as u32);
        self.states.push(State {
            name,
            is_initial,
            is_final,
            outgoing: Vec::new(),
        });
        if is_initial && self.initial.is_none() {
            self.initial = Some(id);
        }
        id
    }

    pub fn add_state(&mut self, name: impl Into<String>) -> StateId {
        self.push_state(name.into(), false, false)
    }

    pub fn add_final_state(&mut self, name: impl Into<String>) -> StateId {
        self.push_state(name.into(), false, true)
    }

    /// Add the synthetic start state. The first one added becomes the
    /// traversal root; validation rejects any further ones.
    pub fn add_initial_state(&mut self, name: impl Into<String>) -> StateId {
        self.push_state(name.into(), true, false)
    }

    /// Attach `transition` to `source` and return its identity.
    pub fn add_transition(&mut self, source: StateId, mut transition: Transition) -> TransitionId {
        let id = TransitionId(self.transitions.len() as u32);
        transition.source = source;
        self.transitions.push(transition);
        if let Some(state) = self.states.get_mut(source.0 as usize) {
            state.outgoing.push(id);
        }
        id
    }

    pub fn initial(&self) -> Option<StateId> {
        self.initial
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id.0 as usize)
    }

    pub fn state_mut(&mut self, id: StateId) -> Option<&mut State> {
        self.states.get_mut(id.0 as usize)
    }

    pub fn transition(&self, id: TransitionId) -> Option<&Transition> {
        self.transitions.get(id.0 as usize)
    }

    /// Transitions leaving `id`, in declaration order. Empty for unknown ids.
    pub fn outgoing(&self, id: StateId) -> impl Iterator<Item = (TransitionId, &Transition)> {
        self.state(id)
            .map(|s| s.outgoing.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(move |&tid| self.transition(tid).map(|t| (tid, t)))
    }

    pub fn find_state(&self, name: &str) -> Option<StateId> {
        self.states
            .iter()
            .position(|s| s.name == name)
            .map(|i| StateId(i as u32))
    }

    pub fn states(&self) -> impl Iterator<Item = (StateId, &State)> {
        self.states
            .iter()
            .enumerate()
            .map(|(i, s)| (StateId(i as u32), s))
    }

    pub fn transitions(&self) -> impl Iterator<Item = (TransitionId, &Transition)> {
        self.transitions
            .iter()
            .enumerate()
            .map(|(i, t)| (TransitionId(i as u32), t))
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_between_same_states_are_distinct() {
        let mut g = StateGraph::new("m");
        let a = g.add_state("A");
        let b = g.add_final_state("B");
        let t1 = g.add_transition(a, Transition::to(b));
        let t2 = g.add_transition(a, Transition::to(b));
        assert_ne!(t1, t2);
        assert_eq!(g.state(a).unwrap().outgoing, vec![t1, t2]);
        assert_eq!(g.transition(t2).unwrap().source, a);
        let ids: Vec<TransitionId> = g.outgoing(a).map(|(id, _)| id).collect();
        assert_eq!(ids, vec![t1, t2]);
        assert_eq!(g.outgoing(b).count(), 0);
    }

    #[test]
    fn test_first_initial_state_is_root() {
        let mut g = StateGraph::new("m");
        assert!(g.initial().is_none());
        let init = g.add_initial_state("Initial");
        g.add_initial_state("Other");
        assert_eq!(g.initial(), Some(init));
    }

    #[test]
    fn test_transition_label_falls_back_to_id() {
        let t = Transition::to(StateId(1));
        assert_eq!(t.label(TransitionId(7)), "t7");
        assert_eq!(t.named("go").label(TransitionId(7)), "go");
    }
}

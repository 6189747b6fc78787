//! Abstract assertion/invocation declarations and their deduplicating store.

use std::collections::{btree_map, BTreeMap};
use std::sync::{Arc, Mutex};

use waymark_model::graph::Trigger;

use crate::diagnostics::Diagnostic;
use crate::naming;
use crate::plan::PathId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StubKind {
    AssertState,
    AssertGuardTrue,
    ForceGuardTrue,
    InvokeTrigger,
}

impl StubKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StubKind::AssertState => "assert_state",
            StubKind::AssertGuardTrue => "assert_guard_true",
            StubKind::ForceGuardTrue => "force_guard_true",
            StubKind::InvokeTrigger => "invoke_trigger",
        }
    }
}

/// Raw identifier a stub is derived from.
#[derive(Debug, Clone, Copy)]
pub enum StubSource<'a> {
    State { name: &'a str, is_initial: bool },
    GuardAssertion(&'a str),
    GuardForce(&'a str),
    Trigger(&'a Trigger),
}

/// A named, documented operation with no body. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stub {
    pub name: String,
    pub kind: StubKind,
    /// Contract the eventual implementation must satisfy.
    pub documentation: String,
}

impl Stub {
    /// Derive the stub for `source`. Pure: the same source always yields the
    /// same stub and the same diagnostic.
    pub fn derive(source: StubSource<'_>) -> (Stub, Option<Diagnostic>) {
        match source {
            StubSource::State { name, is_initial } => {
                let shown = if is_initial {
                    naming::INITIAL_STATE_NAME
                } else {
                    name
                };
                let stub = Stub {
                    name: naming::state_assertion_name(name, is_initial),
                    kind: StubKind::AssertState,
                    documentation: format!("Must return true if the current state is {shown}."),
                };
                (stub, None)
            }
            StubSource::GuardAssertion(body) => {
                let stub = Stub {
                    name: naming::guard_assertion_name(body),
                    kind: StubKind::AssertGuardTrue,
                    documentation: format!(
                        "Must evaluate and return true if the following condition holds: {body}"
                    ),
                };
                (stub, None)
            }
            StubSource::GuardForce(body) => {
                let stub = Stub {
                    name: naming::guard_force_name(body),
                    kind: StubKind::ForceGuardTrue,
                    documentation: format!(
                        "Must drive the tested system until the following condition holds, \
                         so the test can progress on the current branch: {body}"
                    ),
                };
                (stub, None)
            }
            StubSource::Trigger(trigger) => derive_trigger(trigger),
        }
    }
}

fn derive_trigger(trigger: &Trigger) -> (Stub, Option<Diagnostic>) {
    let invoke = |name: String, documentation: String| Stub {
        name,
        kind: StubKind::InvokeTrigger,
        documentation,
    };

    match trigger {
        Trigger::Call {
            class_name,
            operation_name,
        } => (
            invoke(
                naming::call_event_name(class_name, operation_name),
                format!(
                    "Must return true once operation \"{operation_name}\" has been invoked and \
                     completed on class \"{class_name}\", so the following transition can be asserted."
                ),
            ),
            None,
        ),
        Trigger::Change {
            event_name,
            condition: Some(body),
        } => (
            invoke(
                naming::expression_event_name(event_name, body),
                format!(
                    "Must return true once condition \"{body}\" of change event \"{event_name}\" \
                     has been forced to hold, so the following transition can be asserted."
                ),
            ),
            None,
        ),
        Trigger::Change {
            event_name,
            condition: None,
        } => (
            generated_event(event_name),
            Some(Diagnostic::MissingChangeExpression {
                event: event_name.clone(),
            }),
        ),
        Trigger::Time {
            event_name,
            when: Some(expression),
        } => (
            invoke(
                naming::expression_event_name(event_name, expression),
                format!(
                    "Must return true once time event \"{event_name}\" with expression \
                     \"{expression}\" has fired, so the following transition can be asserted."
                ),
            ),
            None,
        ),
        Trigger::Time {
            event_name,
            when: None,
        } => (
            generated_event(event_name),
            Some(Diagnostic::MissingTimeExpression {
                event: event_name.clone(),
            }),
        ),
        Trigger::Other { event_name, kind } => (
            invoke(
                naming::other_event_name(event_name),
                format!(
                    "Event kind \"{kind}\" has no dedicated stub. Must ensure event \
                     \"{event_name}\" occurs, so the following transition can be asserted."
                ),
            ),
            Some(Diagnostic::UnsupportedEventKind {
                event: event_name.clone(),
                kind: kind.clone(),
            }),
        ),
    }
}

fn generated_event(event_name: &str) -> Stub {
    Stub {
        name: naming::generated_event_name(event_name),
        kind: StubKind::InvokeTrigger,
        documentation: format!(
            "Must return true once event \"{event_name}\" has been generated. \
             The model gives no expression for it."
        ),
    }
}

/// Where in the traversal a stub was derived: the continuation's path and
/// the index of the step the stub fills.
///
/// Two raw forms can share a canonical name (`x>0` and `x > 0`). The stored
/// entry is always the one derived at the lowest origin, so its contents do
/// not depend on which continuation got there first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct StubOrigin {
    pub path: PathId,
    pub step: usize,
}

impl StubOrigin {
    pub fn new(path: PathId, step: usize) -> Self {
        Self { path, step }
    }
}

/// Result of [`StubRegistry::get_or_create`].
#[derive(Debug, Clone)]
pub struct Resolved {
    /// The entry stored for the canonical name once this call returns.
    pub stub: Arc<Stub>,
    pub diagnostic: Option<Diagnostic>,
    /// Whether this call created the entry for the name.
    pub inserted: bool,
}

#[derive(Debug)]
struct Registered {
    origin: StubOrigin,
    stub: Arc<Stub>,
}

/// Create-once store of stubs keyed by canonical name.
#[derive(Debug, Default)]
pub struct StubRegistry {
    stubs: Mutex<BTreeMap<String, Registered>>,
}

impl StubRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomic insert-if-absent. Concurrent callers deriving the same name all
    /// share one entry; when their raw forms differ, the derivation with the
    /// lowest origin supplies the stored data.
    pub fn get_or_create(&self, origin: &StubOrigin, source: StubSource<'_>) -> Resolved {
        let (derived, diagnostic) = Stub::derive(source);
        let mut stubs = self
            .stubs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let (stub, inserted) = match stubs.entry(derived.name.clone()) {
            btree_map::Entry::Vacant(slot) => {
                let stub = Arc::new(derived);
                slot.insert(Registered {
                    origin: origin.clone(),
                    stub: Arc::clone(&stub),
                });
                (stub, true)
            }
            btree_map::Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();
                if *origin < entry.origin {
                    entry.origin = origin.clone();
                    if *entry.stub != derived {
                        entry.stub = Arc::new(derived);
                    }
                }
                (Arc::clone(&entry.stub), false)
            }
        };
        Resolved {
            stub,
            diagnostic,
            inserted,
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Stub>> {
        self.stubs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .map(|entry| Arc::clone(&entry.stub))
    }

    pub fn len(&self) -> usize {
        self.stubs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All stubs, grouped by kind and then ordered by name.
    pub fn snapshot(&self) -> Vec<Arc<Stub>> {
        let mut all: Vec<Arc<Stub>> = self
            .stubs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .values()
            .map(|entry| Arc::clone(&entry.stub))
            .collect();
        all.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.name.cmp(&b.name)));
        all
    }
}

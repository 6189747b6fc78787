//! Non-fatal model findings.
//!
//! Each of these accompanies a skipped guard, an abandoned path, or a
//! fallback stub name. None of them stop generation of the remaining plans.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::plan::PathId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Diagnostic {
    #[error("State '{state}' is not final and has no outgoing transitions. All state machine flows must reach a final state")]
    ModelIncomplete { state: String },

    #[error("Guard condition for transition '{transition}' from state '{state}' is empty")]
    EmptyGuardExpression { state: String, transition: String },

    #[error("Event kind '{kind}' of event '{event}' is not supported; using a generic invocation stub")]
    UnsupportedEventKind { event: String, kind: String },

    #[error("State '{state}' has no target state on transition '{transition}'")]
    MissingTarget { state: String, transition: String },

    #[error("Change event '{event}' has no condition expression")]
    MissingChangeExpression { event: String },

    #[error("Time event '{event}' has no when expression")]
    MissingTimeExpression { event: String },
}

/// Receiver for diagnostics raised during traversal.
///
/// Called synchronously from whichever continuation hit the condition, so
/// implementations must tolerate concurrent callers.
pub trait DiagnosticSink: Sync {
    fn report(&self, origin: &PathId, diagnostic: Diagnostic);
}

/// Sink that buffers everything it receives.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    entries: Mutex<Vec<(PathId, u64, Diagnostic)>>,
    sequence: AtomicU64,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Diagnostics with their origin path, ordered by path and then by
    /// arrival. A single path is only ever extended by one continuation, so
    /// this order does not depend on scheduling.
    pub fn into_entries(self) -> Vec<(PathId, Diagnostic)> {
        let mut entries = self
            .entries
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        entries.into_iter().map(|(path, _, d)| (path, d)).collect()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.into_entries().into_iter().map(|(_, d)| d).collect()
    }
}

impl DiagnosticSink for DiagnosticCollector {
    fn report(&self, origin: &PathId, diagnostic: Diagnostic) {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.push((origin.clone(), seq, diagnostic));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_orders_by_path_then_arrival() {
        let collector = DiagnosticCollector::new();
        let root = PathId::root();
        collector.report(
            &root.child(1),
            Diagnostic::ModelIncomplete {
                state: "late".into(),
            },
        );
        collector.report(
            &root.child(0),
            Diagnostic::MissingTimeExpression {
                event: "first".into(),
            },
        );
        collector.report(
            &root.child(0),
            Diagnostic::MissingChangeExpression {
                event: "second".into(),
            },
        );
        assert_eq!(collector.len(), 3);

        let diagnostics = collector.into_diagnostics();
        assert_eq!(
            diagnostics,
            vec![
                Diagnostic::MissingTimeExpression {
                    event: "first".into()
                },
                Diagnostic::MissingChangeExpression {
                    event: "second".into()
                },
                Diagnostic::ModelIncomplete {
                    state: "late".into()
                },
            ]
        );
    }

    #[test]
    fn test_messages_name_the_offender() {
        let d = Diagnostic::ModelIncomplete {
            state: "Stuck".into(),
        };
        assert!(d.to_string().contains("'Stuck' is not final"));
    }

    #[test]
    fn test_len_survives_poisoned_lock() {
        let collector = DiagnosticCollector::new();
        collector.report(
            &PathId::root(),
            Diagnostic::ModelIncomplete {
                state: "Stuck".into(),
            },
        );
        let poisoned = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = collector.entries.lock().unwrap();
            panic!("poison the collector");
        }));
        assert!(poisoned.is_err());
        assert!(collector.entries.is_poisoned());

        assert_eq!(collector.len(), 1);
        assert!(!collector.is_empty());
        assert_eq!(collector.into_diagnostics().len(), 1);
    }
}

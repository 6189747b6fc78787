//! Test-plan synthesis: walks a state graph, collects deduplicated stubs and
//! one closed plan per complete execution path.

pub mod context;
pub mod diagnostics;
pub mod expand;
pub mod naming;
pub mod plan;
pub mod stub;

pub use context::GenerationContext;
pub use diagnostics::{Diagnostic, DiagnosticCollector, DiagnosticSink};
pub use expand::{expand, ExpandError, ExpandOptions, Expander};
pub use plan::{NamedPlan, PathId, Plan, PlanBuilder, PlanRegistry, Step};
pub use stub::{Stub, StubKind, StubOrigin, StubRegistry, StubSource};

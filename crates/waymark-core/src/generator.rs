use std::sync::Arc;

use serde::Serialize;

use waymark_emit::{render_class, render_manifest};
use waymark_model::graph::StateGraph;
use waymark_model::parse::{parse_model, ParseError};
use waymark_model::validate::{validate_graph, ModelError};
use waymark_synth::expand::{expand, ExpandError, ExpandOptions};
use waymark_synth::{
    Diagnostic, DiagnosticCollector, DiagnosticSink, GenerationContext, NamedPlan, PathId, Stub,
};

use crate::config::GeneratorConfig;

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("Model parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Invalid model: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Model(Vec<ModelError>),

    #[error("Expansion error: {0}")]
    Expand(#[from] ExpandError),

    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Manifest serialization error: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Generation task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationStats {
    pub states: usize,
    pub transitions: usize,
    pub stubs: usize,
    pub plans: usize,
    pub diagnostics: usize,
}

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub model_name: String,
    /// Rendered abstract test-plan class.
    pub artifact: String,
    /// JSON manifest of the same stubs and plans.
    pub manifest: String,
    pub stubs: Vec<Arc<Stub>>,
    pub plans: Vec<NamedPlan>,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: GenerationStats,
}

/// Collects every diagnostic and also hands it to an outside sink.
struct Tee<'a> {
    collector: &'a DiagnosticCollector,
    forward: Option<&'a dyn DiagnosticSink>,
}

impl DiagnosticSink for Tee<'_> {
    fn report(&self, origin: &PathId, diagnostic: Diagnostic) {
        if let Some(forward) = self.forward {
            forward.report(origin, diagnostic.clone());
        }
        self.collector.report(origin, diagnostic);
    }
}

/// Turns state graphs into test-plan artifacts.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Parse a JSON model document and generate from it.
    pub fn generate_json(&self, json: &str) -> Result<GenerationOutput, GenerateError> {
        let limit = self.config.limits.max_model_json_bytes;
        if json.len() as u64 > limit {
            return Err(GenerateError::LimitExceeded(format!(
                "Model JSON too large ({} bytes, max {})",
                json.len(),
                limit
            )));
        }
        let doc = parse_model(json)?;
        let graph = StateGraph::from_document(&doc).map_err(GenerateError::Model)?;
        self.generate(&graph)
    }

    pub fn generate(&self, graph: &StateGraph) -> Result<GenerationOutput, GenerateError> {
        self.run(graph, None)
    }

    /// Like [`Generator::generate`], additionally forwarding each diagnostic
    /// to `sink` as it is raised.
    pub fn generate_with_sink(
        &self,
        graph: &StateGraph,
        sink: &dyn DiagnosticSink,
    ) -> Result<GenerationOutput, GenerateError> {
        self.run(graph, Some(sink))
    }

    /// Run [`Generator::generate`] on the blocking pool.
    pub async fn generate_async(&self, graph: StateGraph) -> Result<GenerationOutput, GenerateError> {
        let generator = self.clone();
        tokio::task::spawn_blocking(move || generator.generate(&graph)).await?
    }

    fn run(
        &self,
        graph: &StateGraph,
        forward: Option<&dyn DiagnosticSink>,
    ) -> Result<GenerationOutput, GenerateError> {
        self.check_limits(graph)?;
        validate_graph(graph).map_err(GenerateError::Model)?;

        let collector = DiagnosticCollector::new();
        let tee = Tee {
            collector: &collector,
            forward,
        };
        let ctx = GenerationContext::new(&tee).with_plan_limit(self.config.limits.max_plans);
        let options = ExpandOptions {
            parallel_branches: self.config.parallel_branches,
        };

        let expanded = match self.config.worker_threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()?;
                pool.install(|| expand(graph, &ctx, options))
            }
            None => expand(graph, &ctx, options),
        };
        match expanded {
            Err(ExpandError::PlanLimitExceeded(limit)) => {
                return Err(GenerateError::LimitExceeded(format!(
                    "Too many test plans (max {limit})"
                )));
            }
            other => other?,
        }

        let (stubs, plans) = ctx.finish();
        let diagnostics = collector.into_diagnostics();

        let artifact = render_class(&graph.name, &stubs, &plans, &self.config.emit);
        let manifest = render_manifest(&graph.name, &stubs, &plans)?;

        let stats = GenerationStats {
            states: graph.state_count(),
            transitions: graph.transition_count(),
            stubs: stubs.len(),
            plans: plans.len(),
            diagnostics: diagnostics.len(),
        };
        tracing::info!(
            model = %graph.name,
            plans = stats.plans,
            stubs = stats.stubs,
            diagnostics = stats.diagnostics,
            "test plan generated"
        );

        Ok(GenerationOutput {
            model_name: graph.name.clone(),
            artifact,
            manifest,
            stubs,
            plans,
            diagnostics,
            stats,
        })
    }

    fn check_limits(&self, graph: &StateGraph) -> Result<(), GenerateError> {
        let limits = &self.config.limits;
        if graph.state_count() > limits.max_states {
            return Err(GenerateError::LimitExceeded(format!(
                "Too many states ({}/{})",
                graph.state_count(),
                limits.max_states
            )));
        }
        if graph.transition_count() > limits.max_transitions {
            return Err(GenerateError::LimitExceeded(format!(
                "Too many transitions ({}/{})",
                graph.transition_count(),
                limits.max_transitions
            )));
        }
        Ok(())
    }
}

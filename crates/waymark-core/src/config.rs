//! Generator configuration and input limits.

use serde::{Deserialize, Serialize};

use waymark_emit::EmitOptions;

/// Configuration for a [`crate::Generator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Expand sibling branches concurrently.
    pub parallel_branches: bool,
    /// Size of a dedicated rayon pool. None = the global pool.
    pub worker_threads: Option<usize>,
    pub emit: EmitOptions,
    pub limits: InputLimits,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            parallel_branches: true,
            worker_threads: None,
            emit: EmitOptions::default(),
            limits: InputLimits::default(),
        }
    }
}

/// Caps on accepted models. Size caps are checked before expansion. Plan
/// count grows with the product of branch fan-outs, so it is capped while
/// expanding and the run fails as soon as it is crossed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputLimits {
    pub max_model_json_bytes: u64,
    pub max_states: usize,
    pub max_transitions: usize,
    pub max_plans: usize,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_model_json_bytes: 16 * 1024 * 1024, // 16 MB
            max_states: 10_000,
            max_transitions: 50_000,
            max_plans: 100_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: GeneratorConfig =
            serde_json::from_str(r#"{ "parallel_branches": false, "limits": { "max_states": 3 } }"#)
                .unwrap();
        assert!(!config.parallel_branches);
        assert_eq!(config.limits.max_states, 3);
        assert_eq!(config.limits.max_transitions, 50_000);
        assert_eq!(config.limits.max_plans, 100_000);
        assert_eq!(config.emit, EmitOptions::default());
    }
}

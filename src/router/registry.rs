//! Model capability descriptors.
//!
//! Static per-model metadata the scorer works from. The registry is built
//! once at startup and never mutated; runtime signals (load, history) live
//! elsewhere.

use serde::{Deserialize, Serialize};

use super::analysis::TaskType;

/// Static descriptor of a routable model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCapabilities {
    /// Provider-facing model identifier.
    pub name: String,
    /// Cost per token in USD.
    pub cost_per_token: f64,
    /// Maximum output tokens the model supports.
    pub max_tokens: u32,
    /// Free-form strength tags, for operators reading `/api/models`.
    pub strengths: Vec<String>,
    /// Relative speed, 1-10.
    pub speed_score: f64,
    /// Relative output quality, 1-10.
    pub quality_score: f64,
    /// Task types this model is a specialist for.
    pub specializations: Vec<TaskType>,
    /// Concurrency ceiling used by the load balancer.
    pub max_concurrent: u32,
}

impl ModelCapabilities {
    pub fn specializes_in(&self, task_type: TaskType) -> bool {
        self.specializations.contains(&task_type)
    }
}

/// Immutable, ordered collection of model descriptors. Enumeration order
/// is the tie-break order for equal scores, so it is part of the routing
/// contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRegistry {
    models: Vec<ModelCapabilities>,
}

impl ModelRegistry {
    pub fn new(models: Vec<ModelCapabilities>) -> Self {
        Self { models }
    }

    pub fn get(&self, name: &str) -> Option<&ModelCapabilities> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelCapabilities> {
        self.models.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.models.iter().map(|m| m.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl Default for ModelRegistry {
    /// The production model pool fronted by the platform's providers.
    fn default() -> Self {
        use TaskType::*;

        let model = |name: &str,
                     cost_per_token: f64,
                     max_tokens: u32,
                     strengths: &[&str],
                     speed_score: f64,
                     quality_score: f64,
                     specializations: Vec<TaskType>,
                     max_concurrent: u32| ModelCapabilities {
            name: name.to_string(),
            cost_per_token,
            max_tokens,
            strengths: strengths.iter().map(|s| s.to_string()).collect(),
            speed_score,
            quality_score,
            specializations,
            max_concurrent,
        };

        Self::new(vec![
            model(
                "gpt-4o",
                0.000_002_5,
                16384,
                &["reasoning", "code", "tool_use"],
                7.0,
                9.2,
                vec![CodeGeneration, Debugging, DataAnalysis],
                5,
            ),
            model(
                "gpt-4o-mini",
                0.000_000_15,
                16384,
                &["speed", "chat", "low_cost"],
                9.0,
                7.5,
                vec![GeneralChat],
                10,
            ),
            model(
                "claude-3-5-sonnet",
                0.000_003,
                16384,
                &["writing", "planning", "code"],
                6.5,
                9.6,
                vec![CreativeWriting, ProjectPlanning, CodeGeneration],
                5,
            ),
            model(
                "llama-3.3-70b",
                0.000_000_59,
                32768,
                &["speed", "open_weights"],
                8.5,
                8.0,
                vec![GeneralChat, CodeGeneration],
                8,
            ),
            model(
                "gemini-1.5-pro",
                0.000_001_25,
                32768,
                &["long_context", "analysis"],
                7.5,
                8.5,
                vec![DataAnalysis, ProjectPlanning],
                6,
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_lookup() {
        let registry = ModelRegistry::default();
        assert_eq!(registry.len(), 5);
        assert!(registry.contains("gpt-4o-mini"));
        assert!(!registry.contains("gpt-5"));

        let mini = registry.get("gpt-4o-mini").unwrap();
        assert_eq!(mini.speed_score, 9.0);
        assert!(mini.specializes_in(TaskType::GeneralChat));
        assert!(!mini.specializes_in(TaskType::Debugging));
    }

    #[test]
    fn test_fastest_and_highest_quality_models() {
        let registry = ModelRegistry::default();
        let fastest = registry
            .iter()
            .max_by(|a, b| a.speed_score.total_cmp(&b.speed_score))
            .unwrap();
        assert_eq!(fastest.name, "gpt-4o-mini");

        let best = registry
            .iter()
            .max_by(|a, b| a.quality_score.total_cmp(&b.quality_score))
            .unwrap();
        assert_eq!(best.name, "claude-3-5-sonnet");
    }
}

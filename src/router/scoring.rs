//! Candidate filtering and model scoring.
//!
//! Scores are additive and deterministic: specialization match, a
//! complexity-fit term, the historical performance score, minus the load
//! penalty. Sorting is stable, so equal scores keep registry order.

use super::analysis::{Complexity, TaskAnalysis};
use super::balance::LoadBalancer;
use super::history::PerformanceHistory;
use super::registry::{ModelCapabilities, ModelRegistry};

/// Weight applied when a model specializes in the analyzed task type.
const SPECIALIZATION_BONUS: f64 = 3.0;
/// Weight of the historical performance term.
const HISTORY_WEIGHT: f64 = 0.3;

/// Speed threshold that qualifies a model for simple tasks.
const SIMPLE_SPEED_FLOOR: f64 = 8.0;
/// Quality threshold that qualifies a model for expert tasks.
const EXPERT_QUALITY_FLOOR: f64 = 9.0;

/// A model name with its routing score, descending-sorted.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredModel {
    pub name: String,
    pub score: f64,
}

/// Stateless scorer over the registry plus runtime signals.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelScorer;

impl ModelScorer {
    pub fn new() -> Self {
        Self
    }

    /// Rank every viable model for this task, best first.
    pub fn rank(
        &self,
        registry: &ModelRegistry,
        analysis: &TaskAnalysis,
        history: &PerformanceHistory,
        balancer: &LoadBalancer,
    ) -> Vec<ScoredModel> {
        let candidates = self.filter_candidates(registry, analysis);

        let mut scored: Vec<ScoredModel> = candidates
            .iter()
            .map(|model| ScoredModel {
                name: model.name.clone(),
                score: self.score_model(model, analysis, history, balancer),
            })
            .collect();

        // Stable sort: ties keep registry enumeration order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored
    }

    /// A model qualifies by specialization, or by raw speed for simple
    /// tasks, or by raw quality for expert tasks. An empty result widens
    /// to the whole registry rather than failing the request.
    fn filter_candidates<'a>(
        &self,
        registry: &'a ModelRegistry,
        analysis: &TaskAnalysis,
    ) -> Vec<&'a ModelCapabilities> {
        let candidates: Vec<&ModelCapabilities> = registry
            .iter()
            .filter(|model| {
                model.specializes_in(analysis.task_type)
                    || (analysis.complexity == Complexity::Simple
                        && model.speed_score >= SIMPLE_SPEED_FLOOR)
                    || (analysis.complexity == Complexity::Expert
                        && model.quality_score >= EXPERT_QUALITY_FLOOR)
            })
            .collect();

        if candidates.is_empty() {
            registry.iter().collect()
        } else {
            candidates
        }
    }

    fn score_model(
        &self,
        model: &ModelCapabilities,
        analysis: &TaskAnalysis,
        history: &PerformanceHistory,
        balancer: &LoadBalancer,
    ) -> f64 {
        let mut score = 0.0;

        if model.specializes_in(analysis.task_type) {
            score += SPECIALIZATION_BONUS;
        }

        match analysis.complexity {
            Complexity::Simple => {
                score += model.speed_score * 0.4;
                score += (10.0 - model.cost_per_token * 1000.0) * 0.3;
            }
            Complexity::Expert => {
                score += model.quality_score * 0.5;
                score += model.max_tokens as f64 / 10000.0 * 0.2;
            }
            _ => {}
        }

        score += history.score(&model.name, analysis.task_type) * HISTORY_WEIGHT;
        score -= balancer.penalty(&model.name, model.max_concurrent);

        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::analysis::{TaskAnalyzer, TaskType};

    fn rank_for(task: &str) -> Vec<ScoredModel> {
        let registry = ModelRegistry::default();
        let analysis = TaskAnalyzer::new().analyze(task, 0);
        ModelScorer::new().rank(
            &registry,
            &analysis,
            &PerformanceHistory::new(),
            &LoadBalancer::new(),
        )
    }

    #[test]
    fn test_simple_chat_favors_fastest_model() {
        let ranked = rank_for("hello, what is 2+2");
        assert_eq!(ranked[0].name, "gpt-4o-mini");
    }

    #[test]
    fn test_expert_task_favors_highest_quality() {
        let ranked =
            rank_for("design a scalable distributed microservices architecture for enterprise");
        assert_eq!(ranked[0].name, "claude-3-5-sonnet");
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let first = rank_for("implement a parser function");
        let second = rank_for("implement a parser function");
        assert_eq!(first, second);
    }

    #[test]
    fn test_specialists_outrank_generalists() {
        let registry = ModelRegistry::default();
        let analysis = TaskAnalyzer::new().analyze("write a story", 0);
        assert_eq!(analysis.task_type, TaskType::CreativeWriting);

        let ranked = ModelScorer::new().rank(
            &registry,
            &analysis,
            &PerformanceHistory::new(),
            &LoadBalancer::new(),
        );
        // claude-3-5-sonnet is the only creative-writing specialist.
        assert_eq!(ranked[0].name, "claude-3-5-sonnet");
    }

    #[test]
    fn test_empty_filter_widens_to_all_models() {
        use crate::router::registry::ModelCapabilities;

        // No specialists, moderate complexity: the filter finds nothing
        // and must widen to the whole registry instead of failing.
        let generalist = |name: &str| ModelCapabilities {
            name: name.to_string(),
            cost_per_token: 0.000_001,
            max_tokens: 8192,
            strengths: vec![],
            speed_score: 5.0,
            quality_score: 5.0,
            specializations: vec![],
            max_concurrent: 4,
        };
        let registry = ModelRegistry::new(vec![generalist("alpha"), generalist("beta")]);

        let mut analysis = TaskAnalyzer::new().analyze("create a summary", 0);
        analysis.complexity = Complexity::Moderate;

        let ranked = ModelScorer::new().rank(
            &registry,
            &analysis,
            &PerformanceHistory::new(),
            &LoadBalancer::new(),
        );
        assert_eq!(ranked.len(), 2);
        // Identical scores: stable sort keeps registry order.
        assert_eq!(ranked[0].name, "alpha");
        assert_eq!(ranked[1].name, "beta");
    }

    #[test]
    fn test_load_penalty_reorders_equally_scored_models() {
        let registry = ModelRegistry::default();
        let analysis = TaskAnalyzer::new().analyze("hello, what is 2+2", 0);

        let mut balancer = LoadBalancer::new();
        let baseline = ModelScorer::new().rank(
            &registry,
            &analysis,
            &PerformanceHistory::new(),
            &balancer,
        );
        assert_eq!(baseline[0].name, "gpt-4o-mini");

        // Saturate the favorite; the penalty should hand the lead to the
        // runner-up.
        let ceiling = registry.get("gpt-4o-mini").unwrap().max_concurrent;
        for _ in 0..ceiling {
            balancer.acquire("gpt-4o-mini");
        }
        let loaded = ModelScorer::new().rank(
            &registry,
            &analysis,
            &PerformanceHistory::new(),
            &balancer,
        );
        assert_ne!(loaded[0].name, "gpt-4o-mini");
    }

    #[test]
    fn test_history_shifts_scores() {
        let registry = ModelRegistry::default();
        let analysis = TaskAnalyzer::new().analyze("implement a sorting function", 0);
        assert_eq!(analysis.task_type, TaskType::CodeGeneration);

        let mut history = PerformanceHistory::new();
        for _ in 0..10 {
            history.record_failure("gpt-4o", TaskType::CodeGeneration);
        }

        let neutral = ModelScorer::new().rank(
            &registry,
            &analysis,
            &PerformanceHistory::new(),
            &LoadBalancer::new(),
        );
        let punished = ModelScorer::new().rank(
            &registry,
            &analysis,
            &history,
            &LoadBalancer::new(),
        );

        let score_of = |ranked: &[ScoredModel], name: &str| {
            ranked.iter().find(|m| m.name == name).unwrap().score
        };
        assert!(score_of(&punished, "gpt-4o") < score_of(&neutral, "gpt-4o"));
    }
}

//! Soft load balancing over in-flight call counters.
//!
//! Counters only ever feed a scoring penalty and a "first model with
//! headroom" pick: a saturated model is deprioritized, never refused.
//! The router always gets an answer even when the whole pool is at its
//! ceiling.

use std::collections::HashMap;

use super::registry::ModelRegistry;
use super::scoring::ScoredModel;

/// Scale factor mapping a full load ratio to the scoring deduction.
const PENALTY_SCALE: f64 = 2.0;

/// In-flight call tracking per model.
#[derive(Debug, Default)]
pub struct LoadBalancer {
    loads: HashMap<String, u32>,
}

impl LoadBalancer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a call against `model` as started.
    pub fn acquire(&mut self, model: &str) {
        *self.loads.entry(model.to_string()).or_insert(0) += 1;
    }

    /// Mark a call against `model` as finished.
    pub fn release(&mut self, model: &str) {
        if let Some(count) = self.loads.get_mut(model) {
            *count = count.saturating_sub(1);
        }
    }

    pub fn current_load(&self, model: &str) -> u32 {
        self.loads.get(model).copied().unwrap_or(0)
    }

    /// Scoring deduction in `[0, PENALTY_SCALE]`, proportional to how full
    /// the model's concurrency ceiling is.
    pub fn penalty(&self, model: &str, max_concurrent: u32) -> f64 {
        if max_concurrent == 0 {
            return PENALTY_SCALE;
        }
        let ratio = self.current_load(model) as f64 / max_concurrent as f64;
        ratio.min(1.0) * PENALTY_SCALE
    }

    /// First model in score order with spare capacity. When every model is
    /// saturated the top-scored model is returned anyway.
    pub fn select_available(
        &self,
        scored: &[ScoredModel],
        registry: &ModelRegistry,
    ) -> Option<String> {
        for candidate in scored {
            let ceiling = registry
                .get(&candidate.name)
                .map(|m| m.max_concurrent)
                .unwrap_or(0);
            if self.current_load(&candidate.name) < ceiling {
                return Some(candidate.name.clone());
            }
        }
        scored.first().map(|c| c.name.clone())
    }

    /// Snapshot of non-zero counters, for the stats endpoint.
    pub fn snapshot(&self) -> HashMap<String, u32> {
        self.loads
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(name, count)| (name.clone(), *count))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(names: &[&str]) -> Vec<ScoredModel> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| ScoredModel {
                name: name.to_string(),
                score: 10.0 - i as f64,
            })
            .collect()
    }

    #[test]
    fn test_penalty_monotone_in_load() {
        let mut balancer = LoadBalancer::new();
        let mut last = balancer.penalty("gpt-4o", 5);
        assert_eq!(last, 0.0);
        for _ in 0..8 {
            balancer.acquire("gpt-4o");
            let penalty = balancer.penalty("gpt-4o", 5);
            assert!(penalty >= last);
            last = penalty;
        }
        // Clamped at the scale even past the ceiling.
        assert_eq!(last, PENALTY_SCALE);
    }

    #[test]
    fn test_release_never_underflows() {
        let mut balancer = LoadBalancer::new();
        balancer.release("gpt-4o");
        assert_eq!(balancer.current_load("gpt-4o"), 0);
        balancer.acquire("gpt-4o");
        balancer.release("gpt-4o");
        balancer.release("gpt-4o");
        assert_eq!(balancer.current_load("gpt-4o"), 0);
    }

    #[test]
    fn test_select_skips_saturated_models() {
        let registry = ModelRegistry::default();
        let mut balancer = LoadBalancer::new();
        let ceiling = registry.get("gpt-4o").unwrap().max_concurrent;
        for _ in 0..ceiling {
            balancer.acquire("gpt-4o");
        }
        let pick = balancer.select_available(&scored(&["gpt-4o", "gpt-4o-mini"]), &registry);
        assert_eq!(pick.as_deref(), Some("gpt-4o-mini"));
    }

    #[test]
    fn test_select_falls_back_to_top_when_all_saturated() {
        let registry = ModelRegistry::default();
        let mut balancer = LoadBalancer::new();
        for name in ["gpt-4o", "gpt-4o-mini"] {
            let ceiling = registry.get(name).unwrap().max_concurrent;
            for _ in 0..ceiling {
                balancer.acquire(name);
            }
        }
        let pick = balancer.select_available(&scored(&["gpt-4o", "gpt-4o-mini"]), &registry);
        assert_eq!(pick.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn test_select_on_empty_candidates() {
        let registry = ModelRegistry::default();
        let balancer = LoadBalancer::new();
        assert_eq!(balancer.select_available(&[], &registry), None);
    }
}

//! Per-(model, task type) performance history.
//!
//! Every call attempt lands here, success or failure. Lifetime counters
//! are two integers per pair; the per-call detail lives in a fixed-size
//! sliding window so the map cannot grow without bound no matter how long
//! the process runs.

use std::collections::{HashMap, VecDeque};

use serde::Serialize;

use super::analysis::TaskType;

/// Score reported for pairs with no recorded calls.
pub const NEUTRAL_SCORE: f64 = 5.0;

/// Samples kept per (model, task type) pair.
const WINDOW_SIZE: usize = 50;

/// One call attempt. Failed attempts carry zero latency and zero quality.
#[derive(Debug, Clone, Copy)]
struct CallSample {
    success: bool,
    latency_secs: f64,
    quality: f64,
}

#[derive(Debug, Default)]
struct PairStats {
    total_calls: u64,
    successful_calls: u64,
    window: VecDeque<CallSample>,
}

impl PairStats {
    fn push(&mut self, sample: CallSample) {
        self.total_calls += 1;
        if sample.success {
            self.successful_calls += 1;
        }
        if self.window.len() == WINDOW_SIZE {
            self.window.pop_front();
        }
        self.window.push_back(sample);
    }

    fn success_rate(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        let ok = self.window.iter().filter(|s| s.success).count();
        ok as f64 / self.window.len() as f64
    }

    fn avg_latency(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.window.iter().map(|s| s.latency_secs).sum::<f64>() / self.window.len() as f64
    }

    fn avg_quality(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.window.iter().map(|s| s.quality).sum::<f64>() / self.window.len() as f64
    }

    /// Blended 0-10 score: recent reliability plus recent quality.
    fn score(&self) -> f64 {
        if self.window.is_empty() {
            return NEUTRAL_SCORE;
        }
        self.success_rate() * 5.0 + self.avg_quality() * 0.5
    }
}

/// Snapshot row for the stats endpoint and logs.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSummary {
    pub model: String,
    pub task_type: TaskType,
    pub total_calls: u64,
    pub successful_calls: u64,
    pub success_rate: f64,
    pub avg_latency_secs: f64,
    pub avg_quality: f64,
    pub score: f64,
}

/// Windowed call history for all (model, task type) pairs.
#[derive(Debug, Default)]
pub struct PerformanceHistory {
    entries: HashMap<(String, TaskType), PairStats>,
}

impl PerformanceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(
        &mut self,
        model: &str,
        task_type: TaskType,
        latency_secs: f64,
        quality: f64,
    ) {
        self.entry(model, task_type).push(CallSample {
            success: true,
            latency_secs,
            quality: quality.clamp(0.0, 10.0),
        });
    }

    pub fn record_failure(&mut self, model: &str, task_type: TaskType) {
        self.entry(model, task_type).push(CallSample {
            success: false,
            latency_secs: 0.0,
            quality: 0.0,
        });
    }

    /// Historical score for a pair, 0-10. Unseen pairs report
    /// [`NEUTRAL_SCORE`] so new models are neither favored nor punished.
    pub fn score(&self, model: &str, task_type: TaskType) -> f64 {
        self.entries
            .get(&(model.to_string(), task_type))
            .map(|s| s.score())
            .unwrap_or(NEUTRAL_SCORE)
    }

    pub fn summaries(&self) -> Vec<PerformanceSummary> {
        let mut rows: Vec<PerformanceSummary> = self
            .entries
            .iter()
            .map(|((model, task_type), stats)| PerformanceSummary {
                model: model.clone(),
                task_type: *task_type,
                total_calls: stats.total_calls,
                successful_calls: stats.successful_calls,
                success_rate: stats.success_rate(),
                avg_latency_secs: stats.avg_latency(),
                avg_quality: stats.avg_quality(),
                score: stats.score(),
            })
            .collect();
        rows.sort_by(|a, b| a.model.cmp(&b.model).then(a.task_type.to_string().cmp(&b.task_type.to_string())));
        rows
    }

    fn entry(&mut self, model: &str, task_type: TaskType) -> &mut PairStats {
        self.entries
            .entry((model.to_string(), task_type))
            .or_default()
    }
}

//! Intelligent model routing.
//!
//! Routes free-text tasks to the best available model and degrades
//! gracefully when providers misbehave:
//!
//! ```text
//! request ──▶ ResponseCache ──hit──▶ cached answer
//!                 │ miss
//!                 ▼
//!           TaskAnalyzer ──▶ ModelScorer ──▶ LoadBalancer
//!                 │                               │
//!                 ▼                               ▼
//!           fallback chain ◀──────────── primary model
//!                 │  try in order, per-call deadline
//!                 ▼
//!           first success is recorded, cached, returned
//! ```
//!
//! A request never surfaces an `Err`: if the whole chain fails the caller
//! gets a structured outcome with `model_used == "fallback"` and an error
//! string, which the HTTP layer forwards as-is.

pub mod analysis;
pub mod balance;
pub mod cache;
pub mod history;
pub mod registry;
pub mod scoring;

pub use analysis::{Complexity, TaskAnalysis, TaskAnalyzer, TaskType};
pub use balance::LoadBalancer;
pub use cache::{CachedResponse, ResponseCache};
pub use history::{PerformanceHistory, PerformanceSummary};
pub use registry::{ModelCapabilities, ModelRegistry};
pub use scoring::{ModelScorer, ScoredModel};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::llm::{ChatMessage, ChatOptions, ModelClient};

/// Model used when the registry is empty or selection has nothing to say:
/// the fastest, cheapest member of the default pool.
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Ordered retry lists per primary model. The primary itself is always
/// the first entry.
const FALLBACK_CHAINS: &[(&str, &[&str])] = &[
    ("gpt-4o", &["gpt-4o", "claude-3-5-sonnet", "llama-3.3-70b"]),
    ("gpt-4o-mini", &["gpt-4o-mini", "llama-3.3-70b", "gpt-4o"]),
    (
        "claude-3-5-sonnet",
        &["claude-3-5-sonnet", "gpt-4o", "gemini-1.5-pro"],
    ),
    ("llama-3.3-70b", &["llama-3.3-70b", "gpt-4o-mini", "gpt-4o"]),
    (
        "gemini-1.5-pro",
        &["gemini-1.5-pro", "gpt-4o", "claude-3-5-sonnet"],
    ),
];

/// Chain used when the primary has no predefined entry.
const DEFAULT_CHAIN: &[&str] = &["gpt-4o-mini", "gpt-4o", "claude-3-5-sonnet"];

/// Tuning knobs for [`AiRouter`].
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Response cache capacity in entries.
    pub cache_max_entries: usize,
    /// How long a cached response stays valid.
    pub cache_ttl: Duration,
    /// Deadline for a single model call, fallback included.
    pub call_timeout: Duration,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            cache_max_entries: 1000,
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            call_timeout: Duration::from_secs(30),
        }
    }
}

/// Result of one routed request. Always produced, even on total failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteOutcome {
    pub response: String,
    /// Model that actually answered, or `"fallback"` when none did.
    pub model_used: String,
    /// Wall-clock seconds for the winning call. Absent on cache hits and
    /// chain exhaustion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Point-in-time router internals, for operators.
#[derive(Debug, Clone, Serialize)]
pub struct RouterStats {
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub total_models: usize,
    pub cache_entries: usize,
    /// Models with calls currently in flight.
    pub active_loads: HashMap<String, u32>,
    pub performance: Vec<PerformanceSummary>,
}

/// The routing engine. Owns every piece of mutable routing state; callers
/// share one instance behind an [`Arc`].
pub struct AiRouter {
    registry: ModelRegistry,
    analyzer: TaskAnalyzer,
    scorer: ModelScorer,
    client: Arc<dyn ModelClient>,
    balancer: Mutex<LoadBalancer>,
    history: Mutex<PerformanceHistory>,
    cache: Mutex<ResponseCache>,
    call_timeout: Duration,
}

/// Shared router handle.
pub type SharedRouter = Arc<AiRouter>;

impl AiRouter {
    pub fn new(
        registry: ModelRegistry,
        client: Arc<dyn ModelClient>,
        options: RouterOptions,
    ) -> Self {
        Self {
            registry,
            analyzer: TaskAnalyzer::new(),
            scorer: ModelScorer::new(),
            client,
            balancer: Mutex::new(LoadBalancer::new()),
            history: Mutex::new(PerformanceHistory::new()),
            cache: Mutex::new(ResponseCache::new(options.cache_max_entries, options.cache_ttl)),
            call_timeout: options.call_timeout,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Classify a task without routing it.
    pub fn analyze(&self, task: &str, context: Option<&serde_json::Value>) -> TaskAnalysis {
        let context_size = context.map(|c| c.to_string().len()).unwrap_or(0);
        self.analyzer.analyze(task, context_size)
    }

    /// Pick the best model for a task right now. Selection cannot fail:
    /// an empty registry degrades to the default model.
    pub async fn select_optimal_model(
        &self,
        task: &str,
        context: Option<&serde_json::Value>,
    ) -> String {
        let analysis = self.analyze(task, context);
        self.select_for(&analysis).await
    }

    async fn select_for(&self, analysis: &TaskAnalysis) -> String {
        if self.registry.is_empty() {
            tracing::warn!("Model registry is empty, using default model");
            return DEFAULT_MODEL.to_string();
        }

        let balancer = self.balancer.lock().await;
        let history = self.history.lock().await;
        let ranked = self
            .scorer
            .rank(&self.registry, analysis, &history, &balancer);
        let selected = balancer
            .select_available(&ranked, &self.registry)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        tracing::debug!(
            "Selected {} for {} task ({})",
            selected,
            analysis.task_type,
            analysis.complexity
        );
        selected
    }

    /// Route a task through the cache, the selection pipeline, and the
    /// fallback chain. Never returns an error: total failure is reported
    /// inside the outcome.
    pub async fn process_with_fallback(
        &self,
        task: &str,
        context: Option<&serde_json::Value>,
    ) -> RouteOutcome {
        let cache_key = ResponseCache::generate_key(task, context);

        if let Some(hit) = self.cache.lock().await.get(&cache_key) {
            tracing::debug!("Cache hit for task (model {})", hit.model_used);
            return RouteOutcome {
                response: hit.response,
                model_used: hit.model_used,
                processing_time: None,
                cached: true,
                error: None,
            };
        }

        let analysis = self.analyze(task, context);
        let primary = self.select_for(&analysis).await;
        let chain = fallback_chain(&primary);
        let messages = build_messages(task, context);

        for model in &chain {
            self.balancer.lock().await.acquire(model);
            let start = Instant::now();
            let result = tokio::time::timeout(
                self.call_timeout,
                self.client
                    .chat_completion(model, &messages, ChatOptions::default()),
            )
            .await;
            let elapsed = start.elapsed().as_secs_f64();
            self.balancer.lock().await.release(model);

            match result {
                Ok(Ok(reply)) => {
                    let quality = estimate_quality(&reply.content);
                    self.history.lock().await.record_success(
                        model,
                        analysis.task_type,
                        elapsed,
                        quality,
                    );
                    self.cache.lock().await.insert(
                        cache_key,
                        CachedResponse {
                            response: reply.content.clone(),
                            model_used: model.clone(),
                        },
                    );
                    tracing::info!(
                        "Task served by {} in {:.2}s ({} task)",
                        model,
                        elapsed,
                        analysis.task_type
                    );
                    return RouteOutcome {
                        response: reply.content,
                        model_used: model.clone(),
                        processing_time: Some(elapsed),
                        cached: false,
                        error: None,
                    };
                }
                Ok(Err(e)) => {
                    tracing::warn!("Model {} failed, trying next in chain: {}", model, e);
                    self.history
                        .lock()
                        .await
                        .record_failure(model, analysis.task_type);
                }
                Err(_) => {
                    tracing::warn!(
                        "Model {} timed out after {:?}, trying next in chain",
                        model,
                        self.call_timeout
                    );
                    self.history
                        .lock()
                        .await
                        .record_failure(model, analysis.task_type);
                }
            }
        }

        tracing::error!("All models in chain {:?} failed", chain);
        RouteOutcome {
            response: "I apologize, but I'm unable to process your request right now. \
                       Please try again in a moment."
                .to_string(),
            model_used: "fallback".to_string(),
            processing_time: None,
            cached: false,
            error: Some(format!("all {} models in the fallback chain failed", chain.len())),
        }
    }

    /// Snapshot of router internals.
    pub async fn stats(&self) -> RouterStats {
        RouterStats {
            generated_at: chrono::Utc::now(),
            total_models: self.registry.len(),
            cache_entries: self.cache.lock().await.len(),
            active_loads: self.balancer.lock().await.snapshot(),
            performance: self.history.lock().await.summaries(),
        }
    }
}

/// The ordered list of models to try for a primary.
fn fallback_chain(primary: &str) -> Vec<String> {
    FALLBACK_CHAINS
        .iter()
        .find(|(name, _)| *name == primary)
        .map(|(_, chain)| *chain)
        .unwrap_or(DEFAULT_CHAIN)
        .iter()
        .map(|m| m.to_string())
        .collect()
}

fn build_messages(task: &str, context: Option<&serde_json::Value>) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);
    if let Some(context) = context {
        messages.push(ChatMessage::system(format!("Request context: {}", context)));
    }
    messages.push(ChatMessage::user(task));
    messages
}

/// Crude, length-saturating quality estimate feeding the performance
/// history.
fn estimate_quality(content: &str) -> f64 {
    let mut quality = 4.0 + content.len() as f64 / 500.0;
    if content.contains("```") {
        quality += 1.0;
    }
    quality.min(10.0)
}

//! Task classification.
//!
//! Derives a [`TaskAnalysis`] from free-form task text: what kind of work
//! is being requested and how heavy it is. Classification is keyword-based
//! and fully deterministic; there are no external calls and no fallible
//! paths. Unrecognized input degrades to [`TaskType::GeneralChat`] and
//! [`Complexity::Simple`].

use serde::{Deserialize, Serialize};

/// Kinds of tasks the router can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Write new code from a description
    CodeGeneration,
    /// Diagnose and fix broken code
    Debugging,
    /// Prose, marketing copy, brainstorming
    CreativeWriting,
    /// Work over datasets, statistics, trends
    DataAnalysis,
    /// Conversation with no specialist angle
    GeneralChat,
    /// Roadmaps, architecture, project structure
    ProjectPlanning,
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CodeGeneration => write!(f, "code_generation"),
            Self::Debugging => write!(f, "debugging"),
            Self::CreativeWriting => write!(f, "creative_writing"),
            Self::DataAnalysis => write!(f, "data_analysis"),
            Self::GeneralChat => write!(f, "general_chat"),
            Self::ProjectPlanning => write!(f, "project_planning"),
        }
    }
}

/// How demanding a task is, from throwaway questions to systems design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
    Expert,
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simple => write!(f, "simple"),
            Self::Moderate => write!(f, "moderate"),
            Self::Complex => write!(f, "complex"),
            Self::Expert => write!(f, "expert"),
        }
    }
}

/// Per-request classification result. Lives only for the duration of one
/// routing decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAnalysis {
    pub task_type: TaskType,
    pub complexity: Complexity,
    /// Rough token estimate for the task plus its context.
    pub estimated_tokens: usize,
    pub needs_creativity: bool,
    pub needs_code: bool,
    /// Length in characters of the serialized request context.
    pub context_size: usize,
}

/// Keyword sets for task type detection, tested in priority order;
/// the first set with a hit wins.
const TYPE_KEYWORDS: &[(TaskType, &[&str])] = &[
    (
        TaskType::CodeGeneration,
        &[
            "code", "function", "implement", "script", "program", "class", "algorithm", "endpoint",
        ],
    ),
    (
        TaskType::Debugging,
        &[
            "debug",
            "error",
            "fix",
            "bug",
            "broken",
            "crash",
            "traceback",
            "exception",
        ],
    ),
    (
        TaskType::CreativeWriting,
        &[
            "story",
            "poem",
            "creative",
            "blog",
            "article",
            "marketing",
            "slogan",
            "brainstorm",
        ],
    ),
    (
        TaskType::DataAnalysis,
        &[
            "data",
            "analyze",
            "analysis",
            "csv",
            "statistics",
            "chart",
            "dataset",
            "trends",
        ],
    ),
    (
        TaskType::ProjectPlanning,
        &[
            "plan",
            "roadmap",
            "architecture",
            "design",
            "organize",
            "milestone",
            "strategy",
            "structure",
        ],
    ),
];

/// Keyword lists per complexity tier. Enumeration order doubles as the
/// tie-break: the first tier with the highest score wins, so an input
/// with no hits at all lands on `Simple`.
const COMPLEXITY_KEYWORDS: &[(Complexity, &[&str])] = &[
    (
        Complexity::Simple,
        &["hello", "what is", "simple", "quick", "small", "explain"],
    ),
    (
        Complexity::Moderate,
        &["create", "build", "write", "make", "generate", "modify"],
    ),
    (
        Complexity::Complex,
        &[
            "optimize",
            "integrate",
            "refactor",
            "multiple",
            "system",
            "async",
            "pipeline",
        ],
    ),
    (
        Complexity::Expert,
        &[
            "architecture",
            "distributed",
            "microservices",
            "scalable",
            "enterprise",
            "machine learning",
            "concurrency",
        ],
    ),
];

/// Context sizes above these thresholds bump the complex/moderate scores.
const LARGE_CONTEXT_CHARS: usize = 5000;
const MEDIUM_CONTEXT_CHARS: usize = 2000;

/// Stateless task classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskAnalyzer;

impl TaskAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Classify a task. `context_size` is the character length of the
    /// serialized request context (0 when absent).
    pub fn analyze(&self, task: &str, context_size: usize) -> TaskAnalysis {
        let lowered = task.to_lowercase();

        let task_type = self.classify_type(&lowered);
        let complexity = self.classify_complexity(&lowered, context_size);

        TaskAnalysis {
            task_type,
            complexity,
            estimated_tokens: (task.len() + context_size) / 4,
            needs_creativity: task_type == TaskType::CreativeWriting,
            needs_code: matches!(task_type, TaskType::CodeGeneration | TaskType::Debugging),
            context_size,
        }
    }

    fn classify_type(&self, lowered: &str) -> TaskType {
        for (task_type, keywords) in TYPE_KEYWORDS {
            if keywords.iter().any(|k| lowered.contains(k)) {
                return *task_type;
            }
        }
        TaskType::GeneralChat
    }

    fn classify_complexity(&self, lowered: &str, context_size: usize) -> Complexity {
        let mut scores: Vec<(Complexity, usize)> = COMPLEXITY_KEYWORDS
            .iter()
            .map(|(tier, keywords)| {
                let hits = keywords.iter().filter(|k| lowered.contains(*k)).count();
                (*tier, hits)
            })
            .collect();

        // Large contexts push the tier up even when the wording is plain.
        if context_size > LARGE_CONTEXT_CHARS {
            bump(&mut scores, Complexity::Complex, 2);
        } else if context_size > MEDIUM_CONTEXT_CHARS {
            bump(&mut scores, Complexity::Moderate, 1);
        }

        let best = scores.iter().map(|(_, s)| *s).max().unwrap_or(0);
        scores
            .iter()
            .find(|(_, s)| *s == best)
            .map(|(tier, _)| *tier)
            .unwrap_or(Complexity::Simple)
    }
}

fn bump(scores: &mut [(Complexity, usize)], tier: Complexity, amount: usize) {
    if let Some(entry) = scores.iter_mut().find(|(t, _)| *t == tier) {
        entry.1 += amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_question_is_simple_chat() {
        let analysis = TaskAnalyzer::new().analyze("hello, what is 2+2", 0);
        assert_eq!(analysis.task_type, TaskType::GeneralChat);
        assert_eq!(analysis.complexity, Complexity::Simple);
        assert!(!analysis.needs_code);
        assert!(!analysis.needs_creativity);
    }

    #[test]
    fn test_architecture_task_is_expert_planning() {
        let analysis = TaskAnalyzer::new().analyze(
            "design a scalable distributed microservices architecture for enterprise",
            0,
        );
        assert_eq!(analysis.task_type, TaskType::ProjectPlanning);
        assert_eq!(analysis.complexity, Complexity::Expert);
    }

    #[test]
    fn test_type_priority_order_first_match_wins() {
        // "function" (code) and "error" (debug) both appear; code is
        // tested first.
        let analysis = TaskAnalyzer::new().analyze("function returns an error", 0);
        assert_eq!(analysis.task_type, TaskType::CodeGeneration);
        assert!(analysis.needs_code);
    }

    #[test]
    fn test_large_context_bumps_complexity() {
        let analyzer = TaskAnalyzer::new();
        let small = analyzer.analyze("summarize this", 0);
        assert_eq!(small.complexity, Complexity::Simple);

        let medium = analyzer.analyze("summarize this", 2500);
        assert_eq!(medium.complexity, Complexity::Moderate);

        let large = analyzer.analyze("summarize this", 6000);
        assert_eq!(large.complexity, Complexity::Complex);
    }

    #[test]
    fn test_deterministic_for_fixed_input() {
        let analyzer = TaskAnalyzer::new();
        let a = analyzer.analyze("refactor the async pipeline", 100);
        let b = analyzer.analyze("refactor the async pipeline", 100);
        assert_eq!(a.task_type, b.task_type);
        assert_eq!(a.complexity, b.complexity);
        assert_eq!(a.estimated_tokens, b.estimated_tokens);
    }

    #[test]
    fn test_token_estimate_includes_context() {
        let analysis = TaskAnalyzer::new().analyze("analyze the dataset", 400);
        assert_eq!(analysis.estimated_tokens, ("analyze the dataset".len() + 400) / 4);
        assert_eq!(analysis.context_size, 400);
    }
}

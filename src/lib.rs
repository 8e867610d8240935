//! # Aetherflow
//!
//! Backend routing engine for the Aether AI coding platform.
//!
//! Incoming tasks are classified, scored against the model pool, and
//! dispatched to the best available model with caching and fallback:
//!
//! ```text
//!        ┌────────────────────────────────────┐
//!        │              AiRouter              │
//!        │  analyze → score → balance → call  │
//!        └─────────────────┬──────────────────┘
//!                          │
//!                          ▼
//!                 ┌─────────────────┐
//!                 │   ModelClient   │
//!                 │  (Groq gateway) │
//!                 └─────────────────┘
//! ```
//!
//! ## Modules
//! - `router`: task analysis, scoring, load balancing, caching, fallback
//! - `llm`: upstream model client trait and the Groq implementation
//! - `api`: thin axum surface exposing the router over HTTP
//! - `config`: environment-driven configuration

pub mod api;
pub mod config;
pub mod llm;
pub mod router;

pub use config::Config;
pub use router::{AiRouter, RouteOutcome, SharedRouter};

//! HTTP API.

pub mod routes;

pub use routes::{serve, AppState};

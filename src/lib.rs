//! # mimir-client
//!
//! Data-access layer for the Mimir task manager.
//!
//! Provides typed operations over the Mimir REST API (tasks, graph,
//! connectors, health) with bounded retry, an automatic fall back to
//! deterministic mock data while the backend is unreachable, and a health
//! poller whose cadence follows the last observed status.

pub mod api;
pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod mocks;
pub mod model;
pub mod telemetry;

pub use api::Api;
pub use config::Config;
pub use error::{Error, Result};

//! Domain API facade.
//!
//! One method per backend capability. Each call decides between mock data and
//! the live backend, and none of them can fail: when the backend is
//! unreachable the caller gets the same value mock mode would have produced,
//! and the automatic fallback latch switches later calls to mocks until a live
//! call succeeds again. Only [`Api::get_health`] reports the outage, as
//! `unreachable`.

pub mod fallback;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::http::{RequestEngine, RequestOptions, ReqwestTransport, Transport};
use crate::mocks;
use crate::model::{
    ConnectResponse, Connector, ConnectorKind, ConnectorsResponse, Graph, GraphFilters, Health,
    HealthStatus, Horizon, Task, TaskActionResponse, TasksResponse, TestResponse,
};
use crate::telemetry::api::record_fallback_transition;
use crate::telemetry::metrics;
use opentelemetry::KeyValue;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub use fallback::FallbackLatch;

/// Per-request timeout of the default reqwest transport.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Typed client for the Mimir backend.
///
/// Cheap to clone; clones share the fallback latch.
#[derive(Debug, Clone)]
pub struct Api {
    engine: RequestEngine,
    use_mocks: bool,
    latch: Arc<FallbackLatch>,
}

impl Api {
    /// Client talking to `config.api_base_url` over reqwest.
    pub fn new(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(REQUEST_TIMEOUT)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: &Config, transport: Arc<dyn Transport>) -> Self {
        Self {
            engine: RequestEngine::new(config, transport),
            use_mocks: config.use_mocks,
            latch: Arc::new(FallbackLatch::new()),
        }
    }

    /// Explicit mock mode from configuration.
    pub fn is_explicit_mock(&self) -> bool {
        self.use_mocks
    }

    /// Automatic fallback currently engaged.
    pub fn is_auto_fallback(&self) -> bool {
        self.latch.is_engaged()
    }

    /// Whether the next domain call will be served from mock data.
    pub fn is_using_mocks(&self) -> bool {
        self.use_mocks || self.latch.is_engaged()
    }

    pub fn base_url(&self) -> &str {
        self.engine.base_url()
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    /// Tasks, optionally restricted to one horizon.
    ///
    /// The horizon filter is also applied locally, so every returned task is
    /// in the requested horizon.
    pub async fn list_tasks(&self, horizon: Option<Horizon>) -> Vec<Task> {
        if self.is_using_mocks() {
            return mocks::tasks(horizon);
        }

        let endpoint = match horizon {
            Some(h) => format!("/api/tasks?horizon={}", urlencoding::encode(h.as_str())),
            None => "/api/tasks".to_string(),
        };
        match self
            .live::<TasksResponse>("list_tasks", &endpoint, RequestOptions::get())
            .await
        {
            Some(resp) => match horizon {
                Some(h) => resp.tasks.into_iter().filter(|t| t.horizon == h).collect(),
                None => resp.tasks,
            },
            None => mocks::tasks(horizon),
        }
    }

    pub async fn complete_task(&self, id: &str) -> TaskActionResponse {
        self.task_action("complete_task", id, "complete").await
    }

    pub async fn undo_task(&self, id: &str) -> TaskActionResponse {
        self.task_action("undo_task", id, "undo").await
    }

    async fn task_action(&self, operation: &'static str, id: &str, action: &str) -> TaskActionResponse {
        if self.is_using_mocks() {
            return TaskActionResponse::succeeded();
        }

        let endpoint = format!("/api/tasks/{}/{action}", urlencoding::encode(id));
        self.live(operation, &endpoint, RequestOptions::post())
            .await
            .unwrap_or_else(TaskActionResponse::succeeded)
    }

    // -----------------------------------------------------------------------
    // Graph
    // -----------------------------------------------------------------------

    /// Task graph, optionally for a time window (e.g. "month").
    pub async fn get_graph(&self, window: Option<&str>) -> Graph {
        if self.is_using_mocks() {
            return mocks::graph();
        }

        let endpoint = match window {
            Some(w) => format!("/api/graph?window={}", urlencoding::encode(w)),
            None => "/api/graph".to_string(),
        };
        self.live("get_graph", &endpoint, RequestOptions::get())
            .await
            .unwrap_or_else(mocks::graph)
    }

    pub async fn graph_filters(&self) -> GraphFilters {
        if self.is_using_mocks() {
            return mocks::graph_filters();
        }

        self.live("graph_filters", "/api/graph/filters", RequestOptions::get())
            .await
            .unwrap_or_else(mocks::graph_filters)
    }

    // -----------------------------------------------------------------------
    // Connectors
    // -----------------------------------------------------------------------

    pub async fn list_connectors(&self) -> Vec<Connector> {
        if self.is_using_mocks() {
            return mocks::connectors();
        }

        match self
            .live::<ConnectorsResponse>("list_connectors", "/api/connectors", RequestOptions::get())
            .await
        {
            Some(resp) => resp.connectors,
            None => mocks::connectors(),
        }
    }

    /// Start connecting a connector. A live backend may answer with an
    /// `auth_url` the user has to visit.
    pub async fn connect_connector(&self, kind: ConnectorKind) -> ConnectResponse {
        let fallback = || ConnectResponse {
            auth_url: None,
            connector: Some(mocks::connector_for(kind)),
        };
        if self.is_using_mocks() {
            return fallback();
        }

        let endpoint = format!("/api/connectors/{kind}/connect");
        self.live("connect_connector", &endpoint, RequestOptions::post())
            .await
            .unwrap_or_else(fallback)
    }

    pub async fn test_connector(&self, kind: ConnectorKind) -> TestResponse {
        let fallback = || TestResponse {
            status: "ok".to_string(),
            connector: Some(mocks::connector_for(kind)),
        };
        if self.is_using_mocks() {
            return fallback();
        }

        let endpoint = format!("/api/connectors/{kind}/test");
        self.live("test_connector", &endpoint, RequestOptions::post())
            .await
            .unwrap_or_else(fallback)
    }

    /// Test every known connector in turn.
    pub async fn test_all_connectors(&self) -> Vec<(ConnectorKind, TestResponse)> {
        let mut results = Vec::new();
        for connector in self.list_connectors().await {
            let outcome = self.test_connector(connector.kind).await;
            results.push((connector.kind, outcome));
        }
        results
    }

    // -----------------------------------------------------------------------
    // Health
    // -----------------------------------------------------------------------

    /// Backend health. Never fails and never retries.
    ///
    /// Only explicit mock mode short-circuits this call; while the automatic
    /// fallback is engaged it still goes to the network so that a recovered
    /// backend releases the latch.
    pub async fn get_health(&self) -> Health {
        if self.use_mocks {
            return Health {
                status: HealthStatus::Ok,
                version: Some(mocks::MOCK_VERSION.to_string()),
            };
        }

        match self
            .engine
            .request::<Health>("/api/health", RequestOptions::get().retry(0))
            .await
        {
            Ok(health) => {
                self.mark_live("get_health");
                health
            }
            Err(e) => {
                self.mark_failed("get_health", &e);
                Health::unreachable()
            }
        }
    }

    // -----------------------------------------------------------------------
    // Fallback bookkeeping
    // -----------------------------------------------------------------------

    /// Run a live request, updating the latch. `None` means "use the fallback".
    ///
    /// A 2xx reply without a usable payload (e.g. `204 No Content`) still
    /// proves the backend is reachable: the caller gets the fallback value
    /// but the latch is released, not engaged.
    async fn live<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        endpoint: &str,
        options: RequestOptions,
    ) -> Option<T> {
        match self.engine.request::<T>(endpoint, options).await {
            Ok(value) => {
                self.mark_live(operation);
                Some(value)
            }
            Err(e) if e.is_retryable() => {
                self.mark_failed(operation, &e);
                None
            }
            Err(e) => {
                debug!(operation, error = %e, "reply carried no usable payload");
                self.mark_live(operation);
                None
            }
        }
    }

    fn mark_live(&self, operation: &'static str) {
        if self.latch.release() {
            info!(operation, "backend reachable again, leaving mock fallback");
            record_fallback_transition(&tracing::Span::current(), operation, "live");
            metrics::fallback_transitions().add(1, &[KeyValue::new("to", "live")]);
        }
    }

    fn mark_failed(&self, operation: &'static str, error: &Error) {
        if self.latch.engage() {
            warn!(operation, %error, "backend unreachable, falling back to mock data");
            record_fallback_transition(&tracing::Span::current(), operation, "mock");
            metrics::fallback_transitions().add(1, &[KeyValue::new("to", "mock")]);
        } else {
            debug!(operation, %error, "request failed while in mock fallback");
        }
    }
}

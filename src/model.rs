//! Core data model.
//!
//! Tasks live in exactly one horizon at a time and carry a status that changes
//! independently of it. Connectors link tasks to the third-party systems they
//! came from. Field names follow the backend's camelCase JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

pub type TaskId = String;

/// Generate `Display` and `FromStr` from the wire spelling of each variant.
macro_rules! wire_enum {
    ($ty:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $wire),+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($ty::$variant),)+
                    other => Err(format!(
                        "invalid {}: '{other}' (expected one of: {})",
                        stringify!($ty),
                        [$($wire),+].join(", ")
                    )),
                }
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// Time bucket a task is grouped under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
    Today,
    Week,
    Month,
    #[serde(rename = "past7d")]
    Past7d,
}

wire_enum!(Horizon {
    Today => "today",
    Week => "week",
    Month => "month",
    Past7d => "past7d",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
    Scheduled,
}

wire_enum!(TaskStatus {
    Todo => "todo",
    InProgress => "in_progress",
    Done => "done",
    Scheduled => "scheduled",
});

/// Third-party system a task or connector belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorKind {
    Jira,
    Gmail,
    Github,
}

wire_enum!(ConnectorKind {
    Jira => "jira",
    Gmail => "gmail",
    Github => "github",
});

/// Link to the item a task originated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRef {
    pub kind: ConnectorKind,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub horizon: Horizon,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<ExternalRef>,
    /// ISO-8601; may be empty for synthetic graph nodes.
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Tasks partitioned by horizon, in the order the focus list shows them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TasksByHorizon {
    pub today: Vec<Task>,
    pub week: Vec<Task>,
    pub month: Vec<Task>,
    #[serde(default)]
    pub past7d: Vec<Task>,
}

impl TasksByHorizon {
    pub fn group(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut grouped = Self::default();
        for task in tasks {
            grouped.bucket_mut(task.horizon).push(task);
        }
        grouped
    }

    pub fn bucket(&self, horizon: Horizon) -> &[Task] {
        match horizon {
            Horizon::Today => &self.today,
            Horizon::Week => &self.week,
            Horizon::Month => &self.month,
            Horizon::Past7d => &self.past7d,
        }
    }

    fn bucket_mut(&mut self, horizon: Horizon) -> &mut Vec<Task> {
        match horizon {
            Horizon::Today => &mut self.today,
            Horizon::Week => &mut self.week,
            Horizon::Month => &mut self.month,
            Horizon::Past7d => &mut self.past7d,
        }
    }

    /// All tasks, bucket by bucket.
    pub fn into_tasks(self) -> Vec<Task> {
        let mut all = self.today;
        all.extend(self.week);
        all.extend(self.month);
        all.extend(self.past7d);
        all
    }
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// Directed relationship between two tasks, serialized as `[from, to]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge(pub TaskId, pub TaskId);

impl Edge {
    pub fn new(from: impl Into<TaskId>, to: impl Into<TaskId>) -> Self {
        Self(from.into(), to.into())
    }

    pub fn from_id(&self) -> &str {
        &self.0
    }

    pub fn to_id(&self) -> &str {
        &self.1
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Task>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn node(&self, id: &str) -> Option<&Task> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Edges whose endpoints are both present. Dangling edges are skipped,
    /// not reported.
    pub fn resolved_edges(&self) -> impl Iterator<Item = (&Task, &Task)> {
        self.edges
            .iter()
            .filter_map(move |e| Some((self.node(e.from_id())?, self.node(e.to_id())?)))
    }
}

/// Filter options offered by the graph view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphFilters {
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub statuses: Vec<String>,
}

// ---------------------------------------------------------------------------
// Connector
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorStatus {
    Connected,
    Disconnected,
    Connecting,
    Ok,
    Error,
}

wire_enum!(ConnectorStatus {
    Connected => "connected",
    Disconnected => "disconnected",
    Connecting => "connecting",
    Ok => "ok",
    Error => "error",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    pub id: String,
    pub kind: ConnectorKind,
    pub status: ConnectorStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Opaque per-connector settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Hint shown next to an errored connector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Connector {
    pub fn is_connected(&self) -> bool {
        self.status == ConnectorStatus::Connected
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// Backend health as reported by `/api/health` or observed by the poller.
///
/// Unknown strings from the backend are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HealthStatus {
    Loading,
    Ok,
    Degraded,
    Unreachable,
    Other(String),
}

impl HealthStatus {
    /// `ok` and `degraded` both mean the backend answered.
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Ok | HealthStatus::Degraded)
    }

    pub fn as_str(&self) -> &str {
        match self {
            HealthStatus::Loading => "loading",
            HealthStatus::Ok => "ok",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unreachable => "unreachable",
            HealthStatus::Other(s) => s,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl From<&str> for HealthStatus {
    fn from(s: &str) -> Self {
        match s {
            "loading" => HealthStatus::Loading,
            "ok" => HealthStatus::Ok,
            "degraded" => HealthStatus::Degraded,
            "unreachable" => HealthStatus::Unreachable,
            other => HealthStatus::Other(other.to_string()),
        }
    }
}

impl Serialize for HealthStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HealthStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(HealthStatus::from(s.as_str()))
    }
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: HealthStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Health {
    pub fn unreachable() -> Self {
        Self {
            status: HealthStatus::Unreachable,
            version: None,
        }
    }
}

/// A health observation stamped with the time it was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub status: HealthStatus,
    pub version: Option<String>,
    pub last_checked: Option<DateTime<Utc>>,
}

impl HealthSnapshot {
    pub fn loading() -> Self {
        Self {
            status: HealthStatus::Loading,
            version: None,
            last_checked: None,
        }
    }

    pub fn observed(health: Health, at: DateTime<Utc>) -> Self {
        Self {
            status: health.status,
            version: health.version,
            last_checked: Some(at),
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TasksResponse {
    pub tasks: Vec<Task>,
}

/// Body of the complete/undo endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskActionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<Task>,
}

impl TaskActionResponse {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            task: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorsResponse {
    pub connectors: Vec<Connector>,
}

/// Body of `POST /api/connectors/{kind}/connect`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResponse {
    /// OAuth URL the user must visit to finish connecting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector: Option<Connector>,
}

/// Body of `POST /api/connectors/{kind}/test`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector: Option<Connector>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn enums_parse_their_wire_spelling() {
        assert_eq!("past7d".parse::<Horizon>().unwrap(), Horizon::Past7d);
        assert_eq!(
            "in_progress".parse::<TaskStatus>().unwrap(),
            TaskStatus::InProgress
        );
        assert_eq!("github".parse::<ConnectorKind>().unwrap(), ConnectorKind::Github);
        assert!("yesterday".parse::<Horizon>().is_err());
        for h in Horizon::ALL {
            assert_eq!(h.to_string().parse::<Horizon>().unwrap(), *h);
            assert_eq!(serde_json::to_value(h).unwrap(), json!(h.as_str()));
        }
    }

    #[test]
    fn task_reads_backend_json() {
        let task: Task = serde_json::from_value(json!({
            "id": "1",
            "title": "Email CTO",
            "description": "Follow up",
            "horizon": "today",
            "status": "in_progress",
            "external": {"kind": "jira", "ref": "JIRA-1415"},
            "createdAt": "2025-01-01T00:00:00Z",
            "updatedAt": "2025-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(task.horizon, Horizon::Today);
        assert_eq!(task.status, TaskStatus::InProgress);
        let external = task.external.unwrap();
        assert_eq!(external.reference, "JIRA-1415");
        assert!(external.url.is_none());
    }

    #[test]
    fn edges_are_two_element_arrays() {
        let graph: Graph = serde_json::from_value(json!({
            "nodes": [],
            "edges": [["1", "2"], ["2", "3"]]
        }))
        .unwrap();
        assert_eq!(graph.edges[0], Edge::new("1", "2"));
        assert_eq!(
            serde_json::to_value(&graph.edges[1]).unwrap(),
            json!(["2", "3"])
        );
    }

    #[test]
    fn unknown_health_status_is_preserved() {
        let health: Health = serde_json::from_value(json!({"status": "starting"})).unwrap();
        assert_eq!(health.status, HealthStatus::Other("starting".to_string()));
        assert!(!health.status.is_healthy());
        assert!(HealthStatus::Degraded.is_healthy());
    }

    #[test]
    fn connector_keeps_opaque_config() {
        let connector: Connector = serde_json::from_value(json!({
            "id": "c1",
            "kind": "jira",
            "status": "connected",
            "baseUrl": "https://company.atlassian.net",
            "config": {"project": "OPS", "boards": [1, 2]},
            "lastSyncAt": "2025-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(connector.config.as_ref().unwrap()["boards"], json!([1, 2]));
        assert_eq!(connector.last_sync_at.as_deref(), Some("2025-01-01T00:00:00Z"));
    }

    #[test]
    fn grouping_partitions_by_horizon() {
        let task = |id: &str, horizon: &str| -> Task {
            serde_json::from_value(json!({
                "id": id, "title": id, "horizon": horizon, "status": "todo"
            }))
            .unwrap()
        };
        let grouped = TasksByHorizon::group(vec![
            task("a", "week"),
            task("b", "today"),
            task("c", "week"),
            task("d", "past7d"),
        ]);
        assert_eq!(grouped.bucket(Horizon::Today).len(), 1);
        assert_eq!(grouped.bucket(Horizon::Week).len(), 2);
        assert!(grouped.bucket(Horizon::Month).is_empty());
        let order: Vec<_> = grouped.into_tasks().into_iter().map(|t| t.id).collect();
        assert_eq!(order, ["b", "a", "c", "d"]);
    }

    #[test]
    fn dangling_edges_are_not_resolved() {
        let graph: Graph = serde_json::from_value(json!({
            "nodes": [{"id": "1", "title": "one", "horizon": "today", "status": "todo"}],
            "edges": [["1", "2"], ["1", "1"]]
        }))
        .unwrap();
        let resolved: Vec<_> = graph.resolved_edges().map(|(a, b)| (&a.id, &b.id)).collect();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0], (&"1".to_string(), &"1".to_string()));
    }
}

//! Deterministic in-memory dataset served whenever mock mode is active.
//!
//! Every accessor builds a fresh value so callers can mutate what they get
//! back without affecting later calls.

use crate::model::{
    Connector, ConnectorKind, ConnectorStatus, Edge, ExternalRef, Graph, GraphFilters, Horizon,
    Task, TaskStatus, TasksByHorizon,
};

/// Timestamp stamped on mock tasks. Fixed so results compare equal across calls.
pub const MOCK_TIMESTAMP: &str = "2025-01-06T09:00:00Z";

/// Version reported by the health endpoint in explicit mock mode.
pub const MOCK_VERSION: &str = "mock";

fn task(id: &str, title: &str, description: &str, horizon: Horizon) -> Task {
    Task {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        horizon,
        status: TaskStatus::Todo,
        external: None,
        created_at: MOCK_TIMESTAMP.to_string(),
        updated_at: MOCK_TIMESTAMP.to_string(),
    }
}

/// The focus-list dataset: one task each for today, week and month.
pub fn tasks_by_horizon() -> TasksByHorizon {
    let mut today = task(
        "1",
        "Email CTO",
        "Follow up on Q4 planning discussion from yesterday's leadership meeting",
        Horizon::Today,
    );
    today.external = Some(ExternalRef {
        kind: ConnectorKind::Jira,
        reference: "JIRA-1415".to_string(),
        url: Some("https://company.atlassian.net/browse/JIRA-1415".to_string()),
    });

    let mut week = task(
        "2",
        "Review API Documentation",
        "Check the new authentication endpoints before client integration",
        Horizon::Week,
    );
    week.external = Some(ExternalRef {
        kind: ConnectorKind::Github,
        reference: "PR-342".to_string(),
        url: Some("https://github.com/company/api/pull/342".to_string()),
    });

    let month = task(
        "3",
        "Quarterly review preparation",
        "Compile team metrics and summaries",
        Horizon::Month,
    );

    TasksByHorizon {
        today: vec![today],
        week: vec![week],
        month: vec![month],
        past7d: Vec::new(),
    }
}

/// Mock tasks, optionally restricted to one horizon.
pub fn tasks(horizon: Option<Horizon>) -> Vec<Task> {
    let all = tasks_by_horizon().into_tasks();
    match horizon {
        Some(h) => all.into_iter().filter(|t| t.horizon == h).collect(),
        None => all,
    }
}

/// Three nodes chained by two edges: 1 → 2 → 3.
pub fn graph() -> Graph {
    let node = |id: &str, title: &str, description: &str, horizon: Horizon, status: TaskStatus| Task {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        horizon,
        status,
        external: None,
        created_at: String::new(),
        updated_at: String::new(),
    };

    Graph {
        nodes: vec![
            node("1", "Email CTO", "Follow up Q4 planning", Horizon::Today, TaskStatus::Done),
            node(
                "2",
                "Review API Documentation",
                "Auth endpoints",
                Horizon::Today,
                TaskStatus::Todo,
            ),
            node(
                "3",
                "Plan team retrospective",
                "Agenda + room",
                Horizon::Week,
                TaskStatus::Todo,
            ),
        ],
        edges: vec![Edge::new("1", "2"), Edge::new("2", "3")],
    }
}

pub fn graph_filters() -> GraphFilters {
    GraphFilters {
        sources: ["jira", "gmail", "github", "drive"]
            .into_iter()
            .map(String::from)
            .collect(),
        statuses: ["done", "future"].into_iter().map(String::from).collect(),
    }
}

fn connector(id: &str, kind: ConnectorKind, status: ConnectorStatus) -> Connector {
    Connector {
        id: id.to_string(),
        kind,
        status,
        base_url: None,
        config: None,
        error: None,
        message: None,
        last_sync_at: None,
        last_checked: None,
        created_at: String::new(),
        updated_at: String::new(),
    }
}

/// Jira and Gmail connected, GitHub rate-limited.
pub fn connectors() -> Vec<Connector> {
    let mut jira = connector("c1", ConnectorKind::Jira, ConnectorStatus::Connected);
    jira.base_url = Some("https://company.atlassian.net".to_string());

    let gmail = connector("c2", ConnectorKind::Gmail, ConnectorStatus::Connected);

    let mut github = connector("c3", ConnectorKind::Github, ConnectorStatus::Error);
    github.error = Some("Rate limit".to_string());

    vec![jira, gmail, github]
}

/// The mock connector of the given kind. Every kind has exactly one.
pub fn connector_for(kind: ConnectorKind) -> Connector {
    connectors()
        .into_iter()
        .find(|c| c.kind == kind)
        .unwrap_or_else(|| connector("c0", kind, ConnectorStatus::Disconnected))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_horizon_filter_is_exact() {
        for h in Horizon::ALL {
            assert!(tasks(Some(*h)).iter().all(|t| t.horizon == *h));
        }
        assert_eq!(tasks(Some(Horizon::Today)).len(), 1);
        assert!(tasks(Some(Horizon::Past7d)).is_empty());
        assert_eq!(tasks(None).len(), 3);
    }

    #[test]
    fn mock_data_is_deterministic() {
        assert_eq!(tasks(None), tasks(None));
        assert_eq!(graph(), graph());
        assert_eq!(connectors(), connectors());
    }

    #[test]
    fn graph_has_three_nodes_and_two_resolved_edges() {
        let g = graph();
        assert_eq!(g.nodes.len(), 3);
        assert_eq!(g.edges.len(), 2);
        assert_eq!(g.resolved_edges().count(), 2);
    }

    #[test]
    fn one_connector_per_kind() {
        for kind in ConnectorKind::ALL {
            assert_eq!(connector_for(*kind).kind, *kind);
        }
        assert_eq!(
            connector_for(ConnectorKind::Github).error.as_deref(),
            Some("Rate limit")
        );
    }
}

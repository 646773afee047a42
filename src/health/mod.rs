//! Backend health: the background poller and the status shown to the user.

pub mod poller;

pub use poller::{HealthPoller, HealthSource, PollerConfig, PollerHandle, Trigger, next_delay};

use crate::model::{HealthSnapshot, HealthStatus};

/// What the status indicator shows.
///
/// `Mock` and `AutoFallback` are overlays derived from client state; they
/// take precedence over whatever the poller last observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayState {
    Mock,
    AutoFallback,
    Checking,
    Healthy { version: Option<String> },
    Degraded,
    Down,
    Unknown(String),
}

impl DisplayState {
    pub fn label(&self) -> String {
        match self {
            DisplayState::Mock => "Mock Mode".to_string(),
            DisplayState::AutoFallback => "Auto Fallback".to_string(),
            DisplayState::Checking => "Checking…".to_string(),
            DisplayState::Healthy { version: Some(v) } => format!("API {v}"),
            DisplayState::Healthy { version: None } => "API OK".to_string(),
            DisplayState::Degraded => "API Degraded".to_string(),
            DisplayState::Down => "API Down".to_string(),
            DisplayState::Unknown(status) => status.clone(),
        }
    }
}

impl std::fmt::Display for DisplayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

pub fn display_state(
    snapshot: &HealthSnapshot,
    explicit_mock: bool,
    auto_fallback: bool,
) -> DisplayState {
    if explicit_mock {
        return DisplayState::Mock;
    }
    if auto_fallback {
        return DisplayState::AutoFallback;
    }
    match &snapshot.status {
        HealthStatus::Loading => DisplayState::Checking,
        HealthStatus::Ok => DisplayState::Healthy {
            version: snapshot.version.clone(),
        },
        HealthStatus::Degraded => DisplayState::Degraded,
        HealthStatus::Unreachable => DisplayState::Down,
        HealthStatus::Other(s) => DisplayState::Unknown(s.clone()),
    }
}

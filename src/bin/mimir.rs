//! mimir CLI: operator interface to the Mimir API.

use clap::{Parser, Subcommand};
use mimir_client::api::Api;
use mimir_client::config::Config;
use mimir_client::health::{HealthPoller, PollerConfig, display_state};
use mimir_client::model::{Connector, ConnectorKind, Horizon, Task, TasksByHorizon};
use mimir_client::telemetry::{TelemetryConfig, init_telemetry};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "mimir", about = "Mimir task, graph and connector client")]
struct Cli {
    /// Serve everything from mock data; never contact the backend
    #[arg(long, global = true)]
    mock: bool,
    /// Override the API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Task operations
    Tasks {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Show the task graph
    Graph {
        /// Time window (e.g. "month")
        #[arg(long)]
        window: Option<String>,
        /// Show available graph filters instead
        #[arg(long)]
        filters: bool,
    },
    /// Connector operations
    Connectors {
        #[command(subcommand)]
        action: ConnectorAction,
    },
    /// Check backend health once
    Health,
    /// Poll backend health until interrupted
    Watch {
        /// Seconds between checks while unhealthy
        #[arg(long, default_value_t = 5)]
        fast_secs: u64,
        /// Seconds between checks while healthy
        #[arg(long, default_value_t = 30)]
        slow_secs: u64,
    },
}

#[derive(Subcommand)]
enum TaskAction {
    /// List tasks, grouped by horizon
    List {
        /// Only this horizon (today, week, month, past7d)
        #[arg(long)]
        horizon: Option<Horizon>,
    },
    /// Mark a task done
    Complete {
        /// Task ID
        id: String,
    },
    /// Revert a completed task
    Undo {
        /// Task ID
        id: String,
    },
}

#[derive(Subcommand)]
enum ConnectorAction {
    /// List connectors and their status
    List,
    /// Start connecting (jira, gmail, github)
    Connect { kind: ConnectorKind },
    /// Test a connector
    Test { kind: ConnectorKind },
    /// Test every connector
    TestAll,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if cli.mock {
        config.use_mocks = true;
    }
    if let Some(url) = cli.base_url {
        config.api_base_url = url.trim_end_matches('/').to_string();
    }

    let guard = init_telemetry(TelemetryConfig::from_config(&config, "mimir"))?;
    tracing::debug!(otlp = guard.is_exporting(), base_url = %config.api_base_url, "mimir starting");
    let api = Api::new(&config)?;

    match cli.command {
        Command::Tasks { action } => match action {
            TaskAction::List { horizon } => cmd_tasks_list(&api, horizon).await,
            TaskAction::Complete { id } => {
                let res = api.complete_task(&id).await;
                println!("complete {id}: {}", outcome(res.success));
                Ok(())
            }
            TaskAction::Undo { id } => {
                let res = api.undo_task(&id).await;
                println!("undo {id}: {}", outcome(res.success));
                Ok(())
            }
        },
        Command::Graph { window, filters } => cmd_graph(&api, window, filters).await,
        Command::Connectors { action } => cmd_connectors(&api, action).await,
        Command::Health => {
            let health = api.get_health().await;
            println!(
                "{} ({})",
                health.status,
                health.version.as_deref().unwrap_or("-")
            );
            Ok(())
        }
        Command::Watch {
            fast_secs,
            slow_secs,
        } => cmd_watch(api, fast_secs, slow_secs).await,
    }
}

fn outcome(success: bool) -> &'static str {
    if success { "ok" } else { "rejected" }
}

fn print_task_row(task: &Task) {
    let external = task
        .external
        .as_ref()
        .map(|e| format!("{}:{}", e.kind, e.reference))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{:<8}  {:<12}  {:<40}  {}",
        task.id, task.status, task.title, external
    );
}

async fn cmd_tasks_list(api: &Api, horizon: Option<Horizon>) -> anyhow::Result<()> {
    let tasks = api.list_tasks(horizon).await;
    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    let total = tasks.len();
    let grouped = TasksByHorizon::group(tasks);
    for h in Horizon::ALL {
        let bucket = grouped.bucket(*h);
        if bucket.is_empty() {
            continue;
        }
        println!("== {h} ==");
        for task in bucket {
            print_task_row(task);
        }
        println!();
    }
    println!("{total} task(s){}", mock_note(api));
    Ok(())
}

async fn cmd_graph(api: &Api, window: Option<String>, filters: bool) -> anyhow::Result<()> {
    if filters {
        let f = api.graph_filters().await;
        println!("sources:  {}", f.sources.join(", "));
        println!("statuses: {}", f.statuses.join(", "));
        return Ok(());
    }

    let graph = api.get_graph(window.as_deref()).await;
    println!("Nodes:");
    for node in &graph.nodes {
        print_task_row(node);
    }
    println!("Edges:");
    for (from, to) in graph.resolved_edges() {
        println!("  {} -> {}", from.title, to.title);
    }
    println!(
        "\n{} node(s), {} edge(s){}",
        graph.nodes.len(),
        graph.edges.len(),
        mock_note(api)
    );
    Ok(())
}

fn print_connector(connector: &Connector) {
    let detail = connector
        .error
        .as_deref()
        .or(connector.base_url.as_deref())
        .unwrap_or("-");
    println!(
        "{:<6}  {:<8}  {:<12}  {}",
        connector.id, connector.kind, connector.status, detail
    );
}

async fn cmd_connectors(api: &Api, action: ConnectorAction) -> anyhow::Result<()> {
    match action {
        ConnectorAction::List => {
            let connectors = api.list_connectors().await;
            for c in &connectors {
                print_connector(c);
            }
            let connected = connectors.iter().filter(|c| c.is_connected()).count();
            println!(
                "\n{connected}/{} connected{}",
                connectors.len(),
                mock_note(api)
            );
        }
        ConnectorAction::Connect { kind } => {
            let res = api.connect_connector(kind).await;
            if let Some(url) = res.auth_url {
                println!("Open to finish connecting {kind}: {url}");
            } else if let Some(ref c) = res.connector {
                print_connector(c);
            }
        }
        ConnectorAction::Test { kind } => {
            let res = api.test_connector(kind).await;
            println!("{kind}: {}", res.status);
        }
        ConnectorAction::TestAll => {
            for (kind, res) in api.test_all_connectors().await {
                println!("{kind}: {}", res.status);
            }
        }
    }
    Ok(())
}

async fn cmd_watch(api: Api, fast_secs: u64, slow_secs: u64) -> anyhow::Result<()> {
    let api = Arc::new(api);
    let poller = HealthPoller::new(
        Arc::clone(&api),
        PollerConfig {
            fast_interval: Duration::from_secs(fast_secs),
            slow_interval: Duration::from_secs(slow_secs),
        },
    )
    .spawn();

    let mut updates = poller.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                let label = display_state(&snapshot, api.is_explicit_mock(), api.is_auto_fallback());
                let at = snapshot
                    .last_checked
                    .map(|t| t.format("%H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("[{at}] {label}");
            }
        }
    }

    poller.shutdown().await;
    Ok(())
}

fn mock_note(api: &Api) -> &'static str {
    if api.is_explicit_mock() {
        " (mock mode)"
    } else if api.is_auto_fallback() {
        " (backend unreachable, showing mock data)"
    } else {
        ""
    }
}

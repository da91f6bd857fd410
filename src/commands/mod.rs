//! Command dispatch for the `dk` CLI.
//!
//! Each command resolves to a JSON value; the binary decides how to render
//! it. All snapshot-backed commands slice the same cached snapshot, so a
//! burst of commands inside the TTL window costs one aggregation.

use serde_json::json;
use std::sync::Arc;

use crate::aggregate::Aggregator;
use crate::cli::Commands;
use crate::models::AgentRole;
use crate::sources::CommandRunner;
use crate::tmux::{PaneCapture, TmuxCapture};
use crate::{Error, Result, activity};

/// Execute a command against the aggregator.
pub async fn run(
    command: Commands,
    aggregator: &Aggregator,
    runner: Arc<dyn CommandRunner>,
    fetch_timeout: std::time::Duration,
) -> Result<serde_json::Value> {
    match command {
        Commands::Snapshot => {
            let snapshot = aggregator.snapshot().await?;
            Ok(serde_json::to_value(&snapshot)?)
        }
        Commands::Issues => {
            let issues = aggregator.issues().await?;
            Ok(serde_json::to_value(&issues)?)
        }
        Commands::Agents { role } => {
            let role = match role.as_deref() {
                None => None,
                Some(s) => Some(
                    AgentRole::parse(s)
                        .ok_or_else(|| Error::InvalidInput(format!("unknown role: {}", s)))?,
                ),
            };
            let agents = aggregator.agents(role).await?;
            Ok(serde_json::to_value(&agents)?)
        }
        Commands::Convoys => {
            let convoys = aggregator.convoys().await?;
            Ok(serde_json::to_value(&convoys)?)
        }
        Commands::Rigs => {
            let rigs = aggregator.rigs().await?;
            Ok(serde_json::to_value(&rigs)?)
        }
        Commands::Activity { target } => {
            let capture = TmuxCapture::new(runner, fetch_timeout)
                .capture(&target)
                .await?;
            let summary = activity::reduce(&capture);
            Ok(json!({ "target": target, "activity": summary }))
        }
    }
}

/// Render a command result for human eyes.
///
/// JSON stays the machine default; this is a convenience view only.
pub fn render_human(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Array(items) => {
            if items.is_empty() {
                return "(none)".to_string();
            }
            items.iter().map(render_item).collect::<Vec<_>>().join("\n")
        }
        other => render_item(other),
    }
}

fn render_item(value: &serde_json::Value) -> String {
    let Some(obj) = value.as_object() else {
        return value.to_string();
    };
    // Lead with the most identifying fields when present
    let mut parts = Vec::new();
    for key in ["id", "name", "title", "status", "state", "current"] {
        if let Some(v) = obj.get(key).and_then(|v| v.as_str()) {
            parts.push(format!("{}={}", key, v));
        }
    }
    if parts.is_empty() {
        value.to_string()
    } else {
        parts.join("  ")
    }
}

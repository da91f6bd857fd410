//! Refinery queue/status fetcher.
//!
//! Optional source reporting the merge queue. Degrades to an empty report
//! when the refinery is unreachable.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::{CommandRunner, CommandSpec, Sourced};
use crate::models::QueueEntry;

/// Refinery state as reported by its status command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefineryReport {
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub queue: Vec<QueueEntry>,
}

/// Fetcher for the refinery queue/status.
pub struct RefinerySource {
    runner: Arc<dyn CommandRunner>,
    spec: CommandSpec,
    timeout: Duration,
}

impl RefinerySource {
    pub fn new(runner: Arc<dyn CommandRunner>, spec: CommandSpec, timeout: Duration) -> Self {
        Self {
            runner,
            spec,
            timeout,
        }
    }

    /// Fetch the current refinery report, degrading to empty on failure.
    pub async fn fetch(&self) -> Sourced<RefineryReport> {
        match self.runner.run(&self.spec, self.timeout).await {
            Ok(out) => match serde_json::from_str::<RefineryReport>(&out) {
                Ok(report) => Sourced::ok(report),
                Err(e) => {
                    warn!(error = %e, "refinery output unparseable");
                    Sourced::degraded(RefineryReport::default(), format!("unparseable: {}", e))
                }
            },
            Err(e) => {
                warn!(error = %e, "refinery fetch failed");
                Sourced::degraded(RefineryReport::default(), e.to_string())
            }
        }
    }
}

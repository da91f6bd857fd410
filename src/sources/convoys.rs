//! Convoy list and per-convoy detail fetcher.
//!
//! Covers convoys the orchestrator tracks itself (convoys derived from the
//! local issue graph never need this source). The detail fetch degrades per
//! item: a failed fetch falls back to that convoy's record from the previous
//! successful snapshot, else to a zero-progress placeholder.

use chrono::Utc;
use futures::future::join_all;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::{CommandRunner, CommandSpec, Sourced};
use crate::models::{Convoy, ConvoyStatus, Progress};

/// Placeholder substituted with the convoy id in the detail command line.
pub const ID_PLACEHOLDER: &str = "{id}";

#[derive(Debug, Clone, Deserialize)]
struct ConvoyStub {
    id: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ConvoyDetail {
    id: String,
    title: String,
    #[serde(default)]
    issues: Vec<String>,
    #[serde(default)]
    status: ConvoyStatus,
    #[serde(default)]
    progress: Progress,
    #[serde(default)]
    assignee: Option<String>,
    #[serde(default = "Utc::now")]
    created_at: chrono::DateTime<Utc>,
    #[serde(default = "Utc::now")]
    updated_at: chrono::DateTime<Utc>,
}

impl From<ConvoyDetail> for Convoy {
    fn from(d: ConvoyDetail) -> Self {
        Convoy {
            id: d.id,
            title: d.title,
            issues: d.issues,
            status: d.status,
            progress: d.progress,
            assignee: d.assignee,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

/// Fetcher for orchestrator-tracked convoys.
pub struct ConvoySource {
    runner: Arc<dyn CommandRunner>,
    list_spec: CommandSpec,
    detail_spec: CommandSpec,
    timeout: Duration,
}

impl ConvoySource {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        list_spec: CommandSpec,
        detail_spec: CommandSpec,
        timeout: Duration,
    ) -> Self {
        Self {
            runner,
            list_spec,
            detail_spec,
            timeout,
        }
    }

    /// Fetch the convoy list and each convoy's detail concurrently.
    ///
    /// `previous` is the convoy set from the last successful snapshot, used
    /// as the per-item fallback when a detail fetch fails.
    pub async fn fetch(&self, previous: &HashMap<String, Convoy>) -> Sourced<Vec<Convoy>> {
        let stubs = match self.runner.run(&self.list_spec, self.timeout).await {
            Ok(out) => match serde_json::from_str::<Vec<ConvoyStub>>(&out) {
                Ok(stubs) => stubs,
                Err(e) => {
                    warn!(error = %e, "convoy list output unparseable");
                    return Sourced::degraded(Vec::new(), format!("unparseable list: {}", e));
                }
            },
            Err(e) => {
                warn!(error = %e, "convoy list fetch failed");
                return Sourced::degraded(Vec::new(), e.to_string());
            }
        };

        let details = join_all(stubs.iter().map(|stub| self.fetch_detail(stub, previous))).await;

        let failures = details.iter().filter(|(_, fell_back)| *fell_back).count();
        let convoys = details.into_iter().map(|(c, _)| c).collect();
        if failures > 0 {
            Sourced::degraded(convoys, format!("{} detail fetches fell back", failures))
        } else {
            Sourced::ok(convoys)
        }
    }

    /// Returns the convoy plus whether the fallback path was taken.
    async fn fetch_detail(
        &self,
        stub: &ConvoyStub,
        previous: &HashMap<String, Convoy>,
    ) -> (Convoy, bool) {
        let spec = self.detail_spec.substituted(ID_PLACEHOLDER, &stub.id);
        match self.runner.run(&spec, self.timeout).await {
            Ok(out) => match serde_json::from_str::<ConvoyDetail>(&out) {
                Ok(detail) => (detail.into(), false),
                Err(e) => {
                    warn!(convoy = %stub.id, error = %e, "convoy detail unparseable");
                    (self.fallback(stub, previous), true)
                }
            },
            Err(e) => {
                warn!(convoy = %stub.id, error = %e, "convoy detail fetch failed");
                (self.fallback(stub, previous), true)
            }
        }
    }

    /// Previous snapshot's record (issue set and progress carried over, title
    /// refreshed), else a zero-progress active placeholder.
    fn fallback(&self, stub: &ConvoyStub, previous: &HashMap<String, Convoy>) -> Convoy {
        if let Some(prev) = previous.get(&stub.id) {
            let mut convoy = prev.clone();
            if !stub.title.is_empty() {
                convoy.title = stub.title.clone();
            }
            return convoy;
        }
        let now = Utc::now();
        Convoy {
            id: stub.id.clone(),
            title: stub.title.clone(),
            issues: Vec::new(),
            status: ConvoyStatus::Active,
            progress: Progress::default(),
            assignee: None,
            created_at: now,
            updated_at: now,
        }
    }
}

//! Live status fetcher.
//!
//! Polls the orchestrator's status command for running agent processes. Two
//! guards keep the external command cheap under dashboard polling: a short
//! TTL cache, and a single-flight gate so concurrent aggregation requests
//! inside the TTL window converge on one outbound call.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::{CommandRunner, CommandSpec, Sourced};
use crate::aggregate::cache::{SingleFlight, TtlCache};
use crate::models::Agent;

/// Running agent processes as reported by the live source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveStatus {
    #[serde(default)]
    pub polecats: Vec<Agent>,
    #[serde(default)]
    pub witnesses: Vec<Agent>,
    #[serde(default)]
    pub refineries: Vec<Agent>,
}

/// Live status source with TTL cache and single-flight guard.
pub struct LiveStatusSource {
    runner: Arc<dyn CommandRunner>,
    spec: CommandSpec,
    ttl: Duration,
    timeout: Duration,
    cache: TtlCache<Sourced<LiveStatus>>,
    flight: SingleFlight<Sourced<LiveStatus>>,
}

impl LiveStatusSource {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        spec: CommandSpec,
        ttl: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            runner,
            spec,
            ttl,
            timeout,
            cache: TtlCache::new(),
            flight: SingleFlight::new(),
        }
    }

    /// Fetch live status, degrading to an empty report on failure.
    pub async fn fetch(&self) -> Sourced<LiveStatus> {
        if let Some(hit) = self.cache.get(self.ttl) {
            debug!("live status cache hit");
            return hit;
        }

        let runner = self.runner.clone();
        let spec = self.spec.clone();
        let timeout = self.timeout;
        let result = self
            .flight
            .run("live-status", move || async move {
                fetch_once(runner, spec, timeout).await
            })
            .await;

        self.cache.put(result.clone());
        result
    }
}

async fn fetch_once(
    runner: Arc<dyn CommandRunner>,
    spec: CommandSpec,
    timeout: Duration,
) -> Sourced<LiveStatus> {
    match runner.run(&spec, timeout).await {
        Ok(out) => match serde_json::from_str::<LiveStatus>(&out) {
            Ok(status) => Sourced::ok(status),
            Err(e) => {
                warn!(error = %e, "live status output unparseable");
                Sourced::degraded(LiveStatus::default(), format!("unparseable output: {}", e))
            }
        },
        Err(e) => {
            warn!(error = %e, command = %spec.display(), "live status fetch failed");
            Sourced::degraded(LiveStatus::default(), e.to_string())
        }
    }
}

//! The aggregator: one polling endpoint over every status source.
//!
//! Each request either returns the cached snapshot (age below the snapshot
//! TTL, no external calls at all) or fans out to all source fetchers
//! concurrently, merges with source-precedence rules, derives convoys, and
//! caches the result. Optional-source failures degrade; only the work-item
//! log read can fail the request.

pub mod cache;

use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{
    Agent, AgentRole, Convoy, Issue, Rig, Snapshot, SnapshotHealth, convoy::order_convoys,
    derive_convoys,
};
use crate::parse::{agent_from_issue, rig_from_issue};
use crate::sources::convoys::ConvoySource;
use crate::sources::live::LiveStatusSource;
use crate::sources::refinery::RefinerySource;
use crate::sources::{CommandRunner, Sourced, log, registry};
use crate::{Result, aggregate::cache::TtlCache};

/// Status aggregation service.
///
/// Construct once and share; the snapshot cache and the live source's
/// single-flight guard live inside the instance, not in module state.
pub struct Aggregator {
    config: Config,
    workdir: PathBuf,
    cache: TtlCache<Snapshot>,
    live: LiveStatusSource,
    convoys: ConvoySource,
    refinery: RefinerySource,
    /// Convoys from the last successful cycle, the detail-fetch fallback set
    prev_convoys: Mutex<HashMap<String, Convoy>>,
}

impl Aggregator {
    pub fn new(config: Config, workdir: PathBuf, runner: Arc<dyn CommandRunner>) -> Self {
        let live = LiveStatusSource::new(
            runner.clone(),
            config.command(&config.commands.status),
            config.live_ttl(),
            config.fetch_timeout(),
        );
        let convoys = ConvoySource::new(
            runner.clone(),
            config.command(&config.commands.convoy_list),
            config.command(&config.commands.convoy_detail),
            config.fetch_timeout(),
        );
        let refinery = RefinerySource::new(
            runner,
            config.command(&config.commands.refinery),
            config.fetch_timeout(),
        );
        Self {
            config,
            workdir,
            cache: TtlCache::new(),
            live,
            convoys,
            refinery,
            prev_convoys: Mutex::new(HashMap::new()),
        }
    }

    /// One aggregation cycle. Idempotent and safe to poll.
    pub async fn snapshot(&self) -> Result<Snapshot> {
        if let Some(hit) = self.cache.get(self.config.snapshot_ttl()) {
            debug!("snapshot cache hit");
            return Ok(hit);
        }

        let previous = self.prev_convoys.lock().unwrap().clone();
        let log_path = self.config.log_path(&self.workdir);
        let registry_path = self.config.registry_path(&self.workdir);

        let (log_read, live, registry_read, fetched_convoys, refinery) = tokio::join!(
            async { log::read_log(&log_path) },
            self.live.fetch(),
            async { read_registry_sourced(&registry_path) },
            self.convoys.fetch(&previous),
            self.refinery.fetch(),
        );

        // The one mandatory source.
        let issues = log_read?;

        let (polecats, witnesses, refineries) = merge_agents(&issues, live.value);
        let rigs = merge_rigs(&issues, registry_read.value);

        let all_agents: Vec<Agent> = polecats
            .iter()
            .chain(witnesses.iter())
            .chain(refineries.iter())
            .cloned()
            .collect();

        let now = Utc::now();
        let mut convoys = derive_convoys(&issues, &all_agents, now);
        for convoy in fetched_convoys.value {
            if !convoys.iter().any(|c| c.id == convoy.id) {
                convoys.push(convoy);
            }
        }
        order_convoys(&mut convoys);

        let snapshot = Snapshot {
            issues,
            rigs,
            polecats,
            witnesses,
            refineries,
            refinery_queue: refinery.value.queue,
            health: SnapshotHealth {
                live_status: live.health,
                rig_registry: registry_read.health,
                convoys: fetched_convoys.health,
                refinery: refinery.health,
            },
            convoys,
            timestamp: now,
        };

        *self.prev_convoys.lock().unwrap() = snapshot
            .convoys
            .iter()
            .map(|c| (c.id.clone(), c.clone()))
            .collect();
        self.cache.put(snapshot.clone());
        Ok(snapshot)
    }

    /// Issues-only view, sliced from the snapshot.
    pub async fn issues(&self) -> Result<Vec<Issue>> {
        Ok(self.snapshot().await?.issues)
    }

    /// Rigs-only view.
    pub async fn rigs(&self) -> Result<Vec<Rig>> {
        Ok(self.snapshot().await?.rigs)
    }

    /// Convoys-only view.
    pub async fn convoys(&self) -> Result<Vec<Convoy>> {
        Ok(self.snapshot().await?.convoys)
    }

    /// Agents of one role, or all roles when `role` is `None`.
    pub async fn agents(&self, role: Option<AgentRole>) -> Result<Vec<Agent>> {
        let snapshot = self.snapshot().await?;
        Ok(match role {
            Some(AgentRole::Polecat) => snapshot.polecats,
            Some(AgentRole::Witness) => snapshot.witnesses,
            Some(AgentRole::Refinery) => snapshot.refineries,
            None => snapshot.agents().cloned().collect(),
        })
    }
}

fn read_registry_sourced(path: &Path) -> Sourced<Vec<Rig>> {
    match registry::read_registry(path) {
        Ok(rigs) => Sourced::ok(rigs),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "rig registry unavailable");
            Sourced::degraded(Vec::new(), e.to_string())
        }
    }
}

/// Live-derived agents fully replace log-derived ones, per kind: the
/// log-derived path is used only when the live source yields zero agents of
/// that kind.
fn merge_agents(
    issues: &[Issue],
    live: crate::sources::live::LiveStatus,
) -> (Vec<Agent>, Vec<Agent>, Vec<Agent>) {
    let mut log_polecats = Vec::new();
    let mut log_witnesses = Vec::new();
    let mut log_refineries = Vec::new();
    for agent in issues.iter().filter_map(agent_from_issue) {
        match agent.role {
            AgentRole::Polecat => log_polecats.push(agent),
            AgentRole::Witness => log_witnesses.push(agent),
            AgentRole::Refinery => log_refineries.push(agent),
        }
    }

    let pick = |live: Vec<Agent>, from_log: Vec<Agent>| {
        if live.is_empty() { from_log } else { live }
    };
    (
        pick(live.polecats, log_polecats),
        pick(live.witnesses, log_witnesses),
        pick(live.refineries, log_refineries),
    )
}

/// Registry records fully replace issue-derived rigs of the same name;
/// issue-derived rigs survive only for names the registry does not know.
fn merge_rigs(issues: &[Issue], from_registry: Vec<Rig>) -> Vec<Rig> {
    let mut by_name: BTreeMap<String, Rig> = issues
        .iter()
        .filter_map(rig_from_issue)
        .map(|r| (r.name.clone(), r))
        .collect();
    for rig in from_registry {
        by_name.insert(rig.name.clone(), rig);
    }
    by_name.into_values().collect()
}

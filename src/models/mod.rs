//! Data models for Derrick entities.
//!
//! This module defines the core data structures:
//! - `Issue` - Work items read from the append-only log
//! - `DependencyEdge` - Directed relationships between issues
//! - `Rig` - Managed project/workspace groupings
//! - `Convoy` - Derived work-streams with aggregate progress
//! - `Snapshot` - The merged result of one aggregation cycle

pub mod agents;
pub mod convoy;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use agents::{Agent, AgentLifecycle, AgentRole};
pub use convoy::derive_convoys;

/// Issue status in the workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    #[default]
    Open,
    /// Claimed by an agent as its current work
    Hooked,
    InProgress,
    Blocked,
    Closed,
}

impl IssueStatus {
    /// True for statuses that indicate someone is actively on the issue.
    pub fn is_live(&self) -> bool {
        matches!(self, IssueStatus::Hooked | IssueStatus::InProgress)
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IssueStatus::Open => "open",
            IssueStatus::Hooked => "hooked",
            IssueStatus::InProgress => "in_progress",
            IssueStatus::Blocked => "blocked",
            IssueStatus::Closed => "closed",
        };
        write!(f, "{}", s)
    }
}

/// Issue type discriminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    #[default]
    Task,
    Feature,
    Bug,
    /// Aggregate issue grouping a body of related work
    Molecule,
    /// Issue representing an autonomous worker process
    Agent,
}

/// A directed dependency between two issues.
///
/// Reads as "`issue_id` depends on `depends_on_id`".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub issue_id: String,
    pub depends_on_id: String,

    /// Edge kind (e.g., "blocks", "parent-child")
    #[serde(rename = "type", default)]
    pub dep_type: String,
}

/// A work item read from the append-only log.
///
/// Issues are immutable from the engine's perspective; the engine never
/// writes back to the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Unique identifier (e.g., "dk-a1b2")
    pub id: String,

    /// Issue title
    pub title: String,

    /// Free-text body; may embed `key: value` fields for typed entities
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Current status
    #[serde(default)]
    pub status: IssueStatus,

    /// Priority level (0-4, lower is higher priority)
    #[serde(default)]
    pub priority: u8,

    /// Issue type marker
    #[serde(rename = "type", default)]
    pub issue_type: IssueType,

    /// Assigned user or agent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    /// Labels for categorization
    #[serde(default)]
    pub labels: Vec<String>,

    /// Dependency edges where this issue is the dependent
    #[serde(default)]
    pub dependencies: Vec<DependencyEdge>,

    /// Origin rig tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rig: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Closure timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Issue {
    /// Create a new issue with the given ID and title.
    pub fn new(id: String, title: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            description: None,
            status: IssueStatus::default(),
            priority: 2, // Default middle priority
            issue_type: IssueType::default(),
            assignee: None,
            labels: Vec::new(),
            dependencies: Vec::new(),
            rig: None,
            created_at: now,
            updated_at: now,
            closed_at: None,
        }
    }
}

/// Rig lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RigState {
    #[default]
    Active,
    Inactive,
    Archived,
}

/// A managed project/workspace grouping that owns agents and issues.
///
/// The registry file is the canonical source for rig records; rig records
/// parsed out of issues are a fallback only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rig {
    /// Rig name, unique across the installation
    pub name: String,

    /// Repository the rig operates against
    pub repository: String,

    /// Issue id prefix assigned to this rig
    #[serde(default)]
    pub prefix: String,

    /// Lifecycle state
    #[serde(default)]
    pub state: RigState,
}

/// Convoy status derived from member issues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvoyStatus {
    #[default]
    Active,
    Stalled,
    Completed,
}

impl ConvoyStatus {
    /// Display ordering group: stalled first, completed last.
    pub fn sort_rank(&self) -> u8 {
        match self {
            ConvoyStatus::Stalled => 0,
            ConvoyStatus::Active => 1,
            ConvoyStatus::Completed => 2,
        }
    }
}

/// Completion counters over a convoy's member set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

/// A derived work-stream: a root issue plus its direct dependents.
///
/// Convoys are ephemeral; they are recomputed on every aggregation cycle
/// and never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Convoy {
    /// Root issue id
    pub id: String,

    /// Root issue title
    pub title: String,

    /// Member issue ids: the root plus its direct dependents
    pub issues: Vec<String>,

    /// Derived status
    #[serde(default)]
    pub status: ConvoyStatus,

    /// Completion counters over the member set
    #[serde(default)]
    pub progress: Progress,

    /// Working agent, or the hooked member's raw assignee
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    /// Inherited from the root issue
    pub created_at: DateTime<Utc>,

    /// Inherited from the root issue
    pub updated_at: DateTime<Utc>,
}

/// One queued item at the refinery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// Queued issue or merge-request id
    pub id: String,

    /// Originating rig, when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rig: Option<String>,

    /// Position in the queue, when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

/// Per-source health of one aggregation cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHealth {
    pub live_status: crate::sources::SourceHealth,
    pub rig_registry: crate::sources::SourceHealth,
    pub convoys: crate::sources::SourceHealth,
    pub refinery: crate::sources::SourceHealth,
}

/// The merged, cached result of one aggregation cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub issues: Vec<Issue>,
    pub rigs: Vec<Rig>,
    pub polecats: Vec<Agent>,
    pub witnesses: Vec<Agent>,
    pub refineries: Vec<Agent>,
    pub convoys: Vec<Convoy>,

    /// Refinery merge queue, empty when the source is unavailable
    #[serde(default)]
    pub refinery_queue: Vec<QueueEntry>,

    /// Per-source health for this cycle
    #[serde(default)]
    pub health: SnapshotHealth,

    /// Capture time of this snapshot
    pub timestamp: DateTime<Utc>,
}

impl Snapshot {
    /// An empty snapshot stamped with the given time.
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            issues: Vec::new(),
            rigs: Vec::new(),
            polecats: Vec::new(),
            witnesses: Vec::new(),
            refineries: Vec::new(),
            convoys: Vec::new(),
            refinery_queue: Vec::new(),
            health: SnapshotHealth::default(),
            timestamp,
        }
    }

    /// All agents across roles, in polecat/witness/refinery order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.polecats
            .iter()
            .chain(self.witnesses.iter())
            .chain(self.refineries.iter())
    }
}

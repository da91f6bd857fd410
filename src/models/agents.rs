//! Agent entities derived from the work-item log and live status sources.
//!
//! An agent is an autonomous worker process represented by a specially-typed
//! issue in the log plus, when reachable, its live process status. Agents are
//! derived, never persisted by this engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of an autonomous worker process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Worker that picks up and executes issues
    Polecat,
    /// Per-rig supervisor watching polecat health
    Witness,
    /// Merge-queue processor
    Refinery,
}

impl AgentRole {
    /// Parse from the `role_type` field value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "polecat" => Some(AgentRole::Polecat),
            "witness" => Some(AgentRole::Witness),
            "refinery" => Some(AgentRole::Refinery),
            _ => None,
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentRole::Polecat => "polecat",
            AgentRole::Witness => "witness",
            AgentRole::Refinery => "refinery",
        };
        write!(f, "{}", s)
    }
}

/// Agent lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentLifecycle {
    Spawning,
    Active,
    #[default]
    Idle,
    Done,
    Error,
}

impl AgentLifecycle {
    /// Parse from the `agent_state` field value. Unknown states map to Idle.
    pub fn parse(s: &str) -> Self {
        match s {
            "spawning" => AgentLifecycle::Spawning,
            "active" => AgentLifecycle::Active,
            "done" => AgentLifecycle::Done,
            "error" => AgentLifecycle::Error,
            _ => AgentLifecycle::Idle,
        }
    }
}

/// An autonomous worker process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    /// Backing issue id, or the live source's identifier
    pub id: String,

    /// Display name (e.g., "polecat-toecutter")
    pub name: String,

    /// Worker role
    pub role: AgentRole,

    /// Owning rig
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rig: Option<String>,

    /// Lifecycle state
    #[serde(default)]
    pub state: AgentLifecycle,

    /// Issue id this agent has claimed as its current work
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hooked: Option<String>,
}

impl Agent {
    /// Create an idle agent with the given identity and role.
    pub fn new(id: &str, name: &str, role: AgentRole) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            role,
            rig: None,
            state: AgentLifecycle::default(),
            hooked: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(AgentRole::parse("polecat"), Some(AgentRole::Polecat));
        assert_eq!(AgentRole::parse("witness"), Some(AgentRole::Witness));
        assert_eq!(AgentRole::parse("refinery"), Some(AgentRole::Refinery));
        assert_eq!(AgentRole::parse("mechanic"), None);
        assert_eq!(AgentRole::parse(""), None);
    }

    #[test]
    fn test_lifecycle_parse_unknown_is_idle() {
        assert_eq!(AgentLifecycle::parse("active"), AgentLifecycle::Active);
        assert_eq!(AgentLifecycle::parse("spawning"), AgentLifecycle::Spawning);
        assert_eq!(AgentLifecycle::parse("nonsense"), AgentLifecycle::Idle);
    }

    #[test]
    fn test_agent_serializes_snake_case() {
        let mut agent = Agent::new("dk-a1", "polecat-rictus", AgentRole::Polecat);
        agent.state = AgentLifecycle::Active;
        let json = serde_json::to_value(&agent).unwrap();
        assert_eq!(json["role"], "polecat");
        assert_eq!(json["state"], "active");
        // hooked is omitted when None
        assert!(json.get("hooked").is_none());
    }
}

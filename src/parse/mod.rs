//! Key:value field extraction from issue free-text bodies.
//!
//! Agent and rig records embed semi-structured `key: value` lines in their
//! issue descriptions. `Fields` is the single decoder for that mini-format;
//! entity parsers build typed records on top of it instead of scattering
//! regex calls across call sites.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::models::{Agent, AgentLifecycle, AgentRole, Issue, IssueType, Rig, RigState};

/// Issues carrying this label are rig records.
pub const RIG_MARKER_LABEL: &str = "rig";

/// The field names the entity parsers consult. The decoder itself is
/// generic; this is the schema the typed records are built from.
pub const KNOWN_FIELDS: &[&str] = &[
    "role_type",
    "agent_state",
    "hook_bead",
    "rig",
    "repository",
    "prefix",
    "rig_state",
];

fn field_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^([A-Za-z_][A-Za-z0-9_-]*):[ \t]*(.*)$").unwrap())
}

/// Parsed `key: value` fields from one free-text body.
#[derive(Debug, Clone, Default)]
pub struct Fields {
    values: HashMap<String, String>,
}

impl Fields {
    /// Parse all `key: value` lines from a body in one pass.
    ///
    /// The first occurrence of a key wins. Values are trimmed.
    pub fn parse(body: &str) -> Self {
        let mut values = HashMap::new();
        for cap in field_line_re().captures_iter(body) {
            let key = cap[1].to_string();
            let value = cap[2].trim().to_string();
            values.entry(key).or_insert(value);
        }
        Self { values }
    }

    /// Look up a field value.
    ///
    /// A captured literal `"null"` or empty remainder is a true absence,
    /// not a value.
    pub fn get(&self, name: &str) -> Option<&str> {
        match self.values.get(name).map(String::as_str) {
            Some("") | Some("null") | None => None,
            Some(v) => Some(v),
        }
    }
}

/// Extract a single field from a body.
///
/// Convenience wrapper for call sites that need one value; batch lookups
/// should parse a `Fields` once.
pub fn field(body: &str, name: &str) -> Option<String> {
    Fields::parse(body).get(name).map(str::to_string)
}

/// Parse an agent record out of an issue.
///
/// Requires `issue_type == agent` and a valid `role_type` field; returns
/// `None` otherwise. Malformed optional fields degrade to defaults.
pub fn agent_from_issue(issue: &Issue) -> Option<Agent> {
    if issue.issue_type != IssueType::Agent {
        return None;
    }
    let body = issue.description.as_deref()?;
    let fields = Fields::parse(body);
    let role = AgentRole::parse(fields.get("role_type")?)?;

    let state = fields
        .get("agent_state")
        .map(AgentLifecycle::parse)
        .unwrap_or_default();
    let rig = fields
        .get("rig")
        .map(str::to_string)
        .or_else(|| issue.rig.clone());

    Some(Agent {
        id: issue.id.clone(),
        name: issue.title.clone(),
        role,
        rig,
        state,
        hooked: fields.get("hook_bead").map(str::to_string),
    })
}

/// Parse a rig record out of an issue.
///
/// Requires the sentinel rig label; returns `None` when the marker is
/// absent. Registry-file records take precedence over these.
pub fn rig_from_issue(issue: &Issue) -> Option<Rig> {
    if !issue.labels.iter().any(|l| l == RIG_MARKER_LABEL) {
        return None;
    }
    let fields = issue
        .description
        .as_deref()
        .map(Fields::parse)
        .unwrap_or_default();

    let state = match fields.get("rig_state") {
        Some("inactive") => RigState::Inactive,
        Some("archived") => RigState::Archived,
        _ => RigState::Active,
    };

    Some(Rig {
        name: issue.title.clone(),
        repository: fields.get("repository").unwrap_or_default().to_string(),
        prefix: fields.get("prefix").unwrap_or_default().to_string(),
        state,
    })
}

//! Convoy derivation over the issue dependency graph.
//!
//! A convoy groups a root issue (feature or molecule) with its direct
//! dependents into one work-stream. Membership is exactly one hop: the root
//! plus issues with a dependency edge pointing at the root, never the deeper
//! transitive closure.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use super::{Agent, Convoy, ConvoyStatus, Issue, IssueStatus, IssueType, Progress};

/// Roots older than this with no live member are considered stalled.
const STALL_THRESHOLD_MINS: i64 = 30;

/// Derive convoys from the issue set and live agents.
///
/// Returns convoys ordered by status group (stalled, then active, then
/// completed), stable within each group with respect to input order.
pub fn derive_convoys(issues: &[Issue], agents: &[Agent], now: DateTime<Utc>) -> Vec<Convoy> {
    let by_id: HashMap<&str, &Issue> = issues.iter().map(|i| (i.id.as_str(), i)).collect();

    // depends_on_id -> ids of issues that depend on it, in input order
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for issue in issues {
        for edge in &issue.dependencies {
            dependents
                .entry(edge.depends_on_id.as_str())
                .or_default()
                .push(issue.id.as_str());
        }
    }

    let mut convoys: Vec<Convoy> = Vec::new();
    for root in issues {
        if !matches!(root.issue_type, IssueType::Feature | IssueType::Molecule) {
            continue;
        }
        let Some(direct) = dependents.get(root.id.as_str()) else {
            continue;
        };

        let mut members: Vec<String> = vec![root.id.clone()];
        for id in direct {
            if !members.iter().any(|m| m == id) {
                members.push((*id).to_string());
            }
        }

        let member_issues: Vec<&Issue> = members
            .iter()
            .filter_map(|id| by_id.get(id.as_str()).copied())
            .collect();

        let completed = member_issues
            .iter()
            .filter(|i| i.status == IssueStatus::Closed)
            .count();
        let progress = Progress {
            completed,
            total: members.len(),
        };

        let status = derive_status(&member_issues, progress, root.updated_at, now);

        convoys.push(Convoy {
            id: root.id.clone(),
            title: root.title.clone(),
            issues: members,
            status,
            progress,
            assignee: derive_assignee(&member_issues, agents),
            created_at: root.created_at,
            updated_at: root.updated_at,
        });
    }

    order_convoys(&mut convoys);
    convoys
}

/// Sort convoys by status group only: stalled, active, completed.
/// Ties keep input order.
pub fn order_convoys(convoys: &mut [Convoy]) {
    convoys.sort_by_key(|c| c.status.sort_rank());
}

fn derive_status(
    members: &[&Issue],
    progress: Progress,
    root_updated_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> ConvoyStatus {
    if progress.total > 0 && progress.completed == progress.total {
        return ConvoyStatus::Completed;
    }
    let any_live = members.iter().any(|i| i.status.is_live());
    let stale = now - root_updated_at > Duration::minutes(STALL_THRESHOLD_MINS);
    if !any_live && stale {
        ConvoyStatus::Stalled
    } else {
        ConvoyStatus::Active
    }
}

/// The working assignee: the live agent hooked onto a member currently in
/// status hooked, falling back to that member's raw assignee field.
fn derive_assignee(members: &[&Issue], agents: &[Agent]) -> Option<String> {
    let hooked_member = members.iter().find(|i| i.status == IssueStatus::Hooked)?;
    let worker = agents
        .iter()
        .find(|a| a.hooked.as_deref() == Some(hooked_member.id.as_str()));
    match worker {
        Some(agent) => Some(agent.name.clone()),
        None => hooked_member.assignee.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgentRole, DependencyEdge};

    fn issue(id: &str, issue_type: IssueType, status: IssueStatus) -> Issue {
        let mut i = Issue::new(id.to_string(), format!("issue {}", id));
        i.issue_type = issue_type;
        i.status = status;
        i
    }

    fn edge(from: &str, to: &str) -> DependencyEdge {
        DependencyEdge {
            issue_id: from.to_string(),
            depends_on_id: to.to_string(),
            dep_type: "blocks".to_string(),
        }
    }

    #[test]
    fn test_members_are_one_hop_only() {
        // c -> b -> a, a is the feature root
        let mut a = issue("a", IssueType::Feature, IssueStatus::Open);
        let mut b = issue("b", IssueType::Task, IssueStatus::Open);
        b.dependencies.push(edge("b", "a"));
        let mut c = issue("c", IssueType::Task, IssueStatus::Open);
        c.dependencies.push(edge("c", "b"));
        a.updated_at = Utc::now();

        let convoys = derive_convoys(&[a, b, c], &[], Utc::now());
        assert_eq!(convoys.len(), 1);
        assert_eq!(convoys[0].id, "a");
        assert_eq!(convoys[0].issues, vec!["a", "b"]);
        // c is a dependent-of-a-dependent and must not appear
        assert!(!convoys[0].issues.contains(&"c".to_string()));
    }

    #[test]
    fn test_root_requires_dependents() {
        let lonely = issue("f", IssueType::Feature, IssueStatus::Open);
        let convoys = derive_convoys(&[lonely], &[], Utc::now());
        assert!(convoys.is_empty());
    }

    #[test]
    fn test_root_requires_feature_or_molecule() {
        let root = issue("t", IssueType::Task, IssueStatus::Open);
        let mut dep = issue("d", IssueType::Task, IssueStatus::Open);
        dep.dependencies.push(edge("d", "t"));
        let convoys = derive_convoys(&[root, dep], &[], Utc::now());
        assert!(convoys.is_empty());

        let root = issue("m", IssueType::Molecule, IssueStatus::Open);
        let mut dep = issue("d", IssueType::Task, IssueStatus::Open);
        dep.dependencies.push(edge("d", "m"));
        let convoys = derive_convoys(&[root, dep], &[], Utc::now());
        assert_eq!(convoys.len(), 1);
    }

    #[test]
    fn test_progress_counts_root_directly() {
        let now = Utc::now();
        let mut f = issue("f", IssueType::Feature, IssueStatus::Closed);
        f.updated_at = now - Duration::hours(5);
        let mut a = issue("a", IssueType::Task, IssueStatus::Closed);
        a.dependencies.push(edge("a", "f"));
        let mut b = issue("b", IssueType::Task, IssueStatus::Closed);
        b.dependencies.push(edge("b", "f"));

        let convoys = derive_convoys(&[f, a, b], &[], now);
        assert_eq!(convoys[0].progress, Progress { completed: 3, total: 3 });
        // completed wins under any timestamp
        assert_eq!(convoys[0].status, ConvoyStatus::Completed);
    }

    #[test]
    fn test_active_when_member_in_progress() {
        let now = Utc::now();
        let mut f = issue("f", IssueType::Feature, IssueStatus::Open);
        f.updated_at = now - Duration::hours(2);
        let mut a = issue("a", IssueType::Task, IssueStatus::Closed);
        a.dependencies.push(edge("a", "f"));
        let mut b = issue("b", IssueType::Task, IssueStatus::InProgress);
        b.dependencies.push(edge("b", "f"));

        let convoys = derive_convoys(&[f, a, b], &[], now);
        assert_eq!(convoys[0].progress, Progress { completed: 1, total: 3 });
        assert_eq!(convoys[0].status, ConvoyStatus::Active);
    }

    #[test]
    fn test_stalled_when_idle_past_threshold() {
        let now = Utc::now();
        let mut f = issue("f", IssueType::Feature, IssueStatus::Open);
        f.updated_at = now - Duration::minutes(45);
        let mut a = issue("a", IssueType::Task, IssueStatus::Open);
        a.dependencies.push(edge("a", "f"));

        let convoys = derive_convoys(&[f, a], &[], now);
        assert_eq!(convoys[0].status, ConvoyStatus::Stalled);
    }

    #[test]
    fn test_not_stalled_inside_threshold() {
        let now = Utc::now();
        let mut f = issue("f", IssueType::Feature, IssueStatus::Open);
        f.updated_at = now - Duration::minutes(10);
        let mut a = issue("a", IssueType::Task, IssueStatus::Open);
        a.dependencies.push(edge("a", "f"));

        let convoys = derive_convoys(&[f, a], &[], now);
        assert_eq!(convoys[0].status, ConvoyStatus::Active);
    }

    #[test]
    fn test_assignee_prefers_hooked_agent() {
        let now = Utc::now();
        let mut f = issue("f", IssueType::Feature, IssueStatus::Open);
        f.updated_at = now;
        let mut a = issue("a", IssueType::Task, IssueStatus::Hooked);
        a.assignee = Some("raw-user".to_string());
        a.dependencies.push(edge("a", "f"));

        let mut worker = Agent::new("dk-p1", "polecat-nux", AgentRole::Polecat);
        worker.hooked = Some("a".to_string());

        let convoys = derive_convoys(&[f.clone(), a.clone()], &[worker], now);
        assert_eq!(convoys[0].assignee.as_deref(), Some("polecat-nux"));

        // Without a matching agent, fall back to the raw assignee field
        let convoys = derive_convoys(&[f, a], &[], now);
        assert_eq!(convoys[0].assignee.as_deref(), Some("raw-user"));
    }

    #[test]
    fn test_no_assignee_without_hooked_member() {
        let now = Utc::now();
        let mut f = issue("f", IssueType::Feature, IssueStatus::Open);
        f.updated_at = now;
        let mut a = issue("a", IssueType::Task, IssueStatus::InProgress);
        a.assignee = Some("someone".to_string());
        a.dependencies.push(edge("a", "f"));

        let convoys = derive_convoys(&[f, a], &[], now);
        assert_eq!(convoys[0].assignee, None);
    }

    #[test]
    fn test_ordering_groups_by_status() {
        let now = Utc::now();

        // completed convoy first in input order
        let mut c_root = issue("c-root", IssueType::Feature, IssueStatus::Closed);
        c_root.updated_at = now;
        let mut c_dep = issue("c-dep", IssueType::Task, IssueStatus::Closed);
        c_dep.dependencies.push(edge("c-dep", "c-root"));

        // stalled convoy second
        let mut s_root = issue("s-root", IssueType::Feature, IssueStatus::Open);
        s_root.updated_at = now - Duration::hours(1);
        let mut s_dep = issue("s-dep", IssueType::Task, IssueStatus::Open);
        s_dep.dependencies.push(edge("s-dep", "s-root"));

        // active convoy third
        let mut a_root = issue("a-root", IssueType::Feature, IssueStatus::Open);
        a_root.updated_at = now;
        let mut a_dep = issue("a-dep", IssueType::Task, IssueStatus::InProgress);
        a_dep.dependencies.push(edge("a-dep", "a-root"));

        let issues = vec![c_root, c_dep, s_root, s_dep, a_root, a_dep];
        let convoys = derive_convoys(&issues, &[], now);
        let order: Vec<&str> = convoys.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(order, vec!["s-root", "a-root", "c-root"]);
    }

    #[test]
    fn test_duplicate_edges_dedup_members() {
        let now = Utc::now();
        let mut f = issue("f", IssueType::Feature, IssueStatus::Open);
        f.updated_at = now;
        let mut a = issue("a", IssueType::Task, IssueStatus::Open);
        a.dependencies.push(edge("a", "f"));
        a.dependencies.push(edge("a", "f"));

        let convoys = derive_convoys(&[f, a], &[], now);
        assert_eq!(convoys[0].issues, vec!["f", "a"]);
        assert_eq!(convoys[0].progress.total, 2);
    }
}

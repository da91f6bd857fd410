//! End-to-end convoy derivation examples over parsed log content.

mod common;

use chrono::{Duration, Utc};
use common::{depends_on, issue_record, issue_record_with};
use derrick::models::{ConvoyStatus, Progress, derive_convoys};
use derrick::sources::log::parse_log;

#[test]
fn test_feature_with_mixed_dependents_is_active() {
    // F (open), dependents A (closed) and B (in_progress)
    let raw = [
        issue_record("F", "the feature", "open", "feature"),
        issue_record_with("A", "part a", "closed", "task", &depends_on("A", "F")),
        issue_record_with("B", "part b", "in_progress", "task", &depends_on("B", "F")),
    ]
    .join("\n");
    let issues = parse_log(&raw);
    assert_eq!(issues.len(), 3);

    let convoys = derive_convoys(&issues, &[], Utc::now());
    assert_eq!(convoys.len(), 1);
    let convoy = &convoys[0];
    assert_eq!(convoy.id, "F");
    assert_eq!(convoy.issues, vec!["F", "A", "B"]);
    assert_eq!(convoy.progress, Progress { completed: 1, total: 3 });
    // B is in_progress, so not stalled; not all closed, so not completed
    assert_eq!(convoy.status, ConvoyStatus::Active);
}

#[test]
fn test_root_closure_counts_toward_progress() {
    // All three closed, root far in the past: completed wins over stalled
    let raw = [
        issue_record("F", "the feature", "closed", "feature"),
        issue_record_with("A", "part a", "closed", "task", &depends_on("A", "F")),
        issue_record_with("B", "part b", "closed", "task", &depends_on("B", "F")),
    ]
    .join("\n");
    let mut issues = parse_log(&raw);
    issues[0].updated_at = Utc::now() - Duration::days(30);

    let convoys = derive_convoys(&issues, &[], Utc::now());
    let convoy = &convoys[0];
    assert_eq!(convoy.progress, Progress { completed: 3, total: 3 });
    assert_eq!(convoy.status, ConvoyStatus::Completed);
}

#[test]
fn test_open_root_with_closed_dependents_still_counts_them() {
    let raw = [
        issue_record("F", "the feature", "open", "feature"),
        issue_record_with("A", "part a", "closed", "task", &depends_on("A", "F")),
        issue_record_with("B", "part b", "closed", "task", &depends_on("B", "F")),
    ]
    .join("\n");
    let mut issues = parse_log(&raw);
    issues[0].updated_at = Utc::now() - Duration::days(2);

    let convoys = derive_convoys(&issues, &[], Utc::now());
    let convoy = &convoys[0];
    // F itself is a member: 2 of 3 closed, so not completed
    assert_eq!(convoy.progress, Progress { completed: 2, total: 3 });
    // nothing live and the root is stale
    assert_eq!(convoy.status, ConvoyStatus::Stalled);
}

#[test]
fn test_transitive_dependents_excluded() {
    let raw = [
        issue_record("F", "root", "open", "molecule"),
        issue_record_with("A", "direct", "open", "task", &depends_on("A", "F")),
        issue_record_with("B", "indirect", "open", "task", &depends_on("B", "A")),
    ]
    .join("\n");
    let issues = parse_log(&raw);

    let convoys = derive_convoys(&issues, &[], Utc::now());
    assert_eq!(convoys.len(), 1);
    assert_eq!(convoys[0].issues, vec!["F", "A"]);
}

//! Rolling per-pane activity timelines.
//!
//! Each capture only shows a momentary snapshot, so the engine keeps a short
//! rolling history per monitored pane: the newly reduced current label is
//! appended only when it differs from the most recently recorded one, letting
//! repeated polling cycles build a timeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Max entries retained per pane.
pub const TIMELINE_LIMIT: usize = 5;

/// One recorded activity transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub label: String,
    pub at: DateTime<Utc>,
}

/// Rolling activity history across polling cycles, keyed by pane id.
#[derive(Debug, Default)]
pub struct ActivityTimeline {
    panes: Mutex<HashMap<String, VecDeque<ActivityEntry>>>,
}

impl ActivityTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly reduced current label for a pane.
    ///
    /// Returns `true` when the label was appended, `false` when it matched
    /// the most recent entry and was skipped.
    pub fn observe(&self, pane: &str, label: &str) -> bool {
        let mut panes = self.panes.lock().unwrap();
        let timeline = panes.entry(pane.to_string()).or_default();
        if timeline.back().is_some_and(|e| e.label == label) {
            return false;
        }
        timeline.push_back(ActivityEntry {
            label: label.to_string(),
            at: Utc::now(),
        });
        while timeline.len() > TIMELINE_LIMIT {
            timeline.pop_front();
        }
        true
    }

    /// The recorded timeline for a pane, oldest first.
    pub fn history(&self, pane: &str) -> Vec<ActivityEntry> {
        self.panes
            .lock()
            .unwrap()
            .get(pane)
            .map(|t| t.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop a pane's timeline (e.g., when its session ends).
    pub fn forget(&self, pane: &str) {
        self.panes.lock().unwrap().remove(pane);
    }
}

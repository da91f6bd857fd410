//! Work-item log reader.
//!
//! The log is an append-only, line-oriented store of JSON issue records.
//! This is the one mandatory source: if it cannot be read, the whole
//! aggregation fails. A malformed line is skipped, never fatal.

use std::path::Path;
use tracing::warn;

use crate::models::Issue;
use crate::{Error, Result};

/// Read the full current content of the work-item log.
///
/// Later records for the same id supersede earlier ones, matching the
/// append-only write pattern of the producers.
pub fn read_log(path: &Path) -> Result<Vec<Issue>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::LogUnavailable(format!("{}: {}", path.display(), e)))?;
    Ok(parse_log(&raw))
}

/// Parse log content, skipping malformed lines.
pub fn parse_log(raw: &str) -> Vec<Issue> {
    let mut issues: Vec<Issue> = Vec::new();
    for (lineno, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Issue>(line) {
            Ok(issue) => {
                if let Some(existing) = issues.iter_mut().find(|i| i.id == issue.id) {
                    *existing = issue;
                } else {
                    issues.push(issue);
                }
            }
            Err(e) => {
                warn!(line = lineno + 1, error = %e, "skipping malformed log line");
            }
        }
    }
    issues
}

//! Common test utilities for derrick integration tests.
//!
//! Provides `MockRunner` (a scriptable command-execution collaborator that
//! records every invocation) and fixture builders for work-item log files.

#![allow(dead_code)]

use async_trait::async_trait;
use derrick::sources::{CommandRunner, CommandSpec};
use derrick::{Error, Result};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
pub use tempfile::TempDir;

#[derive(Clone)]
enum Reply {
    Output(String),
    Fail(String),
}

struct Rule {
    needle: String,
    reply: Reply,
    delay: Duration,
}

/// Scriptable command runner.
///
/// Rules match on a substring of the rendered command line; the first match
/// wins. Unmatched commands fail, like an absent binary would.
#[derive(Default)]
pub struct MockRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<String>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to commands containing `needle` with canned stdout.
    pub fn respond(&self, needle: &str, output: &str) {
        self.rules.lock().unwrap().push(Rule {
            needle: needle.to_string(),
            reply: Reply::Output(output.to_string()),
            delay: Duration::ZERO,
        });
    }

    /// Like `respond`, but the reply takes `delay` to arrive. Lets tests
    /// overlap concurrent callers deterministically.
    pub fn respond_slow(&self, needle: &str, output: &str, delay: Duration) {
        self.rules.lock().unwrap().push(Rule {
            needle: needle.to_string(),
            reply: Reply::Output(output.to_string()),
            delay,
        });
    }

    /// Fail commands containing `needle`.
    pub fn fail(&self, needle: &str, message: &str) {
        self.rules.lock().unwrap().push(Rule {
            needle: needle.to_string(),
            reply: Reply::Fail(message.to_string()),
            delay: Duration::ZERO,
        });
    }

    /// Drop all rules (subsequent calls fail).
    pub fn clear(&self) {
        self.rules.lock().unwrap().clear();
    }

    /// Every command line run so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls whose command line contains `needle`.
    pub fn count_calls(&self, needle: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.contains(needle))
            .count()
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, spec: &CommandSpec, _timeout: Duration) -> Result<String> {
        let line = spec.display();
        self.calls.lock().unwrap().push(line.clone());
        let matched = {
            let rules = self.rules.lock().unwrap();
            rules
                .iter()
                .find(|r| line.contains(&r.needle))
                .map(|r| (r.reply.clone(), r.delay))
        };
        match matched {
            Some((reply, delay)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                match reply {
                    Reply::Output(out) => Ok(out),
                    Reply::Fail(msg) => Err(Error::CommandFailed(msg)),
                }
            }
            None => Err(Error::CommandFailed(format!("no rule for: {}", line))),
        }
    }
}

/// A JSON work-item record for the log file.
pub fn issue_record(id: &str, title: &str, status: &str, issue_type: &str) -> String {
    format!(
        r#"{{"id":"{id}","title":"{title}","status":"{status}","type":"{issue_type}","created_at":"2026-08-01T10:00:00Z","updated_at":"2026-08-01T10:00:00Z"}}"#
    )
}

/// Record with extra JSON fields spliced in (e.g., dependencies, labels).
pub fn issue_record_with(
    id: &str,
    title: &str,
    status: &str,
    issue_type: &str,
    extra: &str,
) -> String {
    format!(
        r#"{{"id":"{id}","title":"{title}","status":"{status}","type":"{issue_type}",{extra},"created_at":"2026-08-01T10:00:00Z","updated_at":"2026-08-01T10:00:00Z"}}"#
    )
}

/// Write a work-item log file from records.
pub fn write_log(dir: &Path, records: &[String]) {
    let mut content = records.join("\n");
    content.push('\n');
    std::fs::write(dir.join("issues.jsonl"), content).unwrap();
}

/// An edge fragment for `issue_record_with`.
pub fn depends_on(issue_id: &str, root: &str) -> String {
    format!(
        r#""dependencies":[{{"issue_id":"{issue_id}","depends_on_id":"{root}","type":"blocks"}}]"#
    )
}

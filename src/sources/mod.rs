//! Source fetchers and the partial-failure policy.
//!
//! Every live fetch runs through a caller-supplied timeout and reports its
//! outcome as data: `Sourced<T>` pairs the fetched (or degraded) value with a
//! `SourceHealth`. A failed or slow optional source degrades to an empty
//! value for the cycle; only the work-item-log read is mandatory.

pub mod convoys;
pub mod live;
pub mod log;
pub mod refinery;
pub mod registry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{Error, Result};

/// Health of one source for one aggregation cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "detail")]
pub enum SourceHealth {
    #[default]
    Ok,
    Degraded(String),
}

impl SourceHealth {
    pub fn is_degraded(&self) -> bool {
        matches!(self, SourceHealth::Degraded(_))
    }
}

/// A fetched value paired with its source health.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sourced<T> {
    pub value: T,
    pub health: SourceHealth,
}

impl<T> Sourced<T> {
    pub fn ok(value: T) -> Self {
        Self {
            value,
            health: SourceHealth::Ok,
        }
    }

    pub fn degraded(value: T, reason: impl Into<String>) -> Self {
        Self {
            value,
            health: SourceHealth::Degraded(reason.into()),
        }
    }
}

/// An external command to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Build from a config command line (program first, then args).
    ///
    /// Returns `None` for an empty line.
    pub fn from_line(line: &[String]) -> Option<Self> {
        let (program, args) = line.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    /// A copy with every occurrence of `placeholder` in the args replaced.
    pub fn substituted(&self, placeholder: &str, value: &str) -> Self {
        Self {
            program: self.program.clone(),
            args: self
                .args
                .iter()
                .map(|a| a.replace(placeholder, value))
                .collect(),
        }
    }

    /// Render for log messages.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Command-execution collaborator: runs a command under a timeout and
/// returns its stdout text.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec, timeout: Duration) -> Result<String>;
}

/// Production runner backed by `tokio::process`.
#[derive(Debug, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec, timeout: Duration) -> Result<String> {
        let fut = tokio::process::Command::new(&spec.program)
            .args(&spec.args)
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(timeout, fut)
            .await
            .map_err(|_| Error::Timeout(timeout.as_millis() as u64))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::CommandFailed(format!(
                "{}: {}",
                spec.display(),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_from_line() {
        let line = vec!["overseer".to_string(), "status".to_string(), "--json".to_string()];
        let spec = CommandSpec::from_line(&line).unwrap();
        assert_eq!(spec.program, "overseer");
        assert_eq!(spec.args, vec!["status", "--json"]);
        assert!(CommandSpec::from_line(&[]).is_none());
    }

    #[test]
    fn test_command_spec_substitution() {
        let spec = CommandSpec::new("overseer", &["convoy", "show", "{id}", "--json"]);
        let subbed = spec.substituted("{id}", "dk-42");
        assert_eq!(subbed.args, vec!["convoy", "show", "dk-42", "--json"]);
        // original untouched
        assert_eq!(spec.args[2], "{id}");
    }

    #[test]
    fn test_sourced_health() {
        let ok: Sourced<Vec<u8>> = Sourced::ok(vec![]);
        assert!(!ok.health.is_degraded());
        let bad: Sourced<Vec<u8>> = Sourced::degraded(vec![], "timeout");
        assert!(bad.health.is_degraded());
    }

    #[tokio::test]
    async fn test_system_runner_captures_stdout() {
        let spec = CommandSpec::new("echo", &["hello"]);
        let out = SystemRunner.run(&spec, Duration::from_secs(5)).await.unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[tokio::test]
    async fn test_system_runner_nonzero_exit_is_error() {
        let spec = CommandSpec::new("false", &[]);
        let err = SystemRunner.run(&spec, Duration::from_secs(5)).await;
        assert!(matches!(err, Err(Error::CommandFailed(_))));
    }

    #[tokio::test]
    async fn test_system_runner_times_out() {
        let spec = CommandSpec::new("sleep", &["5"]);
        let err = SystemRunner.run(&spec, Duration::from_millis(50)).await;
        assert!(matches!(err, Err(Error::Timeout(_))));
    }
}

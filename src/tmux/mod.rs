//! Terminal-capture collaborator.
//!
//! Monitored agent processes run inside tmux panes; the activity reducer
//! works on their visible text. `TmuxCommand` generates tmux CLI invocations
//! (it does not execute them); `TmuxCapture` runs them through the
//! command-execution collaborator.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::Result;
use crate::sources::{CommandRunner, CommandSpec};

/// Builder for tmux command invocations.
#[derive(Debug, Clone)]
pub struct TmuxCommand {
    args: Vec<String>,
}

impl TmuxCommand {
    fn new(command: &str) -> Self {
        Self {
            args: vec![command.to_string()],
        }
    }

    fn flag(mut self, flag: &str) -> Self {
        self.args.push(flag.to_string());
        self
    }

    fn flag_with_value(mut self, flag: &str, value: &str) -> Self {
        self.args.push(flag.to_string());
        self.args.push(value.to_string());
        self
    }

    /// Build the runnable spec.
    pub fn build(self) -> CommandSpec {
        CommandSpec {
            program: "tmux".to_string(),
            args: self.args,
        }
    }

    /// Capture a pane's visible text.
    ///
    /// `-p` prints to stdout; `-J` joins wrapped lines so the reducer sees
    /// logical lines.
    pub fn capture_pane(target: &str) -> Self {
        Self::new("capture-pane")
            .flag("-p")
            .flag("-J")
            .flag_with_value("-t", target)
    }

    /// Check whether a session exists.
    pub fn has_session(session: &str) -> Self {
        Self::new("has-session").flag_with_value("-t", session)
    }
}

/// Terminal-capture collaborator: returns a session's recent visible text.
#[async_trait]
pub trait PaneCapture: Send + Sync {
    async fn capture(&self, target: &str) -> Result<String>;
}

/// Production capture backed by the tmux CLI.
pub struct TmuxCapture {
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
}

impl TmuxCapture {
    pub fn new(runner: Arc<dyn CommandRunner>, timeout: Duration) -> Self {
        Self { runner, timeout }
    }
}

#[async_trait]
impl PaneCapture for TmuxCapture {
    async fn capture(&self, target: &str) -> Result<String> {
        let spec = TmuxCommand::capture_pane(target).build();
        self.runner.run(&spec, self.timeout).await
    }
}

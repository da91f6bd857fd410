//! Activity reduction for monitored terminal panes.
//!
//! Each monitored process exposes only a momentary text capture of its pane.
//! The reducer scans that capture from the most recent line backward and
//! compresses it into a current activity label, the invoked tool (when one is
//! visible), and a short history of earlier distinct activities.

pub mod history;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub use history::{ActivityEntry, ActivityTimeline, TIMELINE_LIMIT};

/// Max number of history entries collected from a single capture.
const HISTORY_LIMIT: usize = 3;

/// Character budget for tool arguments before ellipsis truncation.
const ARG_BUDGET: usize = 50;

/// Character budget for waiting/fallback labels.
const LINE_BUDGET: usize = 60;

/// Spinner glyphs that start a processing marker line.
const PROCESSING_GLYPHS: &str = "✻✽✶✳✢·";

/// Glyphs whose presence anywhere in a capture rules out the idle branch.
/// The interpunct is excluded: it also appears in hint chrome.
const BUSY_GLYPHS: &[char] = &['✻', '✽', '✶', '✳', '✢', '⏺'];

/// Hint strings the hosting shell paints around the prompt.
const HINT_STRINGS: &[&str] = &[
    "? for shortcuts",
    "esc to interrupt",
    "ctrl+c to exit",
    "ctrl+r to expand",
    "auto-accept edits",
    "bypass permissions",
    "shift+tab to cycle",
];

/// Compact summary of one pane capture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySummary {
    /// Current activity label
    pub current: String,

    /// Tool name when the current activity is a tool invocation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,

    /// Up to three earlier distinct activities, most recent first
    #[serde(default)]
    pub history: Vec<String>,
}

#[derive(Debug, Clone)]
struct Classified {
    label: String,
    tool: Option<String>,
}

fn processing_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"^\s*[{PROCESSING_GLYPHS}]\s+(\p{{Alphabetic}}[^(…]*?)(?:…|\.{{3}})?\s*\((\d+)s"
        ))
        .unwrap()
    })
}

fn tool_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*⏺\s*([A-Za-z][A-Za-z0-9_-]*)\((.*)\)\s*$").unwrap())
}

fn running_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Either a Running continuation (optionally naming the command) or a
    // plain `$ cmd` line. A bare `$` is prompt chrome, not a command.
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:⎿\s*Running(?:…|\.{3})?(?:\s+(.*))?|\$\s+(.+))$").unwrap()
    })
}

/// Classify a single capture line, or `None` for unclassified lines.
fn classify(line: &str) -> Option<Classified> {
    if let Some(cap) = tool_re().captures(line) {
        let name = cap[1].to_string();
        let args = cap[2].trim();
        let label = if args.is_empty() {
            name.clone()
        } else {
            format!("{}: {}", name, truncate(args, ARG_BUDGET))
        };
        return Some(Classified {
            label,
            tool: Some(name),
        });
    }
    if let Some(cap) = processing_re().captures(line) {
        let verb = cap[1].trim();
        let secs = &cap[2];
        return Some(Classified {
            label: format!("{} ({}s)", verb, secs),
            tool: None,
        });
    }
    if let Some(cap) = running_re().captures(line) {
        let cmd = cap
            .get(1)
            .or_else(|| cap.get(2))
            .map(|m| m.as_str().trim())
            .unwrap_or("");
        let label = if cmd.is_empty() {
            "Running…".to_string()
        } else {
            format!("Running: {}", truncate(cmd, ARG_BUDGET))
        };
        return Some(Classified { label, tool: None });
    }
    None
}

/// Reduce a raw pane capture (most recent lines last) to a summary.
pub fn reduce(capture: &str) -> ActivitySummary {
    let lines: Vec<&str> = capture.lines().collect();

    let mut current: Option<Classified> = None;
    let mut history: Vec<String> = Vec::new();
    for line in lines.iter().rev() {
        let Some(found) = classify(line) else {
            continue;
        };
        match &current {
            None => current = Some(found),
            Some(cur) => {
                if found.label != cur.label && !history.contains(&found.label) {
                    history.push(found.label);
                    if history.len() == HISTORY_LIMIT {
                        break;
                    }
                }
            }
        }
    }

    if let Some(cur) = current {
        return ActivitySummary {
            current: cur.label,
            tool: cur.tool,
            history,
        };
    }

    // Idle branch: a visible prompt and no busy glyph anywhere.
    if has_prompt_marker(&lines) && !capture.contains(BUSY_GLYPHS) {
        let tail: Vec<&str> = lines
            .iter()
            .copied()
            .filter(|l| !is_chrome(l))
            .collect();
        let recent: Vec<&str> = tail.iter().rev().take(3).rev().copied().collect();
        let joined = recent
            .iter()
            .map(|l| l.trim())
            .collect::<Vec<_>>()
            .join(" ");
        if joined.trim().is_empty() {
            return ActivitySummary {
                current: "At prompt".to_string(),
                ..Default::default()
            };
        }
        return ActivitySummary {
            current: format!("Waiting: {}", truncate(joined.trim(), LINE_BUDGET)),
            ..Default::default()
        };
    }

    // Last resort: the most recent line with visible content.
    let fallback = lines
        .iter()
        .rev()
        .map(|l| l.trim())
        .find(|l| !l.is_empty() && !is_separator(l));
    match fallback {
        Some(line) => ActivitySummary {
            current: truncate(line, LINE_BUDGET),
            ..Default::default()
        },
        None => ActivitySummary {
            current: "No output".to_string(),
            ..Default::default()
        },
    }
}

/// Truncate to `budget` characters, appending an ellipsis when cut.
fn truncate(s: &str, budget: usize) -> String {
    if s.chars().count() <= budget {
        return s.to_string();
    }
    let mut out: String = s.chars().take(budget).collect();
    out.push_str("...");
    out
}

fn has_prompt_marker(lines: &[&str]) -> bool {
    lines.iter().any(|l| {
        let stripped = strip_box_chars(l);
        let t = stripped.trim();
        t == ">" || t.starts_with("> ") || t == "❯" || t.starts_with("❯ ")
    })
}

fn strip_box_chars(line: &str) -> String {
    line.chars()
        .filter(|c| !matches!(c, '│' | '┃' | '║' | '╭' | '╮' | '╰' | '╯' | '┌' | '┐' | '└' | '┘'))
        .collect()
}

fn is_separator(line: &str) -> bool {
    let t = line.trim();
    t.len() >= 3 && t.chars().all(|c| matches!(c, '─' | '━' | '═' | '-' | '=' | '_' | '╌' | '┄'))
}

/// Chrome: separators, box-drawing shells, hint strings, bare prompt glyphs.
fn is_chrome(line: &str) -> bool {
    let stripped = strip_box_chars(line);
    let t = stripped.trim();
    if t.is_empty() || is_separator(t) {
        return true;
    }
    if matches!(t, ">" | "❯" | "$" | ">>>") {
        return true;
    }
    if t.starts_with('>') || t.starts_with('❯') {
        return true;
    }
    HINT_STRINGS.iter().any(|h| t.contains(h))
}

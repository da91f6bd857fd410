//! Engine configuration.
//!
//! Loaded from a TOML file with the precedence: explicit `--config` flag >
//! `DK_CONFIG` env var > `<workdir>/derrick.toml` > built-in defaults.
//! Relative data paths resolve against the workdir.
//!
//! ```toml
//! log_path = "issues.jsonl"
//! registry_path = "rigs.toml"
//! snapshot_ttl_ms = 30000
//! live_ttl_ms = 5000
//! fetch_timeout_ms = 5000
//!
//! [commands]
//! status = ["overseer", "status", "--json"]
//! convoy_list = ["overseer", "convoy", "list", "--json"]
//! convoy_detail = ["overseer", "convoy", "show", "{id}", "--json"]
//! refinery = ["overseer", "refinery", "status", "--json"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sources::CommandSpec;
use crate::{Error, Result};

/// Config file name looked up in the workdir.
pub const CONFIG_FILE: &str = "derrick.toml";

/// Env var naming an explicit config file.
pub const CONFIG_ENV: &str = "DK_CONFIG";

fn default_log_path() -> PathBuf {
    PathBuf::from("issues.jsonl")
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("rigs.toml")
}

fn default_snapshot_ttl_ms() -> u64 {
    30_000
}

fn default_live_ttl_ms() -> u64 {
    5_000
}

fn default_fetch_timeout_ms() -> u64 {
    5_000
}

/// External command lines, program first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandTable {
    pub status: Vec<String>,
    pub convoy_list: Vec<String>,
    pub convoy_detail: Vec<String>,
    pub refinery: Vec<String>,
}

impl Default for CommandTable {
    fn default() -> Self {
        let line = |parts: &[&str]| parts.iter().map(|s| s.to_string()).collect();
        Self {
            status: line(&["overseer", "status", "--json"]),
            convoy_list: line(&["overseer", "convoy", "list", "--json"]),
            convoy_detail: line(&["overseer", "convoy", "show", "{id}", "--json"]),
            refinery: line(&["overseer", "refinery", "status", "--json"]),
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Work-item log, relative to the workdir unless absolute
    pub log_path: PathBuf,

    /// Rig registry file, relative to the workdir unless absolute
    pub registry_path: PathBuf,

    /// Full-snapshot cache TTL
    pub snapshot_ttl_ms: u64,

    /// Live-status sub-fetch TTL
    pub live_ttl_ms: u64,

    /// Per-fetch timeout for external commands
    pub fetch_timeout_ms: u64,

    pub commands: CommandTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_path: default_log_path(),
            registry_path: default_registry_path(),
            snapshot_ttl_ms: default_snapshot_ttl_ms(),
            live_ttl_ms: default_live_ttl_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            commands: CommandTable::default(),
        }
    }
}

impl Config {
    /// Load config with the documented precedence chain.
    ///
    /// A missing default-location file yields defaults; a missing explicitly
    /// named file is an error.
    pub fn load(workdir: &Path, explicit: Option<&Path>) -> Result<Self> {
        let explicit = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => std::env::var_os(CONFIG_ENV).map(PathBuf::from),
        };

        if let Some(path) = explicit {
            let raw = std::fs::read_to_string(&path)
                .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
            return Self::parse(&raw);
        }

        let default_path = workdir.join(CONFIG_FILE);
        match std::fs::read_to_string(&default_path) {
            Ok(raw) => Self::parse(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(Error::Config(format!("{}: {}", default_path.display(), e))),
        }
    }

    /// Parse config content, validating command lines.
    pub fn parse(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, line) in [
            ("status", &self.commands.status),
            ("convoy_list", &self.commands.convoy_list),
            ("convoy_detail", &self.commands.convoy_detail),
            ("refinery", &self.commands.refinery),
        ] {
            if line.is_empty() {
                return Err(Error::Config(format!("commands.{} must not be empty", name)));
            }
        }
        Ok(())
    }

    /// Resolve a data path against the workdir.
    pub fn resolve(&self, workdir: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            workdir.join(path)
        }
    }

    pub fn log_path(&self, workdir: &Path) -> PathBuf {
        self.resolve(workdir, &self.log_path)
    }

    pub fn registry_path(&self, workdir: &Path) -> PathBuf {
        self.resolve(workdir, &self.registry_path)
    }

    pub fn snapshot_ttl(&self) -> Duration {
        Duration::from_millis(self.snapshot_ttl_ms)
    }

    pub fn live_ttl(&self) -> Duration {
        Duration::from_millis(self.live_ttl_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Command spec for a configured line. Validation guarantees non-empty.
    pub fn command(&self, line: &[String]) -> CommandSpec {
        CommandSpec::from_line(line).unwrap_or_else(|| CommandSpec::new("false", &[]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.snapshot_ttl(), Duration::from_secs(30));
        assert_eq!(config.live_ttl(), Duration::from_secs(5));
        assert_eq!(config.commands.status[0], "overseer");
    }

    #[test]
    fn test_parse_partial_file_keeps_defaults() {
        let config = Config::parse("snapshot_ttl_ms = 1000\n").unwrap();
        assert_eq!(config.snapshot_ttl(), Duration::from_secs(1));
        assert_eq!(config.live_ttl_ms, 5_000);
        assert_eq!(config.log_path, PathBuf::from("issues.jsonl"));
    }

    #[test]
    fn test_parse_commands_override() {
        let raw = r#"
[commands]
status = ["gt", "town", "status", "--json"]
"#;
        let config = Config::parse(raw).unwrap();
        assert_eq!(config.commands.status[0], "gt");
        // untouched entries keep defaults
        assert_eq!(config.commands.refinery[0], "overseer");
    }

    #[test]
    fn test_parse_rejects_empty_command() {
        let raw = "[commands]\nstatus = []\n";
        assert!(matches!(Config::parse(raw), Err(Error::Config(_))));
    }

    #[test]
    fn test_path_resolution() {
        let config = Config::default();
        let workdir = Path::new("/work/town");
        assert_eq!(
            config.log_path(workdir),
            PathBuf::from("/work/town/issues.jsonl")
        );

        let mut abs = config.clone();
        abs.log_path = PathBuf::from("/var/log/issues.jsonl");
        assert_eq!(abs.log_path(workdir), PathBuf::from("/var/log/issues.jsonl"));
    }

    #[test]
    fn test_load_missing_default_is_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path(), None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_explicit_missing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Config::load(dir.path(), Some(&missing)).is_err());
    }

    #[test]
    fn test_load_from_workdir_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "live_ttl_ms = 250\n").unwrap();
        let config = Config::load(dir.path(), None).unwrap();
        assert_eq!(config.live_ttl_ms, 250);
    }
}

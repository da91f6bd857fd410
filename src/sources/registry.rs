//! Rig registry reader.
//!
//! The registry file is the canonical source for rig records; issue-derived
//! rigs only fill in names the registry does not know.
//!
//! Format:
//!
//! ```toml
//! [rigs.citadel]
//! repository = "/srv/rigs/citadel"
//! prefix = "ct"
//! state = "active"
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::Result;
use crate::models::{Rig, RigState};

#[derive(Debug, Default, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    rigs: BTreeMap<String, RegistryEntry>,
}

#[derive(Debug, Deserialize)]
struct RegistryEntry {
    repository: String,
    #[serde(default)]
    prefix: String,
    #[serde(default)]
    state: RigState,
}

/// Read the rig registry file. Rigs are returned sorted by name.
pub fn read_registry(path: &Path) -> Result<Vec<Rig>> {
    let raw = std::fs::read_to_string(path)?;
    parse_registry(&raw)
}

/// Parse registry content.
pub fn parse_registry(raw: &str) -> Result<Vec<Rig>> {
    let file: RegistryFile = toml::from_str(raw)?;
    Ok(file
        .rigs
        .into_iter()
        .map(|(name, entry)| Rig {
            name,
            repository: entry.repository,
            prefix: entry.prefix,
            state: entry.state,
        })
        .collect())
}

//! CLI Commands

pub mod applicability;
pub mod catalog;
pub mod config;
pub mod score;

use anyhow::Context;
use mizan_compliance::ControlCatalog;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Read a YAML or JSON document
pub fn read_document<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
}

/// Built-in catalog, or a JSON catalog file
pub fn load_catalog(path: Option<&Path>) -> anyhow::Result<ControlCatalog> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            ControlCatalog::from_json(&content).with_context(|| format!("invalid catalog {}", path.display()))
        }
        None => Ok(ControlCatalog::builtin()?),
    }
}

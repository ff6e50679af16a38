//! Monitored page definitions.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Result;

/// A page being watched for content changes.
///
/// Identity is the URL; the label is display-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredEntity {
    /// Source URL, stable across runs
    pub key: String,

    /// Human-friendly display name
    pub label: String,
}

impl MonitoredEntity {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}

/// On-disk entry of the URL list file.
#[derive(Debug, Deserialize)]
struct EntityEntry {
    url: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EntityFile {
    #[serde(default, rename = "entity")]
    entities: Vec<EntityEntry>,
}

/// Parse a TOML URL list.
///
/// ```toml
/// [[entity]]
/// url = "https://example.gov/a"
/// name = "Program page"
/// ```
///
/// Entries without an absolute http(s) URL are skipped with a warning.
pub fn parse_entities(content: &str) -> Result<Vec<MonitoredEntity>> {
    let file: EntityFile = toml::from_str(content)?;
    let mut entities = Vec::with_capacity(file.entities.len());

    for entry in file.entities {
        let key = entry.url.trim().to_string();
        let label = entry
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| key.clone());

        if !is_monitorable(&key) {
            log::warn!("No usable URL for item: {} ({:?})", label, key);
            continue;
        }
        entities.push(MonitoredEntity { key, label });
    }

    Ok(entities)
}

/// Load the URL list from a TOML file.
pub fn load_entities(path: impl AsRef<Path>) -> Result<Vec<MonitoredEntity>> {
    let content = fs::read_to_string(path.as_ref())?;
    let entities = parse_entities(&content)?;
    log::info!(
        "Loaded {} URLs from {}",
        entities.len(),
        path.as_ref().display()
    );
    Ok(entities)
}

fn is_monitorable(key: &str) -> bool {
    Url::parse(key)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

//! Persisted page snapshots.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

/// Snapshot mapping keyed by entity URL.
///
/// Ordered so the persisted file is stable between runs.
pub type SnapshotMap = BTreeMap<String, Snapshot>;

/// SHA-256 of the UTF-8 text, lowercase hex.
pub fn fingerprint(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Last known content of one monitored page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Last seen display name
    #[serde(rename = "name", default)]
    pub label: String,

    /// Digest of `content`
    #[serde(rename = "hash", default)]
    pub fingerprint: String,

    /// Normalized text at the last successful fetch
    #[serde(default)]
    pub content: String,

    /// Time of the last successful fetch
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub last_checked: DateTime<Utc>,
}

/// Accepts RFC 3339 as well as naive ISO 8601 timestamps (read as UTC), so
/// stores written without an offset stay loadable.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

impl Snapshot {
    /// Build a snapshot from freshly fetched text.
    pub fn capture(label: impl Into<String>, content: impl Into<String>, at: DateTime<Utc>) -> Self {
        let content = content.into();
        Self {
            label: label.into(),
            fingerprint: fingerprint(&content),
            content,
            last_checked: at,
        }
    }

    /// A snapshot without a fingerprint carries no usable history.
    pub fn has_fingerprint(&self) -> bool {
        !self.fingerprint.trim().is_empty()
    }

    /// Whether `fingerprint` still matches `content`.
    pub fn is_consistent(&self) -> bool {
        self.fingerprint == fingerprint(&self.content)
    }
}

//! Storage abstractions for snapshot persistence.
//!
//! A run loads the whole mapping once at start and writes it back once at
//! the end. A crash in between leaves the previous run's file authoritative.
//!
//! ## File Layout
//!
//! ```text
//! snapshots.json
//! {
//!   "https://example.gov/a": {
//!     "name": "Program page",
//!     "hash": "<sha256 hex>",
//!     "content": "normalized text...",
//!     "last_checked": "2026-01-05T09:00:00Z"
//!   }
//! }
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::SnapshotMap;

// Re-export for convenience
pub use local::LocalSnapshotStore;

/// Trait for snapshot storage backends.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the persisted mapping.
    ///
    /// Absent or unreadable state yields an empty mapping instead of an
    /// error; monitoring continues with every page classified as new.
    async fn load(&self) -> SnapshotMap;

    /// Replace the persisted mapping with `snapshots` in full.
    async fn save(&self, snapshots: &SnapshotMap) -> Result<()>;

    /// Human-readable location for logs.
    fn location(&self) -> String;
}

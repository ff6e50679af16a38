// src/models/mod.rs

//! Domain models for the monitor.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod classification;
mod config;
mod entity;
mod snapshot;

// Re-export all public types
pub use classification::{ClassificationResult, RunCounts, RunReport};
pub use config::{Config, DiffConfig, LoggingConfig, MonitorConfig, PathsConfig};
pub use entity::{MonitoredEntity, load_entities, parse_entities};
pub use snapshot::{Snapshot, SnapshotMap, fingerprint};

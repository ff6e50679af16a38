//! Pipeline stages of a monitoring run.
//!
//! - `diff`: Line-level change summaries between two texts
//! - `classify`: New / Unchanged / Changed / Error decisions per page
//! - `monitor`: One full run over the URL list (`run_monitor`)
//! - `report`: Markdown, text and JSON renderings of a run

pub mod classify;
pub mod diff;
pub mod monitor;
pub mod report;

pub use classify::ChangeClassifier;
pub use diff::{DiffCalculator, DiffSummary};
pub use monitor::run_monitor;

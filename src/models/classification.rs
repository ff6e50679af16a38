//! Per-page outcomes of one monitoring run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::pipeline::DiffSummary;

/// Outcome for one monitored page in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClassificationResult {
    /// First successful fetch; baseline saved
    New { key: String, label: String },

    /// Content fingerprint matches the stored snapshot
    Unchanged { key: String, label: String },

    /// Content differs from the stored snapshot
    Changed {
        key: String,
        label: String,
        diff: DiffSummary,
        previous_checked_at: DateTime<Utc>,
    },

    /// Fetch failed; stored snapshot neither confirmed nor replaced
    Error {
        key: String,
        label: String,
        error: FetchError,
    },
}

impl ClassificationResult {
    pub fn key(&self) -> &str {
        match self {
            Self::New { key, .. }
            | Self::Unchanged { key, .. }
            | Self::Changed { key, .. }
            | Self::Error { key, .. } => key,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::New { label, .. }
            | Self::Unchanged { label, .. }
            | Self::Changed { label, .. }
            | Self::Error { label, .. } => label,
        }
    }

    /// Lowercase variant name, as serialized.
    pub fn status(&self) -> &'static str {
        match self {
            Self::New { .. } => "new",
            Self::Unchanged { .. } => "unchanged",
            Self::Changed { .. } => "changed",
            Self::Error { .. } => "error",
        }
    }
}

/// Counts per outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounts {
    pub changed: usize,
    pub new: usize,
    pub unchanged: usize,
    pub errors: usize,
}

impl RunCounts {
    pub fn total(&self) -> usize {
        self.changed + self.new + self.unchanged + self.errors
    }
}

/// Complete result list of one run, one entry per input entity, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_date: DateTime<Utc>,
    pub entity_count: usize,
    pub results: Vec<ClassificationResult>,
}

impl RunReport {
    pub fn new(run_date: DateTime<Utc>, results: Vec<ClassificationResult>) -> Self {
        Self {
            run_date,
            entity_count: results.len(),
            results,
        }
    }

    /// Report for a run with nothing to monitor.
    pub fn empty(run_date: DateTime<Utc>) -> Self {
        Self::new(run_date, Vec::new())
    }

    pub fn changed(&self) -> impl Iterator<Item = &ClassificationResult> {
        self.filtered(|r| matches!(r, ClassificationResult::Changed { .. }))
    }

    pub fn new_entities(&self) -> impl Iterator<Item = &ClassificationResult> {
        self.filtered(|r| matches!(r, ClassificationResult::New { .. }))
    }

    pub fn unchanged(&self) -> impl Iterator<Item = &ClassificationResult> {
        self.filtered(|r| matches!(r, ClassificationResult::Unchanged { .. }))
    }

    pub fn errors(&self) -> impl Iterator<Item = &ClassificationResult> {
        self.filtered(|r| matches!(r, ClassificationResult::Error { .. }))
    }

    fn filtered(
        &self,
        keep: fn(&ClassificationResult) -> bool,
    ) -> impl Iterator<Item = &ClassificationResult> {
        self.results.iter().filter(move |r| keep(r))
    }

    pub fn counts(&self) -> RunCounts {
        let mut counts = RunCounts::default();
        for result in &self.results {
            match result {
                ClassificationResult::New { .. } => counts.new += 1,
                ClassificationResult::Unchanged { .. } => counts.unchanged += 1,
                ClassificationResult::Changed { .. } => counts.changed += 1,
                ClassificationResult::Error { .. } => counts.errors += 1,
            }
        }
        counts
    }

    /// Whether anything worth notifying about happened.
    pub fn has_changes(&self) -> bool {
        let counts = self.counts();
        counts.changed > 0 || counts.new > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_partition_results() {
        let report = RunReport::new(
            Utc::now(),
            vec![
                ClassificationResult::New {
                    key: "a".into(),
                    label: "A".into(),
                },
                ClassificationResult::Unchanged {
                    key: "b".into(),
                    label: "B".into(),
                },
                ClassificationResult::Error {
                    key: "c".into(),
                    label: "C".into(),
                    error: FetchError::Timeout,
                },
            ],
        );

        let counts = report.counts();
        assert_eq!(counts.total(), report.entity_count);
        assert_eq!(counts.new, 1);
        assert_eq!(counts.errors, 1);
        assert_eq!(report.errors().next().unwrap().key(), "c");
        assert!(report.has_changes());
    }

    #[test]
    fn test_views_select_matching_variant() {
        let report = RunReport::new(
            Utc::now(),
            vec![
                ClassificationResult::Unchanged {
                    key: "u".into(),
                    label: "U".into(),
                },
                ClassificationResult::New {
                    key: "n".into(),
                    label: "N".into(),
                },
                ClassificationResult::Changed {
                    key: "c".into(),
                    label: "C".into(),
                    diff: DiffSummary::default(),
                    previous_checked_at: Utc::now(),
                },
                ClassificationResult::Error {
                    key: "e".into(),
                    label: "E".into(),
                    error: FetchError::Timeout,
                },
            ],
        );

        let keys = |it: Vec<&ClassificationResult>| -> Vec<String> {
            it.into_iter().map(|r| r.key().to_string()).collect()
        };
        assert_eq!(keys(report.changed().collect()), ["c"]);
        assert_eq!(keys(report.new_entities().collect()), ["n"]);
        assert_eq!(keys(report.unchanged().collect()), ["u"]);
        assert_eq!(keys(report.errors().collect()), ["e"]);
    }

    #[test]
    fn test_serialized_status_tag() {
        let result = ClassificationResult::Error {
            key: "https://example.gov/a".into(),
            label: "A".into(),
            error: FetchError::HttpStatus(404),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"]["kind"], "http_status");
        assert_eq!(value["error"]["detail"], 404);
    }
}

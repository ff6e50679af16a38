//! Change classification against the previous run's snapshots.

use chrono::{DateTime, Utc};

use crate::error::FetchError;
use crate::models::{ClassificationResult, MonitoredEntity, Snapshot, SnapshotMap};

use super::diff::DiffCalculator;

/// Assigns a classification to each fetched page and builds the snapshot
/// mapping to persist.
///
/// Comparisons are always made against the snapshots loaded at the start of
/// the run, never against snapshots written earlier in the same run.
#[derive(Debug, Clone, Default)]
pub struct ChangeClassifier {
    diff: DiffCalculator,
}

impl ChangeClassifier {
    pub fn new(diff: DiffCalculator) -> Self {
        Self { diff }
    }

    /// Classify one fetch outcome and record the resulting snapshot in `next`.
    pub fn classify(
        &self,
        entity: &MonitoredEntity,
        fetched: Result<String, FetchError>,
        previous: &SnapshotMap,
        next: &mut SnapshotMap,
        now: DateTime<Utc>,
    ) -> ClassificationResult {
        let key = entity.key.clone();
        let label = entity.label.clone();
        let prior = previous.get(&entity.key).filter(|s| s.has_fingerprint());

        let text = match fetched {
            Ok(text) => text,
            Err(error) => {
                // Keep history through outages.
                if let Some(prior) = prior {
                    next.insert(key.clone(), prior.clone());
                }
                return ClassificationResult::Error { key, label, error };
            }
        };

        let Some(prior) = prior else {
            next.insert(key.clone(), Snapshot::capture(&label, text, now));
            return ClassificationResult::New { key, label };
        };

        if prior.label != label && !prior.label.is_empty() {
            log::info!("Label changed for {}: {:?} -> {:?}", key, prior.label, label);
        }

        let current = Snapshot::capture(&label, text, now);
        if current.fingerprint == prior.fingerprint {
            next.insert(
                key.clone(),
                Snapshot {
                    label: label.clone(),
                    fingerprint: prior.fingerprint.clone(),
                    content: prior.content.clone(),
                    last_checked: now,
                },
            );
            return ClassificationResult::Unchanged { key, label };
        }

        let diff = self.diff.calculate(&prior.content, &current.content);
        let previous_checked_at = prior.last_checked;
        next.insert(key.clone(), current);

        ClassificationResult::Changed {
            key,
            label,
            diff,
            previous_checked_at,
        }
    }

    /// Classify a whole run's fetch outcomes, in input order.
    pub fn classify_all<I>(
        &self,
        outcomes: I,
        previous: &SnapshotMap,
        now: DateTime<Utc>,
    ) -> (Vec<ClassificationResult>, SnapshotMap)
    where
        I: IntoIterator<Item = (MonitoredEntity, Result<String, FetchError>)>,
    {
        let mut next = SnapshotMap::new();
        let results = outcomes
            .into_iter()
            .map(|(entity, fetched)| self.classify(&entity, fetched, previous, &mut next, now))
            .collect();
        (results, next)
    }
}

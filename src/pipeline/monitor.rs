// src/pipeline/monitor.rs

//! One monitoring run: load, fetch + classify each page, save once.

use chrono::Utc;

use crate::error::Result;
use crate::models::{ClassificationResult, Config, MonitoredEntity, RunReport, SnapshotMap};
use crate::services::PageFetcher;
use crate::storage::SnapshotStore;
use crate::utils::log;

use super::classify::ChangeClassifier;
use super::diff::DiffCalculator;

/// Run the monitor over `entities`.
///
/// Pages are processed strictly one after another with the configured
/// politeness delay between fetches. Per-page failures become `Error`
/// results; only a failed store write fails the run, in which case nothing
/// from this run is persisted.
pub async fn run_monitor(
    config: &Config,
    entities: &[MonitoredEntity],
    fetcher: &dyn PageFetcher,
    store: &dyn SnapshotStore,
) -> Result<RunReport> {
    let run_date = Utc::now();
    log::header("URL Change Monitor - Starting");

    if entities.is_empty() {
        log::error("No URLs to monitor - check the URL list");
        return Ok(RunReport::empty(run_date));
    }

    let previous = store.load().await;
    log::info(&format!(
        "Checking {} URLs against {} stored snapshots",
        entities.len(),
        previous.len()
    ));

    let classifier = ChangeClassifier::new(DiffCalculator::from_config(&config.diff));
    let delay = config.monitor.politeness_delay();
    let mut next = SnapshotMap::new();
    let mut results = Vec::with_capacity(entities.len());

    for (idx, entity) in entities.iter().enumerate() {
        if idx > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        log::step(
            idx + 1,
            entities.len(),
            &format!("Checking: {} ({})", entity.label, entity.key),
        );
        let fetched = fetcher.fetch(&entity.key).await;
        let result = classifier.classify(entity, fetched, &previous, &mut next, Utc::now());
        log::sub_item(&describe(&result));
        results.push(result);
    }

    store.save(&next).await?;

    let report = RunReport::new(run_date, results);
    let counts = report.counts();
    log::summary(
        "URL Change Monitor - Done",
        &[
            ("Changed", counts.changed.to_string()),
            ("Unchanged", counts.unchanged.to_string()),
            ("New", counts.new.to_string()),
            ("Errors", counts.errors.to_string()),
            ("Snapshots", format!("{} saved to {}", next.len(), store.location())),
        ],
    );

    Ok(report)
}

fn describe(result: &ClassificationResult) -> String {
    match result {
        ClassificationResult::New { .. } => "NEW - first time seeing this URL".to_string(),
        ClassificationResult::Unchanged { .. } => "unchanged".to_string(),
        ClassificationResult::Changed { diff, .. } => format!(
            "CHANGED (+{} / -{} lines)",
            diff.added_total, diff.removed_total
        ),
        ClassificationResult::Error { error, .. } => format!("ERROR - {}", error),
    }
}

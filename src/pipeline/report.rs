// src/pipeline/report.rs

//! Human-readable renderings of a run's results.

use std::path::Path;

use crate::error::Result;
use crate::models::{ClassificationResult, RunReport};

/// Subject line for a notification about this run.
pub fn subject_line(report: &RunReport) -> String {
    let counts = report.counts();
    if report.has_changes() {
        format!("URL Monitor: {} changed, {} new", counts.changed, counts.new)
    } else {
        format!(
            "URL Monitor: no changes detected ({} URLs checked)",
            counts.unchanged
        )
    }
}

/// Markdown summary, suitable for a CI job summary.
pub fn render_markdown(report: &RunReport) -> String {
    let counts = report.counts();
    let mut parts = vec![
        "# URL Change Monitor\n".to_string(),
        format!("**Date:** {}", report.run_date.format("%Y-%m-%d %H:%M UTC")),
        format!("**URLs checked:** {}", report.entity_count),
        format!(
            "**Changed:** {} | **New:** {} | **Unchanged:** {} | **Errors:** {}\n",
            counts.changed, counts.new, counts.unchanged, counts.errors
        ),
    ];

    if counts.changed > 0 {
        parts.push("## Changed\n".to_string());
        for result in report.changed() {
            if let ClassificationResult::Changed {
                key, label, diff, ..
            } = result
            {
                parts.push(format!("### {}", label));
                parts.push(format!("URL: {}\n", key));
                parts.push("```diff".to_string());
                parts.push(diff.render());
                parts.push("```\n".to_string());
            }
        }
    }

    if counts.new > 0 {
        parts.push("## New (baseline saved)\n".to_string());
        for result in report.new_entities() {
            parts.push(format!("- **{}** — {}", result.label(), result.key()));
        }
        parts.push(String::new());
    }

    if counts.errors > 0 {
        parts.push("## Errors\n".to_string());
        for result in report.errors() {
            if let ClassificationResult::Error {
                key, label, error, ..
            } = result
            {
                parts.push(format!("- **{}** — {} ({})", label, key, error));
            }
        }
        parts.push(String::new());
    }

    if counts.unchanged > 0 {
        parts.push("## Unchanged\n".to_string());
        for result in report.unchanged() {
            parts.push(format!("- {} — {}", result.label(), result.key()));
        }
    }

    parts.join("\n")
}

/// Plain-text report body, suitable for an email.
pub fn render_text(report: &RunReport) -> String {
    let counts = report.counts();
    let heavy = "=".repeat(60);
    let light = "-".repeat(60);
    let mut parts = vec![
        format!(
            "URL Change Monitor Report — {}",
            report.run_date.format("%Y-%m-%d")
        ),
        format!("Checked {} URLs\n", report.entity_count),
    ];

    if counts.changed > 0 {
        parts.push(heavy.clone());
        parts.push(format!("CHANGED ({} URLs)", counts.changed));
        parts.push(format!("{}\n", heavy));
        for result in report.changed() {
            if let ClassificationResult::Changed {
                key,
                label,
                diff,
                previous_checked_at,
            } = result
            {
                parts.push(format!(">> {}", label));
                parts.push(format!("   {}", key));
                parts.push(format!(
                    "   Last checked: {}",
                    previous_checked_at.format("%Y-%m-%d %H:%M UTC")
                ));
                parts.push("   Changes:".to_string());
                for line in diff.render().lines() {
                    parts.push(format!("   {}", line));
                }
                parts.push(String::new());
            }
        }
    } else {
        parts.push("No pages changed since last check.\n".to_string());
    }

    if counts.new > 0 {
        parts.push(light.clone());
        parts.push(format!(
            "NEW ({} URLs — first check, baseline saved)",
            counts.new
        ));
        parts.push(light.clone());
        for result in report.new_entities() {
            parts.push(format!("  {} — {}", result.label(), result.key()));
        }
        parts.push(String::new());
    }

    if counts.errors > 0 {
        parts.push(light.clone());
        parts.push(format!("ERRORS ({} URLs — could not fetch)", counts.errors));
        parts.push(light.clone());
        for result in report.errors() {
            if let ClassificationResult::Error {
                key, label, error, ..
            } = result
            {
                parts.push(format!("  {} — {} ({})", label, key, error));
            }
        }
        parts.push(String::new());
    }

    if counts.unchanged > 0 {
        parts.push(light.clone());
        parts.push(format!("UNCHANGED ({} URLs)", counts.unchanged));
        parts.push(light);
        for result in report.unchanged() {
            parts.push(format!("  {} — {}", result.label(), result.key()));
        }
    }

    parts.join("\n")
}

/// Write the machine-readable results document.
pub fn write_results(path: impl AsRef<Path>, report: &RunReport) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::error::FetchError;
    use crate::pipeline::diff::summarize;

    fn sample_report() -> RunReport {
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap();
        RunReport::new(
            at,
            vec![
                ClassificationResult::Changed {
                    key: "https://example.gov/a".into(),
                    label: "A".into(),
                    diff: summarize("Program X is funded.", "Program X is funded.\nProgram Y added."),
                    previous_checked_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
                },
                ClassificationResult::New {
                    key: "https://example.gov/b".into(),
                    label: "B".into(),
                },
                ClassificationResult::Error {
                    key: "https://example.gov/c".into(),
                    label: "C".into(),
                    error: FetchError::HttpStatus(503),
                },
                ClassificationResult::Unchanged {
                    key: "https://example.gov/d".into(),
                    label: "D".into(),
                },
            ],
        )
    }

    #[test]
    fn test_subject_line() {
        assert_eq!(subject_line(&sample_report()), "URL Monitor: 1 changed, 1 new");

        let quiet = RunReport::new(
            Utc::now(),
            vec![ClassificationResult::Unchanged {
                key: "k".into(),
                label: "K".into(),
            }],
        );
        assert_eq!(
            subject_line(&quiet),
            "URL Monitor: no changes detected (1 URLs checked)"
        );
    }

    #[test]
    fn test_markdown_sections() {
        let md = render_markdown(&sample_report());
        assert!(md.contains("**Date:** 2026-03-02 09:30 UTC"));
        assert!(md.contains("**Changed:** 1 | **New:** 1 | **Unchanged:** 1 | **Errors:** 1"));
        assert!(md.contains("```diff\nADDED (1 lines):\n  + Program Y added."));
        assert!(md.contains("- **B** — https://example.gov/b"));
        assert!(md.contains("- **C** — https://example.gov/c (HTTP status 503)"));
        assert!(md.contains("- D — https://example.gov/d"));
    }

    #[test]
    fn test_text_report() {
        let text = render_text(&sample_report());
        assert!(text.contains("CHANGED (1 URLs)"));
        assert!(text.contains("   Last checked: 2026-03-01 09:30 UTC"));
        assert!(text.contains("   + Program Y added."));
        assert!(text.contains("ERRORS (1 URLs — could not fetch)"));
    }

    #[test]
    fn test_write_results() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out/results.json");

        write_results(&path, &sample_report()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["entity_count"], 4);
        assert_eq!(value["results"][0]["status"], "changed");
        assert_eq!(value["results"][2]["error"]["kind"], "http_status");
    }
}

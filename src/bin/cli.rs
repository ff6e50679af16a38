//! URL Change Monitor CLI
//!
//! Scheduled-run entry point: checks every listed URL once. A completed run
//! exits 0 (or 2 with `--fail-on-change` when pages changed); a failed run
//! exits 1.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use url_monitor::{
    error::{AppError, Result},
    models::{Config, load_entities},
    pipeline::{self, DiffCalculator, report},
    services::HttpFetcher,
    storage::{LocalSnapshotStore, SnapshotStore},
    utils,
};

/// URL Change Monitor - daily page change detection
#[derive(Parser, Debug)]
#[command(
    name = "url-monitor",
    version,
    about = "Detect content changes on a list of web pages"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check every listed URL and report changes
    Run {
        /// URL list file (default: paths.entities_file)
        #[arg(long)]
        urls: Option<PathBuf>,

        /// Snapshot store file (default: paths.snapshots_file)
        #[arg(long)]
        snapshots: Option<PathBuf>,

        /// Exit with status 2 when any page changed
        #[arg(long)]
        fail_on_change: bool,
    },

    /// Validate configuration and URL list
    Validate,

    /// Show stored snapshot info
    Info,

    /// Show the change summary between two text files
    Diff {
        previous: PathBuf,
        current: PathBuf,
    },
}

/// Exit status of a completed run that found changes with `--fail-on-change`.
/// Kept apart from `ExitCode::FAILURE`, which means the run itself failed.
const CHANGES_FOUND: u8 = 2;

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Console level: `--verbose` wins over the configured level.
fn console_level(verbose: bool, config: &Config) -> &str {
    if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    }
}

fn run_exit_code(changed: usize, fail_on_change: bool) -> u8 {
    if fail_on_change && changed > 0 {
        CHANGES_FOUND
    } else {
        0
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env();

    let level = console_level(cli.verbose, &config);
    utils::log::init(level);
    if !cli.verbose {
        if let Ok(filter) = level.parse::<log::LevelFilter>() {
            log::set_max_level(filter);
        }
    }

    match execute(cli, config).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli, mut config: Config) -> Result<u8> {
    match cli.command {
        Command::Run {
            urls,
            snapshots,
            fail_on_change,
        } => {
            if let Some(path) = urls {
                config.paths.entities_file = path;
            }
            if let Some(path) = snapshots {
                config.paths.snapshots_file = path;
            }
            config.validate()?;

            let entities = load_entities(&config.paths.entities_file)?;
            let fetcher = HttpFetcher::new(&config.monitor)?;
            let store = LocalSnapshotStore::new(&config.paths.snapshots_file);

            let run = pipeline::run_monitor(&config, &entities, &fetcher, &store).await?;

            report::write_results(&config.paths.results_file, &run)?;
            log::info!("Results saved to {}", config.paths.results_file.display());

            let markdown = report::render_markdown(&run);
            println!("{}", markdown);
            append_step_summary(&markdown);

            log::info!("{}", report::subject_line(&run));
            Ok(run_exit_code(run.counts().changed, fail_on_change))
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");

            let entities = load_entities(&config.paths.entities_file)?;
            if entities.is_empty() {
                return Err(AppError::validation(format!(
                    "no monitorable URLs in {}",
                    config.paths.entities_file.display()
                )));
            }
            log::info!(
                "✓ URL list OK ({} URLs in {})",
                entities.len(),
                config.paths.entities_file.display()
            );

            log::info!("All validations passed!");
            Ok(0)
        }

        Command::Info => {
            let store = LocalSnapshotStore::new(&config.paths.snapshots_file);
            log::info!("Snapshot store: {}", store.location());

            let snapshots = store.load().await;
            if snapshots.is_empty() {
                log::info!("No snapshots stored yet.");
                return Ok(0);
            }

            log::info!("Stored snapshots: {}", snapshots.len());
            if let Some(latest) = snapshots.values().map(|s| s.last_checked).max() {
                log::info!("Last checked: {}", latest.to_rfc3339());
            }
            if let Some(oldest) = snapshots.values().map(|s| s.last_checked).min() {
                log::info!("Oldest check: {}", oldest.to_rfc3339());
            }
            Ok(0)
        }

        Command::Diff { previous, current } => {
            let previous = std::fs::read_to_string(previous)?;
            let current = std::fs::read_to_string(current)?;
            let summary = DiffCalculator::from_config(&config.diff).calculate(&previous, &current);
            if summary.has_changes() {
                println!("{}", summary);
            } else {
                println!("No line changes.");
            }
            Ok(0)
        }
    }
}

/// Append the markdown report to the CI job summary, if one is configured.
fn append_step_summary(markdown: &str) {
    let Ok(path) = std::env::var("GITHUB_STEP_SUMMARY") else {
        return;
    };
    let written = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .and_then(|mut file| writeln!(file, "{}", markdown));
    if let Err(e) = written {
        log::warn!("Could not write job summary to {}: {}", path, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_run_exits_zero_by_default() {
        assert_eq!(run_exit_code(0, false), 0);
        assert_eq!(run_exit_code(1, false), 0);
        assert_eq!(run_exit_code(300, false), 0);
    }

    #[test]
    fn test_fail_on_change_differs_from_failure() {
        assert_eq!(run_exit_code(0, true), 0);
        assert_eq!(run_exit_code(1, true), CHANGES_FOUND);
        // 1 is the generic failure status.
        assert_ne!(CHANGES_FOUND, 1);
    }

    #[test]
    fn test_verbose_overrides_configured_level() {
        let mut config = Config::default();
        config.logging.level = "warn".to_string();
        assert_eq!(console_level(false, &config), "warn");
        assert_eq!(console_level(true, &config), "debug");
    }

    #[test]
    fn test_run_flags_parse() {
        let cli = Cli::try_parse_from(["url-monitor", "run", "--fail-on-change"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Run {
                fail_on_change: true,
                ..
            }
        ));
        assert_eq!(cli.config, PathBuf::from("config.toml"));
    }
}

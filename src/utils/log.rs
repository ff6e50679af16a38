// src/utils/log.rs

//! Console run log.
//!
//! Run banners, per-page progress and the end-of-run summary go through
//! here; library diagnostics use the `log` facade instead.

use std::sync::OnceLock;

use chrono::Local;

/// Console verbosity, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn tag(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Parse a config level name; unknown names mean `Info`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "debug" | "trace" => LogLevel::Debug,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

static THRESHOLD: OnceLock<LogLevel> = OnceLock::new();

/// Set the console threshold. Only the first call takes effect.
pub fn init(level: &str) {
    let _ = THRESHOLD.set(LogLevel::parse(level));
}

fn enabled(level: LogLevel) -> bool {
    level >= THRESHOLD.get().copied().unwrap_or(LogLevel::Info)
}

fn line(level: LogLevel, message: &str) -> String {
    format!(
        "[{}] [{}] {}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        level.tag(),
        message
    )
}

fn emit(level: LogLevel, message: &str) {
    if !enabled(level) {
        return;
    }
    if level >= LogLevel::Warn {
        eprintln!("{}", line(level, message));
    } else {
        println!("{}", line(level, message));
    }
}

pub fn info(message: &str) {
    emit(LogLevel::Info, message);
}

pub fn error(message: &str) {
    emit(LogLevel::Error, message);
}

/// `[current/total] message`
pub fn step(current: usize, total: usize, message: &str) {
    emit(LogLevel::Info, &format!("[{}/{}] {}", current, total, message));
}

/// Title between two rules.
pub fn header(title: &str) {
    let rule = "═".repeat(60);
    emit(LogLevel::Info, &rule);
    emit(LogLevel::Info, &format!("  {}", title));
    emit(LogLevel::Info, &rule);
}

/// Indented detail under the previous step.
pub fn sub_item(message: &str) {
    emit(LogLevel::Info, &format!("    {}", message));
}

/// Titled list of `key: value` lines.
pub fn summary(title: &str, items: &[(&str, String)]) {
    emit(LogLevel::Info, &format!("[SUMMARY] {}", title));
    for (key, value) in items {
        emit(LogLevel::Info, &format!("    {}: {}", key, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_parse_level_names() {
        assert_eq!(LogLevel::parse("debug"), LogLevel::Debug);
        assert_eq!(LogLevel::parse(" WARNING "), LogLevel::Warn);
        assert_eq!(LogLevel::parse("INFO"), LogLevel::Info);
        assert_eq!(LogLevel::parse("chatty"), LogLevel::Info);
    }

    #[test]
    fn test_line_carries_level_tag() {
        assert!(line(LogLevel::Error, "store write failed").ends_with("[ERROR] store write failed"));
    }
}

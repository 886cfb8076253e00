//! Harness configuration.
//!
//! Read from the environment; each value can be overridden by a command-line
//! flag (`--log`, `--log-level`, `--format`):
//! - `NETSHIM_LOG`: `off` (default), `stderr`, or a file path for JSONL logs.
//! - `NETSHIM_LOG_LEVEL`: minimum level (`trace`..`error`, default `info`).
//! - `NETSHIM_FORMAT`: `plain` (default) or `json` result output.

use std::path::PathBuf;

use crate::structured_log::LogLevel;

pub const ENV_LOG: &str = "NETSHIM_LOG";
pub const ENV_LOG_LEVEL: &str = "NETSHIM_LOG_LEVEL";
pub const ENV_FORMAT: &str = "NETSHIM_FORMAT";

/// Where structured log entries go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LogSink {
    #[default]
    Off,
    Stderr,
    File(PathBuf),
}

impl LogSink {
    /// Parse loosely: `off|none|0` and empty disable, `stderr|-` write to
    /// stderr, anything else is a path.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" | "off" | "none" | "0" | "false" => Self::Off,
            "stderr" | "-" => Self::Stderr,
            _ => Self::File(PathBuf::from(trimmed)),
        }
    }
}

/// How command results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Plain,
    Json,
}

impl OutputFormat {
    /// Parse loosely (case-insensitive); unknown values fall back to `Plain`.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" | "jsonl" => Self::Json,
            _ => Self::Plain,
        }
    }
}

fn level_from_str_loose(s: &str) -> LogLevel {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => LogLevel::Trace,
        "debug" => LogLevel::Debug,
        "warn" | "warning" => LogLevel::Warn,
        "error" => LogLevel::Error,
        _ => LogLevel::Info,
    }
}

/// Effective harness configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    pub log: LogSink,
    pub log_level: LogLevel,
    pub format: OutputFormat,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            log: LogSink::Off,
            log_level: LogLevel::Info,
            format: OutputFormat::Plain,
        }
    }
}

impl HarnessConfig {
    /// Configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            log: lookup(ENV_LOG).map_or(defaults.log, |v| LogSink::from_str_loose(&v)),
            log_level: lookup(ENV_LOG_LEVEL)
                .map_or(defaults.log_level, |v| level_from_str_loose(&v)),
            format: lookup(ENV_FORMAT).map_or(defaults.format, |v| OutputFormat::from_str_loose(&v)),
        }
    }

    /// Apply command-line overrides.
    #[must_use]
    pub fn with_overrides(
        mut self,
        log: Option<LogSink>,
        log_level: Option<LogLevel>,
        format: Option<OutputFormat>,
    ) -> Self {
        if let Some(log) = log {
            self.log = log;
        }
        if let Some(level) = log_level {
            self.log_level = level;
        }
        if let Some(format) = format {
            self.format = format;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let cfg = HarnessConfig::from_lookup(|_| None);
        assert_eq!(cfg, HarnessConfig::default());
    }

    #[test]
    fn env_values_are_parsed_loosely() {
        let cfg = HarnessConfig::from_lookup(lookup_from(&[
            (ENV_LOG, "STDERR"),
            (ENV_LOG_LEVEL, "Debug"),
            (ENV_FORMAT, "JSON"),
        ]));
        assert_eq!(cfg.log, LogSink::Stderr);
        assert_eq!(cfg.log_level, LogLevel::Debug);
        assert_eq!(cfg.format, OutputFormat::Json);
    }

    #[test]
    fn unknown_values_fall_back() {
        let cfg = HarnessConfig::from_lookup(lookup_from(&[
            (ENV_LOG_LEVEL, "loud"),
            (ENV_FORMAT, "yaml"),
        ]));
        assert_eq!(cfg.log_level, LogLevel::Info);
        assert_eq!(cfg.format, OutputFormat::Plain);
    }

    #[test]
    fn log_sink_paths() {
        assert_eq!(LogSink::from_str_loose("off"), LogSink::Off);
        assert_eq!(LogSink::from_str_loose("  "), LogSink::Off);
        assert_eq!(LogSink::from_str_loose("-"), LogSink::Stderr);
        assert_eq!(
            LogSink::from_str_loose("/tmp/netshim.jsonl"),
            LogSink::File(PathBuf::from("/tmp/netshim.jsonl"))
        );
    }

    #[test]
    fn overrides_win() {
        let cfg = HarnessConfig::from_lookup(lookup_from(&[
            (ENV_FORMAT, "json"),
            (ENV_LOG_LEVEL, "error"),
        ]))
        .with_overrides(Some(LogSink::Stderr), Some(LogLevel::Trace), Some(OutputFormat::Plain));
        assert_eq!(cfg.log, LogSink::Stderr);
        assert_eq!(cfg.log_level, LogLevel::Trace);
        assert_eq!(cfg.format, OutputFormat::Plain);
    }

    #[test]
    fn absent_overrides_keep_env_values() {
        let cfg = HarnessConfig::from_lookup(lookup_from(&[(ENV_LOG_LEVEL, "warn")]))
            .with_overrides(None, None, None);
        assert_eq!(cfg.log_level, LogLevel::Warn);
        assert_eq!(cfg.log, LogSink::Off);
    }
}

//! Structured JSONL logging for netshim tooling.
//!
//! Provides:
//! - [`LogEntry`]: one JSONL record with required + optional fields.
//! - [`LogEmitter`]: writes records to a file, stderr, or a buffer.
//! - [`validate_log_line`] / [`validate_log_file`]: schema and error-space
//!   checks, reported as [`LogIssue`]s.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// Log entry
// ---------------------------------------------------------------------------

/// Severity level for log entries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Result of the call a log entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Ok,
    Error,
}

/// Canonical structured log entry.
///
/// Required fields: `timestamp`, `trace_id`, `level`, `event`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub trace_id: String,
    pub level: LogLevel,
    pub event: String,

    /// Wrapped C symbol (`getaddrinfo`, `gethostname`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    /// `EAI_*` code; never mixed with `errno`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gai_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errno: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ns: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl LogEntry {
    /// Create a new log entry with required fields only.
    #[must_use]
    pub fn new(trace_id: impl Into<String>, level: LogLevel, event: impl Into<String>) -> Self {
        Self {
            timestamp: now_utc(),
            trace_id: trace_id.into(),
            level,
            event: event.into(),
            symbol: None,
            outcome: None,
            gai_code: None,
            errno: None,
            latency_ns: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    #[must_use]
    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    #[must_use]
    pub fn with_gai_code(mut self, code: i32) -> Self {
        self.gai_code = Some(code);
        self
    }

    #[must_use]
    pub fn with_errno(mut self, errno: i32) -> Self {
        self.errno = Some(errno);
        self
    }

    #[must_use]
    pub fn with_latency_ns(mut self, ns: u64) -> Self {
        self.latency_ns = Some(ns);
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Attach the failure fields for a netshim error.
    #[must_use]
    pub fn with_error(mut self, err: &netshim::Error) -> Self {
        match err {
            netshim::Error::Parameter(_) => {}
            netshim::Error::ResolutionFailed(gai) => {
                self.gai_code = Some(gai.code());
                self.errno = gai.os_errno().map(netshim::Errno::code);
            }
            netshim::Error::GetHostNameFailed(errno) | netshim::Error::SetHostnameFailed(errno) => {
                self.errno = Some(errno.code());
            }
        }
        self.outcome = Some(Outcome::Error);
        self.details = Some(serde_json::json!({ "message": err.to_string() }));
        self
    }

    /// Serialize to a single JSONL line (no trailing newline).
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// Log emitter
// ---------------------------------------------------------------------------

/// Writes structured JSONL log entries.
///
/// Entries below `min_level` are dropped. A disabled emitter drops everything.
pub struct LogEmitter {
    writer: Option<Box<dyn Write + Send>>,
    min_level: LogLevel,
    seq: u64,
    scope: String,
    run_id: String,
}

impl LogEmitter {
    /// Emitter that writes to a file (truncating it).
    pub fn to_file(path: &Path, scope: &str, run_id: &str) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::with_writer(
            Box::new(std::io::BufWriter::new(file)),
            scope,
            run_id,
        ))
    }

    /// Emitter that writes to stderr.
    #[must_use]
    pub fn to_stderr(scope: &str, run_id: &str) -> Self {
        Self::with_writer(Box::new(std::io::stderr()), scope, run_id)
    }

    /// Emitter that writes into a shared buffer (for tests).
    #[must_use]
    pub fn to_buffer(scope: &str, run_id: &str) -> (Self, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let emitter = Self::with_writer(Box::new(buffer.clone()), scope, run_id);
        (emitter, buffer)
    }

    /// Emitter that drops every entry.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            writer: None,
            min_level: LogLevel::Error,
            seq: 0,
            scope: String::new(),
            run_id: String::new(),
        }
    }

    fn with_writer(writer: Box<dyn Write + Send>, scope: &str, run_id: &str) -> Self {
        Self {
            writer: Some(writer),
            min_level: LogLevel::Info,
            seq: 0,
            scope: scope.to_string(),
            run_id: run_id.to_string(),
        }
    }

    /// Set the minimum level written.
    #[must_use]
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    fn next_trace_id(&mut self) -> String {
        self.seq += 1;
        format!("{}::{}::{:03}", self.scope, self.run_id, self.seq)
    }

    /// Emit an entry with only the required fields.
    pub fn emit(&mut self, level: LogLevel, event: &str) -> std::io::Result<()> {
        self.emit_entry(LogEntry::new("", level, event))
    }

    /// Emit a populated entry; an empty `trace_id` is filled in.
    pub fn emit_entry(&mut self, mut entry: LogEntry) -> std::io::Result<()> {
        if self.writer.is_none() || entry.level < self.min_level {
            return Ok(());
        }
        if entry.trace_id.is_empty() {
            entry.trace_id = self.next_trace_id();
        }
        let line = serde_json::to_string(&entry).map_err(std::io::Error::other)?;
        match self.writer.as_mut() {
            Some(writer) => writeln!(writer, "{line}"),
            None => Ok(()),
        }
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

/// Cloneable in-memory sink.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// Buffer contents as text.
    #[must_use]
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().map(|b| b.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut inner = self
            .0
            .lock()
            .map_err(|_| std::io::Error::other("log buffer poisoned"))?;
        inner.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// One problem found in a log line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogIssue {
    #[error("not valid JSON: {0}")]
    Json(String),
    #[error("expected a JSON object")]
    NotAnObject,
    #[error("required field `{0}` missing")]
    Missing(&'static str),
    #[error("field `{field}` has unexpected value {value}")]
    BadValue { field: &'static str, value: String },
    #[error("trace_id `{0}` is not <scope>::<run_id>::<seq>")]
    TraceId(String),
    #[error("failed {symbol} entry carries neither `{expected}` nor details")]
    MissingCode {
        symbol: String,
        expected: &'static str,
    },
    #[error("{symbol} entry carries `{field}`, which belongs to the other error space")]
    ForeignCode { symbol: String, field: &'static str },
    #[error("does not match the entry schema: {0}")]
    Schema(String),
}

impl LogIssue {
    /// The field the issue is about, or a `<...>` marker for whole-line issues.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Json(_) => "<json>",
            Self::NotAnObject => "<root>",
            Self::Schema(_) => "<schema>",
            Self::TraceId(_) => "trace_id",
            Self::Missing(field)
            | Self::BadValue { field, .. }
            | Self::ForeignCode { field, .. }
            | Self::MissingCode {
                expected: field, ..
            } => *field,
        }
    }
}

const REQUIRED_FIELDS: [&str; 4] = ["timestamp", "trace_id", "level", "event"];

/// Which numeric error space a wrapped symbol reports in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorSpace {
    /// `EAI_*` codes; `errno` only alongside `EAI_SYSTEM`.
    Resolver,
    Errno,
}

impl ErrorSpace {
    fn of(symbol: &str) -> Option<Self> {
        match symbol {
            "getaddrinfo" => Some(Self::Resolver),
            "gethostname" | "sethostname" => Some(Self::Errno),
            _ => None,
        }
    }
}

fn check_value<T: serde::de::DeserializeOwned>(
    obj: &serde_json::Map<String, serde_json::Value>,
    field: &'static str,
    issues: &mut Vec<LogIssue>,
) {
    if let Some(value) = obj.get(field)
        && serde_json::from_value::<T>(value.clone()).is_err()
    {
        issues.push(LogIssue::BadValue {
            field,
            value: value.to_string(),
        });
    }
}

fn error_space_issues(entry: &LogEntry) -> Vec<LogIssue> {
    let Some(symbol) = entry.symbol.as_deref() else {
        return Vec::new();
    };
    let failed = entry.outcome == Some(Outcome::Error);
    let described = entry.details.is_some();
    let mut issues = Vec::new();
    match ErrorSpace::of(symbol) {
        Some(ErrorSpace::Resolver) => {
            if failed && entry.gai_code.is_none() && !described {
                issues.push(LogIssue::MissingCode {
                    symbol: symbol.to_string(),
                    expected: "gai_code",
                });
            }
            if entry.errno.is_some() && entry.gai_code != Some(libc::EAI_SYSTEM) {
                issues.push(LogIssue::ForeignCode {
                    symbol: symbol.to_string(),
                    field: "errno",
                });
            }
        }
        Some(ErrorSpace::Errno) => {
            if failed && entry.errno.is_none() && !described {
                issues.push(LogIssue::MissingCode {
                    symbol: symbol.to_string(),
                    expected: "errno",
                });
            }
            if entry.gai_code.is_some() {
                issues.push(LogIssue::ForeignCode {
                    symbol: symbol.to_string(),
                    field: "gai_code",
                });
            }
        }
        None => {}
    }
    issues
}

/// Check one JSONL line: shape first, then the typed entry.
///
/// Entries for wrapped symbols must report failures in that symbol's own
/// error space: `gai_code` for `getaddrinfo`, `errno` for the host name calls.
pub fn validate_log_line(line: &str) -> Result<LogEntry, Vec<LogIssue>> {
    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|e| vec![LogIssue::Json(e.to_string())])?;
    let Some(obj) = value.as_object() else {
        return Err(vec![LogIssue::NotAnObject]);
    };

    let mut issues: Vec<LogIssue> = REQUIRED_FIELDS
        .into_iter()
        .filter(|field| !obj.contains_key(*field))
        .map(LogIssue::Missing)
        .collect();
    check_value::<LogLevel>(obj, "level", &mut issues);
    check_value::<Outcome>(obj, "outcome", &mut issues);
    if !issues.is_empty() {
        return Err(issues);
    }

    let entry: LogEntry =
        serde_json::from_value(value).map_err(|e| vec![LogIssue::Schema(e.to_string())])?;
    if entry.trace_id.split("::").count() != 3 {
        issues.push(LogIssue::TraceId(entry.trace_id.clone()));
    }
    issues.extend(error_space_issues(&entry));
    if issues.is_empty() {
        Ok(entry)
    } else {
        Err(issues)
    }
}

/// Check every non-blank line of a JSONL file.
///
/// Returns how many lines were checked and each issue with its 1-based line
/// number.
pub fn validate_log_file(path: &Path) -> std::io::Result<(usize, Vec<(usize, LogIssue)>)> {
    let content = std::fs::read_to_string(path)?;
    let mut checked = 0;
    let mut issues = Vec::new();
    for (number, line) in (1..).zip(content.lines()) {
        if line.trim().is_empty() {
            continue;
        }
        checked += 1;
        if let Err(found) = validate_log_line(line) {
            issues.extend(found.into_iter().map(|issue| (number, issue)));
        }
    }
    Ok((checked, issues))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now_utc() -> String {
    let duration = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = duration.as_secs();
    let (year, month, day) = civil_from_days((secs / 86_400) as i64);
    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{:03}Z",
        (secs % 86_400) / 3600,
        (secs % 3600) / 60,
        secs % 60,
        duration.subsec_millis(),
    )
}

/// Days since 1970-01-01 to (year, month, day), proleptic Gregorian.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_entry_serializes_required_fields() {
        let entry = LogEntry::new("cli::run-1::001", LogLevel::Info, "resolve_start");
        let json = entry.to_jsonl().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed["timestamp"].is_string());
        assert_eq!(parsed["trace_id"], "cli::run-1::001");
        assert_eq!(parsed["level"], "info");
        assert_eq!(parsed["event"], "resolve_start");
        assert!(parsed.get("symbol").is_none());
        assert!(parsed.get("gai_code").is_none());
        assert!(parsed.get("errno").is_none());
    }

    #[test]
    fn resolution_error_fills_gai_code_only() {
        let err = netshim::Error::ResolutionFailed(netshim::GaiError::new(libc::EAI_NONAME));
        let entry = LogEntry::new("cli::run-1::002", LogLevel::Warn, "resolve_failed")
            .with_symbol("getaddrinfo")
            .with_error(&err);
        assert_eq!(entry.gai_code, Some(libc::EAI_NONAME));
        assert_eq!(entry.errno, None);
        assert_eq!(entry.outcome, Some(Outcome::Error));
        assert!(validate_log_line(&entry.to_jsonl().unwrap()).is_ok());
    }

    #[test]
    fn hostname_error_fills_errno_only() {
        let err = netshim::Error::SetHostnameFailed(netshim::Errno(libc::EPERM));
        let entry = LogEntry::new("cli::run-1::003", LogLevel::Warn, "set_hostname_failed")
            .with_error(&err);
        assert_eq!(entry.errno, Some(libc::EPERM));
        assert_eq!(entry.gai_code, None);
    }

    #[test]
    fn validate_invalid_level() {
        let json = r#"{"timestamp":"2026-01-01T00:00:00Z","trace_id":"a::b::c","level":"fatal","event":"x"}"#;
        let errors = validate_log_line(json).unwrap_err();
        assert!(errors.iter().any(|e| e.field() == "level"));
    }

    #[test]
    fn validate_bad_trace_id_format() {
        let json = r#"{"timestamp":"2026-01-01T00:00:00Z","trace_id":"no-separator","level":"info","event":"x"}"#;
        let errors = validate_log_line(json).unwrap_err();
        assert!(errors.iter().any(|e| e.field() == "trace_id"));
    }

    #[test]
    fn getaddrinfo_failure_without_code_is_rejected() {
        let json = r#"{"timestamp":"T","trace_id":"a::b::c","level":"warn","event":"x","symbol":"getaddrinfo","outcome":"error"}"#;
        let errors = validate_log_line(json).unwrap_err();
        assert!(errors.iter().any(|e| e.field() == "gai_code"));
    }

    #[test]
    fn hostname_entry_with_resolver_code_is_rejected() {
        let json = r#"{"timestamp":"T","trace_id":"a::b::c","level":"warn","event":"x","symbol":"gethostname","outcome":"error","errno":1,"gai_code":-2}"#;
        let errors = validate_log_line(json).unwrap_err();
        assert_eq!(
            errors,
            vec![LogIssue::ForeignCode {
                symbol: "gethostname".to_string(),
                field: "gai_code",
            }]
        );
    }

    #[test]
    fn getaddrinfo_errno_needs_system_code() {
        let entry = LogEntry::new("a::b::c", LogLevel::Warn, "resolve_failed")
            .with_symbol("getaddrinfo")
            .with_outcome(Outcome::Error)
            .with_gai_code(libc::EAI_NONAME)
            .with_errno(libc::ECONNREFUSED);
        let errors = validate_log_line(&entry.to_jsonl().unwrap()).unwrap_err();
        assert!(errors.iter().any(|e| e.field() == "errno"));

        let err = netshim::Error::ResolutionFailed(netshim::GaiError::new(libc::EAI_SYSTEM));
        let entry = LogEntry::new("a::b::c", LogLevel::Warn, "resolve_failed")
            .with_symbol("getaddrinfo")
            .with_error(&err)
            .with_errno(libc::ECONNREFUSED);
        assert!(validate_log_line(&entry.to_jsonl().unwrap()).is_ok());
    }

    #[test]
    fn hostname_parameter_failure_passes_with_details() {
        let err = netshim::Error::Parameter("host name too long".to_string());
        let entry = LogEntry::new("a::b::c", LogLevel::Warn, "set_hostname_failed")
            .with_symbol("sethostname")
            .with_error(&err);
        assert_eq!(entry.errno, None);
        assert!(validate_log_line(&entry.to_jsonl().unwrap()).is_ok());
    }

    #[test]
    fn unknown_symbols_are_not_checked_for_codes() {
        let json = r#"{"timestamp":"T","trace_id":"a::b::c","level":"info","event":"x","symbol":"swap16","gai_code":1,"errno":2}"#;
        assert!(validate_log_line(json).is_ok());
    }

    #[test]
    fn emitter_generates_sequential_trace_ids() {
        let (mut emitter, buffer) = LogEmitter::to_buffer("cli", "run-42");
        emitter.emit(LogLevel::Info, "start").unwrap();
        emitter.emit(LogLevel::Info, "end").unwrap();
        let lines: Vec<String> = buffer.contents().lines().map(str::to_owned).collect();
        assert_eq!(lines.len(), 2);
        let first: LogEntry = serde_json::from_str(&lines[0]).unwrap();
        let second: LogEntry = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(first.trace_id, "cli::run-42::001");
        assert_eq!(second.trace_id, "cli::run-42::002");
    }

    #[test]
    fn emitter_drops_entries_below_min_level() {
        let (emitter, buffer) = LogEmitter::to_buffer("cli", "run-1");
        let mut emitter = emitter.with_min_level(LogLevel::Warn);
        emitter.emit(LogLevel::Debug, "noise").unwrap();
        emitter.emit(LogLevel::Error, "signal").unwrap();
        let contents = buffer.contents();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.contains("signal"));
    }

    #[test]
    fn disabled_emitter_writes_nothing() {
        let mut emitter = LogEmitter::disabled();
        assert!(!emitter.is_enabled());
        emitter.emit(LogLevel::Error, "ignored").unwrap();
        emitter.flush().unwrap();
    }

    #[test]
    fn civil_dates() {
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(civil_from_days(59), (1970, 3, 1));
        assert_eq!(civil_from_days(19_723), (2024, 1, 1));
        assert_eq!(civil_from_days(19_782), (2024, 2, 29));
    }
}

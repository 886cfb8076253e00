//! Command implementations for the `netshim` binary.
//!
//! Each command wraps exactly one netshim call, logs a start and an outcome
//! entry with the call latency, and returns the text to print.

use std::time::Instant;

use netshim::{AddrInfoHints, Error as ShimError};
use thiserror::Error;

use crate::config::{HarnessConfig, LogSink, OutputFormat};
use crate::report::ResolveReport;
use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome};

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Shim(#[from] ShimError),
}

/// Build the emitter a configuration asks for.
pub fn open_emitter(config: &HarnessConfig, run_id: &str) -> Result<LogEmitter, HarnessError> {
    let emitter = match &config.log {
        LogSink::Off => return Ok(LogEmitter::disabled()),
        LogSink::Stderr => LogEmitter::to_stderr("netshim", run_id),
        LogSink::File(path) => LogEmitter::to_file(path, "netshim", run_id)?,
    };
    Ok(emitter.with_min_level(config.log_level))
}

fn elapsed_ns(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX)
}

fn finish(
    log: &mut LogEmitter,
    symbol: &str,
    event: &str,
    start: Instant,
    err: Option<&ShimError>,
) -> Result<(), HarnessError> {
    let entry = match err {
        None => LogEntry::new("", LogLevel::Info, format!("{event}_done"))
            .with_outcome(Outcome::Ok),
        Some(err) => {
            LogEntry::new("", LogLevel::Warn, format!("{event}_failed")).with_error(err)
        }
    };
    log.emit_entry(entry.with_symbol(symbol).with_latency_ns(elapsed_ns(start)))?;
    Ok(())
}

/// Arguments of a resolve command.
#[derive(Debug, Clone, Default)]
pub struct ResolveRequest {
    pub host: Option<String>,
    pub service: Option<String>,
    pub hints: AddrInfoHints,
}

pub fn resolve(
    request: &ResolveRequest,
    format: OutputFormat,
    log: &mut LogEmitter,
) -> Result<String, HarnessError> {
    let host = request.host.as_deref();
    let service = request.service.as_deref();
    log.emit_entry(
        LogEntry::new("", LogLevel::Debug, "resolve_start")
            .with_symbol("getaddrinfo")
            .with_details(serde_json::json!({
                "host": host,
                "service": service,
                "flags": request.hints.flags,
                "family": request.hints.family,
                "socktype": request.hints.socktype,
                "protocol": request.hints.protocol,
            })),
    )?;

    let start = Instant::now();
    let result = netshim::getaddrinfo(host, service, &request.hints);
    finish(log, "getaddrinfo", "resolve", start, result.as_ref().err())?;
    let records = result?;

    let report = ResolveReport::new(host, service, &records);
    Ok(match format {
        OutputFormat::Plain => report.to_plain(),
        OutputFormat::Json => report.to_json()? + "\n",
    })
}

pub fn hostname(format: OutputFormat, log: &mut LogEmitter) -> Result<String, HarnessError> {
    let start = Instant::now();
    let result = netshim::gethostname();
    finish(log, "gethostname", "hostname", start, result.as_ref().err())?;
    let name = result?;

    Ok(match format {
        OutputFormat::Plain => format!("{}\n", name.as_deref().unwrap_or("")),
        OutputFormat::Json => serde_json::to_string(&serde_json::json!({ "hostname": name }))? + "\n",
    })
}

pub fn set_hostname(name: &str, log: &mut LogEmitter) -> Result<(), HarnessError> {
    let start = Instant::now();
    let result = netshim::sethostname(name);
    finish(log, "sethostname", "set_hostname", start, result.as_ref().err())?;
    Ok(result?)
}

/// `swap16` of a decimal or `0x` hex value.
pub fn swap16(value: &str, format: OutputFormat) -> Result<String, HarnessError> {
    let parsed = parse_u16(value).ok_or_else(|| {
        ShimError::Parameter(format!("'{value}' is not a 16-bit value"))
    })?;
    let swapped = netshim::swap16(parsed);
    Ok(match format {
        OutputFormat::Plain => format!("0x{swapped:04x}\n"),
        OutputFormat::Json => {
            serde_json::to_string(&serde_json::json!({ "input": parsed, "swapped": swapped }))?
                + "\n"
        }
    })
}

fn parse_u16(value: &str) -> Option<u16> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(&hex.replace('_', ""), 16).ok(),
        None => value.replace('_', "").parse().ok(),
    }
}

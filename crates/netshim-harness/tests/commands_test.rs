//! Integration test: CLI command implementations.
//!
//! Uses numeric hosts only, so no network access is needed.
//!
//! Run: cargo test -p netshim-harness --test commands_test

use netshim::AddrInfoHints;
use netshim_harness::commands::{self, HarnessError, ResolveRequest};
use netshim_harness::structured_log::{LogEmitter, LogLevel, validate_log_line};
use netshim_harness::OutputFormat;

fn numeric_request(host: &str, service: &str) -> ResolveRequest {
    ResolveRequest {
        host: Some(host.to_string()),
        service: Some(service.to_string()),
        hints: AddrInfoHints::new()
            .with_flags(libc::AI_NUMERICHOST | libc::AI_NUMERICSERV)
            .with_socktype(libc::SOCK_STREAM),
    }
}

#[test]
fn resolve_plain_output_lists_address() {
    let mut log = LogEmitter::disabled();
    let out = commands::resolve(
        &numeric_request("127.0.0.1", "8080"),
        OutputFormat::Plain,
        &mut log,
    )
    .unwrap();
    assert_eq!(out.lines().count(), 1);
    assert!(out.contains("127.0.0.1:8080"), "{out}");
    assert!(out.starts_with("inet "), "{out}");
}

#[test]
fn resolve_json_output_is_parseable() {
    let mut log = LogEmitter::disabled();
    let out = commands::resolve(&numeric_request("::1", "53"), OutputFormat::Json, &mut log)
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["host"], "::1");
    assert_eq!(parsed["service"], "53");
    let records = parsed["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["family"], "inet6");
    assert_eq!(records[0]["socktype"], "stream");
    assert_eq!(records[0]["address"], "[::1]:53");
}

#[test]
fn resolve_logs_start_and_done() {
    let (emitter, buffer) = LogEmitter::to_buffer("netshim", "t1");
    let mut log = emitter.with_min_level(LogLevel::Debug);
    commands::resolve(
        &numeric_request("127.0.0.1", "1"),
        OutputFormat::Plain,
        &mut log,
    )
    .unwrap();

    let contents = buffer.contents();
    let entries: Vec<_> = contents
        .lines()
        .map(|l| validate_log_line(l).unwrap())
        .collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].event, "resolve_start");
    assert_eq!(entries[1].event, "resolve_done");
    assert!(entries[1].latency_ns.is_some());
}

#[test]
fn resolve_failure_is_logged_with_gai_code() {
    let (mut log, buffer) = LogEmitter::to_buffer("netshim", "t2");
    let err = commands::resolve(
        &numeric_request("not-numeric.invalid", "80"),
        OutputFormat::Plain,
        &mut log,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        HarnessError::Shim(netshim::Error::ResolutionFailed(_))
    ));

    let contents = buffer.contents();
    let last = contents.lines().last().unwrap();
    let entry = validate_log_line(last).unwrap();
    assert_eq!(entry.event, "resolve_failed");
    assert_eq!(entry.gai_code, Some(libc::EAI_NONAME));
    assert_eq!(entry.errno, None);
}

#[test]
fn resolve_without_host_or_service_is_rejected() {
    let mut log = LogEmitter::disabled();
    let request = ResolveRequest::default();
    let err = commands::resolve(&request, OutputFormat::Plain, &mut log).unwrap_err();
    assert!(matches!(err, HarnessError::Shim(netshim::Error::Parameter(_))));
}

#[test]
fn hostname_json_has_a_key() {
    let mut log = LogEmitter::disabled();
    let out = commands::hostname(OutputFormat::Json, &mut log).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert!(parsed.get("hostname").is_some());
}

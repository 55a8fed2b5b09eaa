use ::time::{format_description::well_known, OffsetDateTime};
use uuid::Uuid;

use crate::config::ScanConfig;
use crate::runner::{render_command, run_command};
use crate::types::{AttemptRecord, Diagnostics, ScanSession};

const SCAN_STDOUT_LIMIT: usize = 4000;
const SCAN_STDERR_LIMIT: usize = 2000;
const PING_LIMIT: usize = 1000;

/// Run the full diagnostic cascade against one target and bundle the result.
///
/// The caller (HTTP layer) passes a trimmed, non-empty target. The cascade is
/// fixed: a conservative primary scan, a discovery-skipping fallback when the
/// primary timed out or came back blank, and a ping probe when even the
/// fallback left us with nothing (but not after a hard timeout). Attempts run
/// strictly one after another; each decision needs the previous result.
pub async fn run_scan_session(cfg: &ScanConfig, target: &str) -> ScanSession {
    let mut attempts: Vec<AttemptRecord> = Vec::new();

    let primary_argv = scan_command(cfg, target, false);
    tracing::info!(host = %target, "starting primary scan");
    let primary = run_command(&primary_argv, cfg.primary_wait).await;
    attempts.push(AttemptRecord::new(
        render_command(&primary_argv),
        &primary,
        SCAN_STDOUT_LIMIT,
        SCAN_STDERR_LIMIT,
    ));

    let mut authoritative = primary.clone();

    // Fallback gate: a timeout or a blank primary both mean "try again
    // without host discovery". The fallback supersedes the provisional
    // result whenever it produced any output at all.
    if primary.timed_out || primary.stdout_is_blank() {
        let fallback_argv = scan_command(cfg, target, true);
        tracing::info!(host = %target, "primary scan inconclusive, retrying with -Pn");
        let fallback = run_command(&fallback_argv, cfg.fallback_wait).await;
        attempts.push(AttemptRecord::new(
            render_command(&fallback_argv),
            &fallback,
            SCAN_STDOUT_LIMIT,
            SCAN_STDERR_LIMIT,
        ));
        if !fallback.stdout_is_blank() {
            authoritative = fallback;
        }
    }

    // Ping gate: only for "ran but found nothing". A timed-out final result
    // is not treated as confirmed-empty, so no probe in that case.
    let ping = if authoritative.stdout_is_blank() && !authoritative.timed_out {
        let ping_argv = ping_command(cfg, target);
        tracing::info!(host = %target, "scan produced no output, probing reachability");
        let probe = run_command(&ping_argv, cfg.ping_wait).await;
        Some(AttemptRecord::new(
            render_command(&ping_argv),
            &probe,
            PING_LIMIT,
            PING_LIMIT,
        ))
    } else {
        None
    };

    ScanSession {
        scan_id: short_id(),
        target: target.to_string(),
        timestamp: now_rfc3339(),
        scan_output: authoritative.stdout,
        rc: authoritative.exit_code,
        timed_out: authoritative.timed_out,
        diagnostics: Diagnostics { attempts, ping },
    }
}

/// Build the scanner argv. The fallback profile prepends `-Pn` (treat the
/// host as up) and stretches the host timeout.
fn scan_command(cfg: &ScanConfig, target: &str, skip_discovery: bool) -> Vec<String> {
    let mut argv = vec![cfg.scanner_path.clone()];
    if skip_discovery {
        argv.push("-Pn".into());
    }
    let host_timeout = if skip_discovery {
        cfg.fallback_host_timeout_secs
    } else {
        cfg.primary_host_timeout_secs
    };
    argv.extend(
        [
            "-sV",
            "--version-light",
            "--top-ports",
            "100",
            "--open",
            "--host-timeout",
        ]
        .map(String::from),
    );
    argv.push(format!("{host_timeout}s"));
    argv.push(target.to_string());
    argv
}

fn ping_command(cfg: &ScanConfig, target: &str) -> Vec<String> {
    vec![
        cfg.ping_path.clone(),
        "-c".into(),
        "3".into(),
        target.into(),
    ]
}

/// Short random session identifier.
pub fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// RFC 3339 UTC timestamp.
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

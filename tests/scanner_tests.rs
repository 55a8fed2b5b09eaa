//! Cascade behavior tests driven by stub executables standing in for nmap
//! and ping, with process wait bounds shrunk to keep the suite fast.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;

use lab_scan_api::config::ScanConfig;
use lab_scan_api::report::build_report;
use lab_scan_api::scanner::run_scan_session;

fn write_stub(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path.to_string_lossy().into_owned()
}

fn test_config(scanner_path: String, ping_path: String) -> ScanConfig {
    ScanConfig {
        scanner_path,
        ping_path,
        primary_wait: Duration::from_millis(400),
        fallback_wait: Duration::from_millis(400),
        ping_wait: Duration::from_millis(400),
        ..ScanConfig::default()
    }
}

#[tokio::test]
async fn productive_primary_short_circuits_the_cascade() {
    let tmp = TempDir::new().unwrap();
    let scanner = write_stub(tmp.path(), "nmap", r#"echo "21/tcp open ftp vsftpd 2.3.4""#);
    let ping = write_stub(tmp.path(), "ping", "echo should-not-run");
    let cfg = test_config(scanner, ping);

    let session = run_scan_session(&cfg, "10.0.0.5").await;

    assert_eq!(session.diagnostics.attempts.len(), 1);
    assert!(session.diagnostics.ping.is_none());
    assert!(session.scan_output.contains("vsftpd"));
    assert_eq!(session.rc, 0);
    assert!(!session.timed_out);
    assert_eq!(session.target, "10.0.0.5");
    assert_eq!(session.scan_id.len(), 8);

    // Downstream report built from this session must flag the FTP banner.
    let report = build_report(&session.target, "simulated_exploit", &session.scan_output);
    assert!(report.vulnerability.contains("vsftpd"));
}

#[tokio::test]
async fn blank_scans_attach_reachability_probe() {
    let tmp = TempDir::new().unwrap();
    let scanner = write_stub(tmp.path(), "nmap", "exit 0");
    let ping = write_stub(tmp.path(), "ping", r#"echo "3 packets transmitted, 3 received""#);
    let cfg = test_config(scanner, ping);

    let session = run_scan_session(&cfg, "10.0.0.7").await;

    assert_eq!(session.diagnostics.attempts.len(), 2);
    assert!(session.scan_output.trim().is_empty());
    assert!(!session.timed_out);
    let probe = session.diagnostics.ping.expect("probe must be attached");
    assert!(probe.stdout.contains("3 packets transmitted"));
    // The probe is supplementary evidence only.
    assert!(session.scan_output.trim().is_empty());
}

#[tokio::test]
async fn fallback_output_supersedes_blank_primary() {
    let tmp = TempDir::new().unwrap();
    // Prints only when invoked with -Pn, i.e. only on the fallback profile.
    let scanner = write_stub(
        tmp.path(),
        "nmap",
        r#"case "$*" in *-Pn*) echo "80/tcp open http";; esac"#,
    );
    let ping = write_stub(tmp.path(), "ping", "echo should-not-run");
    let cfg = test_config(scanner, ping);

    let session = run_scan_session(&cfg, "10.0.0.8").await;

    assert_eq!(session.diagnostics.attempts.len(), 2);
    assert_eq!(session.scan_output.trim(), "80/tcp open http");
    assert!(session.diagnostics.ping.is_none());
    assert!(session.diagnostics.attempts[1].cmd.contains("-Pn"));
    assert!(!session.diagnostics.attempts[0].cmd.contains("-Pn"));
}

#[tokio::test]
async fn timed_out_primary_is_recovered_by_fallback() {
    let tmp = TempDir::new().unwrap();
    let scanner = write_stub(
        tmp.path(),
        "nmap",
        r#"case "$*" in *-Pn*) echo recovered;; *) sleep 2;; esac"#,
    );
    let ping = write_stub(tmp.path(), "ping", "echo should-not-run");
    let cfg = test_config(scanner, ping);

    let session = run_scan_session(&cfg, "10.0.0.9").await;

    assert_eq!(session.diagnostics.attempts.len(), 2);
    assert!(session.diagnostics.attempts[0].timed_out);
    assert_eq!(session.diagnostics.attempts[0].rc, -1);
    assert_eq!(session.scan_output.trim(), "recovered");
    assert!(!session.timed_out);
    assert!(session.diagnostics.ping.is_none());
}

#[tokio::test]
async fn double_timeout_suppresses_the_probe() {
    let tmp = TempDir::new().unwrap();
    let scanner = write_stub(tmp.path(), "nmap", "sleep 2");
    let ping = write_stub(tmp.path(), "ping", "echo should-not-run");
    let cfg = test_config(scanner, ping);

    let session = run_scan_session(&cfg, "10.0.0.99").await;

    assert_eq!(session.diagnostics.attempts.len(), 2);
    assert!(session.timed_out);
    assert_eq!(session.rc, -1);
    assert!(session.scan_output.is_empty());
    assert!(session.diagnostics.ping.is_none());
    assert!(session.diagnostics.attempts[1].stderr.contains("timed out"));
}

#[tokio::test]
async fn attempt_records_carry_profile_and_truncation() {
    let tmp = TempDir::new().unwrap();
    // Over the 4000-char attempt display limit; scan_output stays full length.
    let scanner = write_stub(
        tmp.path(),
        "nmap",
        "head -c 5000 /dev/zero | tr '\\0' 'x'",
    );
    let ping = write_stub(tmp.path(), "ping", "echo should-not-run");
    let cfg = test_config(scanner, ping);

    let session = run_scan_session(&cfg, "10.0.0.10").await;

    let first = &session.diagnostics.attempts[0];
    assert!(first.cmd.contains("--top-ports 100"));
    assert!(first.cmd.contains("--host-timeout 45s"));
    assert!(first.cmd.ends_with("10.0.0.10"));
    assert_eq!(first.stdout.chars().count(), 4000);
    assert_eq!(session.scan_output.chars().count(), 5000);
}

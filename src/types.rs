use serde::{Deserialize, Serialize};

/// Outcome of one external process invocation.
///
/// Every failure mode of the runner is folded into this value: a timeout or a
/// launch failure yields `exit_code == -1` with a diagnostic in `stderr`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl CommandResult {
    /// True when the process ran but printed nothing useful to stdout.
    pub fn stdout_is_blank(&self) -> bool {
        self.stdout.trim().is_empty()
    }
}

/// One logged diagnostic attempt, as it appears in the `/scan` response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    /// The exact argument vector, rendered shell-safe for display/audit.
    pub cmd: String,
    pub rc: i32,
    pub timed_out: bool,
    pub stdout: String,
    pub stderr: String,
}

impl AttemptRecord {
    /// Fold a command result into a record, truncating the captured streams
    /// to the given display limits.
    pub fn new(
        cmd: String,
        result: &CommandResult,
        stdout_limit: usize,
        stderr_limit: usize,
    ) -> Self {
        Self {
            cmd,
            rc: result.exit_code,
            timed_out: result.timed_out,
            stdout: truncate_chars(&result.stdout, stdout_limit),
            stderr: truncate_chars(&result.stderr, stderr_limit),
        }
    }
}

/// Full attempt trail for one scan session.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Diagnostics {
    /// Scan attempts in execution order: primary, then optional fallback.
    pub attempts: Vec<AttemptRecord>,
    /// Supplementary reachability probe; never promoted to the final result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ping: Option<AttemptRecord>,
}

/// Aggregate result of one `/scan` invocation.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScanSession {
    pub scan_id: String,
    pub target: String,
    pub timestamp: String,
    /// Output of the authoritative attempt (untruncated).
    pub scan_output: String,
    pub rc: i32,
    pub timed_out: bool,
    pub diagnostics: Diagnostics,
}

/// Truncate to at most `limit` characters without splitting a char.
pub fn truncate_chars(s: &str, limit: usize) -> String {
    match s.char_indices().nth(limit) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

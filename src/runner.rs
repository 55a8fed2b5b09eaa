use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time;

use crate::types::CommandResult;

/// Run an external command, capturing everything, never failing.
///
/// - The argument vector is passed to the OS as-is; nothing is ever joined
///   into a shell string, so shell metacharacters in arguments are inert.
/// - Waits up to `wait` wall-clock time. On timeout the child is killed
///   (`kill_on_drop`) and the result carries `timed_out = true`.
/// - A launch failure (missing executable, permissions) is captured in
///   `stderr` rather than propagated.
///
/// Retry and fallback policy live in the orchestrator, not here.
pub async fn run_command(argv: &[String], wait: Duration) -> CommandResult {
    let Some((program, args)) = argv.split_first() else {
        return CommandResult {
            exit_code: -1,
            stdout: String::new(),
            stderr: "Execution failed: empty command".to_string(),
            timed_out: false,
        };
    };

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match time::timeout(wait, cmd.output()).await {
        Ok(Ok(output)) => CommandResult {
            // A signal death reports no code; use the same sentinel as a failure.
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            timed_out: false,
        },
        Ok(Err(e)) => CommandResult {
            exit_code: -1,
            stdout: String::new(),
            stderr: format!("Execution failed: {e}"),
            timed_out: false,
        },
        Err(_) => CommandResult {
            exit_code: -1,
            stdout: String::new(),
            stderr: format!("Command timed out after {}", wait_label(wait)),
            timed_out: true,
        },
    }
}

fn wait_label(wait: Duration) -> String {
    if wait.subsec_nanos() == 0 {
        format!("{}s", wait.as_secs())
    } else {
        format!("{:.3}s", wait.as_secs_f64())
    }
}

/// Render an argument vector as a single shell-safe string for display.
///
/// Tokens made of safe characters pass through unchanged; anything else is
/// single-quoted, with embedded single quotes escaped as `'\''`.
pub fn render_command(argv: &[String]) -> String {
    argv.iter()
        .map(|a| quote(a))
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote(token: &str) -> String {
    const SAFE: &str = "@%+=:,./-_";
    if !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || SAFE.contains(c))
    {
        token.to_string()
    } else {
        format!("'{}'", token.replace('\'', r"'\''"))
    }
}

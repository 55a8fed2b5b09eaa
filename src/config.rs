use std::path::Path;
use std::time::Duration;

/// Everything the scan cascade needs, passed in explicitly so sessions are
/// testable in isolation and tests can run in parallel without shared state.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Path or name of the port scanner binary (nmap).
    pub scanner_path: String,
    /// Path or name of the reachability probe binary (ping).
    pub ping_path: String,
    /// `--host-timeout` handed to the primary scan, in seconds.
    pub primary_host_timeout_secs: u64,
    /// Process-level wait bound for the primary scan.
    pub primary_wait: Duration,
    /// `--host-timeout` handed to the fallback scan, in seconds.
    pub fallback_host_timeout_secs: u64,
    /// Process-level wait bound for the fallback scan.
    pub fallback_wait: Duration,
    /// Process-level wait bound for the ping probe.
    pub ping_wait: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scanner_path: detect_scanner_path(),
            ping_path: "ping".to_string(),
            primary_host_timeout_secs: 45,
            primary_wait: Duration::from_secs(50),
            fallback_host_timeout_secs: 60,
            fallback_wait: Duration::from_secs(70),
            ping_wait: Duration::from_secs(12),
        }
    }
}

/// Prefer the usual absolute install path; otherwise rely on `PATH`.
pub fn detect_scanner_path() -> String {
    const KNOWN: &str = "/usr/bin/nmap";
    if Path::new(KNOWN).exists() {
        KNOWN.to_string()
    } else {
        "nmap".to_string()
    }
}

/// Configuration for the HTTP boundary.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Shared secret required in `X-API-Key`. `None` disables the check.
    pub api_key: Option<String>,
    /// Directory of static UI assets.
    pub ui_dir: String,
    pub scan: ScanConfig,
}

impl ServerConfig {
    /// Normalize an operator-supplied key: an empty string disables auth.
    pub fn with_api_key(mut self, key: String) -> Self {
        self.api_key = if key.is_empty() { None } else { Some(key) };
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            ui_dir: "ui".to_string(),
            scan: ScanConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_waits_match_cascade_bounds() {
        let cfg = ScanConfig::default();
        assert_eq!(cfg.primary_wait, Duration::from_secs(50));
        assert_eq!(cfg.fallback_wait, Duration::from_secs(70));
        assert_eq!(cfg.ping_wait, Duration::from_secs(12));
        assert!(cfg.primary_host_timeout_secs < cfg.fallback_host_timeout_secs);
    }

    #[test]
    fn empty_api_key_disables_auth() {
        let cfg = ServerConfig::default().with_api_key(String::new());
        assert!(cfg.api_key.is_none());
        let cfg = ServerConfig::default().with_api_key("s3cret".into());
        assert_eq!(cfg.api_key.as_deref(), Some("s3cret"));
    }
}

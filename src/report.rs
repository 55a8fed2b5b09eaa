use serde::{Deserialize, Serialize};

use crate::scanner::{now_rfc3339, short_id};
use crate::types::truncate_chars;

const SUMMARY_LIMIT: usize = 6000;

/// Simulated exploitation report. Entirely canned; the only input-dependent
/// piece is the vulnerability note chosen by a banner substring check.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Report {
    pub id: String,
    pub target: String,
    pub exploit: String,
    pub timestamp: String,
    pub scan_summary: String,
    pub vulnerability: String,
    pub outputs: ReportOutputs,
    pub risk_assessment: RiskAssessment,
    pub recommendations: Vec<String>,
    pub notes: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReportOutputs {
    pub simulated_shell: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RiskAssessment {
    pub impact: String,
    pub likelihood: String,
}

/// Build a simulated report from scan output. Pure: no processes, no clock
/// beyond the timestamp, no side effects.
pub fn build_report(target: &str, exploit_key: &str, scan_output: &str) -> Report {
    let lowered = scan_output.to_lowercase();
    let vulnerability = if lowered.contains("vsftpd") || lowered.contains("ftp") {
        "Detected FTP service / vsftpd banner. Older vsftpd 2.3.4 is known to have a backdoor (simulated)."
    } else {
        "No explicit vulnerability detected from scan output."
    };

    let scan_summary = if scan_output.is_empty() {
        "No scan output provided.".to_string()
    } else if scan_output.chars().count() > SUMMARY_LIMIT {
        format!("{}...", truncate_chars(scan_output, SUMMARY_LIMIT))
    } else {
        scan_output.to_string()
    };

    Report {
        id: short_id(),
        target: target.to_string(),
        exploit: exploit_key.to_string(),
        timestamp: now_rfc3339(),
        scan_summary,
        vulnerability: vulnerability.to_string(),
        outputs: ReportOutputs {
            simulated_shell: simulated_shell(),
        },
        risk_assessment: RiskAssessment {
            impact: "High (if real)".to_string(),
            likelihood: "Medium".to_string(),
        },
        recommendations: vec![
            "Patch or upgrade vulnerable services.".to_string(),
            "Disable FTP if not required.".to_string(),
            "Segment lab hosts from production networks.".to_string(),
            "Use snapshots for rollbacks.".to_string(),
        ],
        notes: "This is a simulated exploit/report for training. No real exploit executed."
            .to_string(),
    }
}

fn simulated_shell() -> String {
    concat!(
        "Simulated shell>\n",
        "$ id\nuid=0(root) gid=0(root)\n",
        "$ hostname\nmetasploitable\n",
        "$ uname -a\nLinux metasploitable 2.6.24-16-server #1 SMP ...\n",
        "(Note: simulated output for demo only)\n",
    )
    .to_string()
}

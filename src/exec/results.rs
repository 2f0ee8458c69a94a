//! Parsing archiver output and rendering the per-target log files.
//!
//! The archiver reports whitespace-separated tokens. The byte count is
//! the token two past the literal `bytes`; a `killed:` token anywhere
//! means the remote archiver died mid-stream.

use crate::core::types::Rule;
use crate::core::{Result, RotabError};
use chrono::{DateTime, Utc};

/// Parsed archiver output for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    /// The raw tokens, preserved for the results log.
    pub tokens: Vec<String>,
    pub total_bytes: u64,
}

/// Scan archiver output. `host` only feeds error messages.
pub fn parse(stdout: &str, host: &str) -> Result<WorkerReport> {
    let tokens: Vec<String> = stdout.split_whitespace().map(str::to_string).collect();

    if tokens.iter().any(|t| t == "killed:") {
        return Err(RotabError::WorkerKilled(host.to_string()));
    }

    let bytes_at = tokens
        .iter()
        .position(|t| t == "bytes")
        .ok_or_else(|| RotabError::parse_results(format!("no 'bytes' token from {}", host)))?;

    let total_bytes = tokens
        .get(bytes_at + 2)
        .and_then(|t| t.parse::<u64>().ok())
        .ok_or_else(|| {
            RotabError::parse_results(format!("no byte count after 'bytes' token from {}", host))
        })?;

    Ok(WorkerReport { tokens, total_bytes })
}

pub fn results_log_name(archive: &str, rule: Rule, set_index: u32) -> String {
    format!("{}.{}.{}.results.log", archive, rule, set_index)
}

pub fn status_log_name(archive: &str, rule: Rule, set_index: u32) -> String {
    format!("{}.{}.{}.status.log", archive, rule, set_index)
}

/// The short summary written next to the raw results.
pub fn render_status(label: &str, completed: DateTime<Utc>, total_bytes: u64) -> String {
    format!(
        "label: {}\ncompleted: {}\ntotalBytesWritten: {}\n",
        label,
        completed.to_rfc3339(),
        total_bytes
    )
}

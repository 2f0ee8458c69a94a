//! In-memory representation of one archive's configuration and state.
//!
//! The struct tree maps one-to-one onto the document schema: `meta`,
//! `manager`, `targets`, `worker`, `schedule`, `storage`, `notifications`
//! and the mutable `state` block the manager writes back after a run.

use crate::core::error::{Result, RotabError};
use crate::core::types::{PartitionList, Rule, Status};
use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One archive: everything the wizard wrote plus everything the manager
/// maintains between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub meta: Meta,
    pub manager: ManagerSpec,
    pub targets: Targets,
    pub worker: WorkerMap,
    pub schedule: Schedule,
    pub storage: StorageSpec,
    pub notifications: Notifications,
    #[serde(default)]
    pub state: RunState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    /// Unique across the managed directory; doubles as a path component.
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// The receiving side for streamed archives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerSpec {
    pub manager_host: String,
    pub manager_user: String,
    #[serde(default = "default_ssh_port")]
    pub manager_port: u16,
}

fn default_ssh_port() -> u16 {
    22
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Targets {
    pub partitions: PartitionList,
}

/// Where the on-client archiver lives, per host with a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerMap {
    pub default: WorkerPaths,
    #[serde(flatten, default)]
    pub overrides: BTreeMap<String, WorkerPaths>,
}

impl WorkerMap {
    /// Override-then-fallback: a host entry wins over `default`.
    pub fn for_host(&self, host: &str) -> &WorkerPaths {
        self.overrides.get(host).unwrap_or(&self.default)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerPaths {
    pub script_dir: String,
    pub tcl_lib_path: String,
}

/// Which tier runs on which day of the week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Schedule {
    #[serde(rename = "Mon", default)]
    pub mon: Rule,
    #[serde(rename = "Tue", default)]
    pub tue: Rule,
    #[serde(rename = "Wed", default)]
    pub wed: Rule,
    #[serde(rename = "Thu", default)]
    pub thu: Rule,
    #[serde(rename = "Fri", default)]
    pub fri: Rule,
    #[serde(rename = "Sat", default)]
    pub sat: Rule,
    #[serde(rename = "Sun", default)]
    pub sun: Rule,
}

impl Schedule {
    pub fn rule_for(&self, day: Weekday) -> Rule {
        match day {
            Weekday::Mon => self.mon,
            Weekday::Tue => self.tue,
            Weekday::Wed => self.wed,
            Weekday::Thu => self.thu,
            Weekday::Fri => self.fri,
            Weekday::Sat => self.sat,
            Weekday::Sun => self.sun,
        }
    }

    pub fn days(&self) -> [Rule; 7] {
        [self.mon, self.tue, self.wed, self.thu, self.fri, self.sat, self.sun]
    }

    /// Whether any day of the week carries a monthly tier. Archives
    /// without one get their base snapshot refreshed at month boundaries
    /// instead.
    pub fn has_monthly(&self) -> bool {
        self.days().contains(&Rule::Monthly)
    }
}

fn default_buffer() -> String {
    "cat".to_string()
}

fn is_default_buffer(buffer: &str) -> bool {
    buffer == "cat"
}

/// Destination and log layout for one archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSpec {
    /// Manager-side directory for result/status/error documents.
    pub log_dir: PathBuf,
    /// Block device (`/dev/...`) or directory on the manager host.
    pub remote_device: String,
    /// Client-side directory for incremental state files.
    pub list_file_dir: String,
    #[serde(default)]
    pub daily_sets: u32,
    #[serde(default)]
    pub weekly_sets: u32,
    #[serde(default)]
    pub monthly_sets: u32,
    /// Receiver-side reader command.
    #[serde(default = "default_buffer", skip_serializing_if = "is_default_buffer")]
    pub buffer: String,
}

impl StorageSpec {
    /// Size of the rotation pool for a rule; `none` has no pool.
    pub fn total_sets(&self, rule: Rule) -> u32 {
        match rule {
            Rule::Monthly => self.monthly_sets,
            Rule::Weekly => self.weekly_sets,
            Rule::Daily => self.daily_sets,
            Rule::None => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notifications {
    /// Email address for operator mail.
    pub admin_user: String,
    #[serde(default)]
    pub notify_tape: String,
    #[serde(default)]
    pub notify_tar: String,
    #[serde(default)]
    pub notify_error: String,
}

/// Mutable block the manager rewrites after each run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    #[serde(default)]
    pub current_rule: Rule,
    /// Last successful target-level archive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Status,
    /// Last shell command dispatched, kept for diagnostics.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,
    #[serde(default)]
    pub current_set: SetCounters,
}

/// Per-rule rotation counters. `None` means the pool has never been used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SetCounters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub none: Option<u32>,
}

impl SetCounters {
    pub fn get(&self, rule: Rule) -> Option<u32> {
        match rule {
            Rule::Monthly => self.monthly,
            Rule::Weekly => self.weekly,
            Rule::Daily => self.daily,
            Rule::None => self.none,
        }
    }

    pub fn set(&mut self, rule: Rule, value: u32) {
        match rule {
            Rule::Monthly => self.monthly = Some(value),
            Rule::Weekly => self.weekly = Some(value),
            Rule::Daily => self.daily = Some(value),
            Rule::None => self.none = Some(value),
        }
    }
}

impl ArchiveRecord {
    /// Validate the record's internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.meta.name.is_empty() {
            return Err(RotabError::config_load("meta.name must not be empty"));
        }
        if self.meta.name.contains('/') || self.meta.name.contains("..") {
            return Err(RotabError::config_load(format!(
                "meta.name '{}' is not a valid path component",
                self.meta.name
            )));
        }
        if self.targets.partitions.is_empty() {
            return Err(RotabError::config_load(format!(
                "archive '{}' has no partitions",
                self.meta.name
            )));
        }

        // Every scheduled tier needs a non-empty set pool.
        for rule in [Rule::Monthly, Rule::Weekly, Rule::Daily] {
            if self.schedule.days().contains(&rule) && self.storage.total_sets(rule) == 0 {
                return Err(RotabError::config_load(format!(
                    "archive '{}' schedules {} backups but has no {} sets",
                    self.meta.name, rule, rule
                )));
            }
        }

        // Counters must sit inside their pools.
        for rule in [Rule::Monthly, Rule::Weekly, Rule::Daily] {
            let total = self.storage.total_sets(rule);
            if let Some(current) = self.state.current_set.get(rule) {
                if total > 0 && current >= total {
                    return Err(RotabError::config_load(format!(
                        "archive '{}' {} set counter {} out of range (pool size {})",
                        self.meta.name, rule, current, total
                    )));
                }
            }
        }

        Ok(())
    }
}

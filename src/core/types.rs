//! Domain types shared across the manager: backup rules, run status,
//! targets and the comma-joined partition list used by the document format.

use crate::core::error::{Result, RotabError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Backup tier for one calendar day.
///
/// The three real tiers chain together: `monthly` is a fresh base,
/// `weekly` references the monthly state file, `daily` references the
/// weekly one. `none` days run nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Rule {
    Monthly,
    Weekly,
    Daily,
    #[default]
    None,
}

impl Rule {
    /// All rules, in priority order (lowest first).
    pub const ALL: [Rule; 4] = [Rule::None, Rule::Daily, Rule::Weekly, Rule::Monthly];

    /// Run-ordering priority: lower runs earlier in the day's sweep, so
    /// the operator-attention monthly tape work finishes the run.
    pub fn priority(self) -> u8 {
        match self {
            Rule::None => 0,
            Rule::Daily => 1,
            Rule::Weekly => 2,
            Rule::Monthly => 3,
        }
    }

    /// Lowercase wire name, as used in documents and worker options.
    pub fn as_str(self) -> &'static str {
        match self {
            Rule::Monthly => "monthly",
            Rule::Weekly => "weekly",
            Rule::Daily => "daily",
            Rule::None => "none",
        }
    }

    /// The tier whose incremental state file this rule references, if any.
    pub fn reference_tier(self) -> Option<Rule> {
        match self {
            Rule::Weekly => Some(Rule::Monthly),
            Rule::Daily => Some(Rule::Weekly),
            Rule::Monthly | Rule::None => None,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rule {
    type Err = RotabError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "monthly" => Ok(Rule::Monthly),
            "weekly" => Ok(Rule::Weekly),
            "daily" => Ok(Rule::Daily),
            "none" => Ok(Rule::None),
            other => Err(RotabError::cli(format!(
                "unknown rule '{}' (expected monthly|weekly|daily|none)",
                other
            ))),
        }
    }
}

/// Outcome recorded in an archive document after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Failed,
    #[default]
    None,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Ok => "ok",
            Status::Failed => "failed",
            Status::None => "none",
        })
    }
}

/// One `host:/path` partition of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Client host the filesystem lives on.
    pub host: String,
    /// Absolute path on the client to archive.
    pub path: String,
}

impl Target {
    /// Path slug used in incremental state file names: `/` becomes `:`.
    pub fn path_slug(&self) -> String {
        self.path.replace('/', ":")
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.path)
    }
}

impl FromStr for Target {
    type Err = RotabError;

    fn from_str(s: &str) -> Result<Self> {
        let (host, path) = s.split_once(':').ok_or_else(|| {
            RotabError::config_load(format!("partition '{}' is not host:/path", s))
        })?;
        if host.is_empty() {
            return Err(RotabError::config_load(format!("partition '{}' has an empty host", s)));
        }
        if !path.starts_with('/') {
            return Err(RotabError::config_load(format!(
                "partition '{}' path must be absolute",
                s
            )));
        }
        Ok(Target {
            host: host.to_string(),
            path: path.to_string(),
        })
    }
}

/// Ordered target list, serialized as the document's comma-joined
/// `host1:/p1,host2:/p2` string. Order defines execution order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartitionList(pub Vec<Target>);

impl PartitionList {
    pub fn iter(&self) -> std::slice::Iter<'_, Target> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PartitionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(Target::to_string)
            .collect::<Vec<_>>()
            .join(",");
        f.write_str(&joined)
    }
}

impl FromStr for PartitionList {
    type Err = RotabError;

    fn from_str(s: &str) -> Result<Self> {
        let mut targets = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            targets.push(part.parse::<Target>()?);
        }
        Ok(PartitionList(targets))
    }
}

impl Serialize for PartitionList {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PartitionList {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

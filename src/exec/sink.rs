//! The receiving end on the manager host: a block device or a directory,
//! plus the tape control verbs.
//!
//! One stream per target; the worker's ssh leg back to the manager pipes
//! into the configured receiver command (default `cat`), which writes to
//! the effective destination computed here.

use crate::core::types::{Rule, Target};
use crate::core::{Result, RotabError};
use crate::transport::CommandRunner;
use chrono::Weekday;
use std::path::PathBuf;
use std::sync::Arc;

/// Where one archive's streams land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// A real device; tape verbs are live.
    Device(String),
    /// A directory; files are synthesized per target, verbs are no-ops.
    Directory(PathBuf),
}

impl Destination {
    /// Device iff the configured path begins with `/dev`.
    pub fn parse(remote_device: &str) -> Destination {
        if remote_device.starts_with("/dev") {
            Destination::Device(remote_device.to_string())
        } else {
            Destination::Directory(PathBuf::from(remote_device))
        }
    }

    pub fn is_device(&self) -> bool {
        matches!(self, Destination::Device(_))
    }
}

/// Synthesized file name for directory destinations:
/// `<sanitized name::host:path>-<rule>.<weekdayShort>.tgz` with `:`
/// replaced by `_` and `/` by `.`.
pub fn receive_file_name(archive: &str, target: &Target, rule: Rule, weekday: Weekday) -> String {
    let core = format!("{}::{}:{}-{}", archive, target.host, target.path, rule);
    let sanitized = core.replace(':', "_").replace('/', ".");
    format!("{}.{}.tgz", sanitized, weekday)
}

/// Drives the destination for one archive run.
pub struct Sink {
    destination: Destination,
    runner: Arc<dyn CommandRunner>,
}

impl Sink {
    pub fn new(remote_device: &str, runner: Arc<dyn CommandRunner>) -> Self {
        Sink {
            destination: Destination::parse(remote_device),
            runner,
        }
    }

    pub fn is_device(&self) -> bool {
        self.destination.is_device()
    }

    /// The path handed to the worker as its `device` option: the device
    /// itself, or the synthesized file inside the directory.
    pub fn effective_path(&self, archive: &str, target: &Target, rule: Rule, weekday: Weekday) -> String {
        match &self.destination {
            Destination::Device(dev) => dev.clone(),
            Destination::Directory(dir) => dir
                .join(receive_file_name(archive, target, rule, weekday))
                .to_string_lossy()
                .into_owned(),
        }
    }

    /// Position the tape before a target stream.
    pub async fn rewind(&self) -> Result<()> {
        self.verb("rewind").await
    }

    /// Eject after the archive's last target succeeded. Devices only; the
    /// executor guards the call.
    pub async fn offline(&self) -> Result<()> {
        self.verb("offline").await
    }

    async fn verb(&self, verb: &str) -> Result<()> {
        let argv: Vec<String> = match &self.destination {
            Destination::Device(dev) => {
                vec!["mt".into(), "-f".into(), dev.clone(), verb.into()]
            },
            // no-op with real return-status semantics
            Destination::Directory(_) => vec!["echo".into(), verb.into()],
        };

        let out = self.runner.run(&argv).await?;
        if !out.success() {
            return Err(RotabError::transport(format!(
                "tape {} exited with {}: {}",
                verb,
                out.code,
                out.stderr.trim()
            )));
        }
        Ok(())
    }
}

//! Common test utilities and fixtures.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rotab::archive::record::{
    ArchiveRecord, ManagerSpec, Meta, Notifications, RunState, Schedule, StorageSpec, Targets,
    WorkerMap, WorkerPaths,
};
use rotab::core::{Result, RunContext};
use rotab::notify::mail::MailTransport;
use rotab::transport::{CommandRunner, ExecOutput, Transport};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// One recorded remote invocation.
#[derive(Debug, Clone)]
pub struct RemoteCall {
    pub host: String,
    pub argv: Vec<String>,
}

/// Scripted remote shell: per-host liveness and archiver behavior, with
/// every call recorded for assertions.
#[derive(Default)]
pub struct FakeTransport {
    down: HashSet<String>,
    stdout: HashMap<String, String>,
    exit_code: HashMap<String, i32>,
    calls: Mutex<Vec<RemoteCall>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        FakeTransport::default()
    }

    /// All pings to this host fail.
    pub fn host_down(mut self, host: &str) -> Self {
        self.down.insert(host.to_string());
        self
    }

    /// Archiver stdout for this host (default: `bytes 0 12345`).
    pub fn with_stdout(mut self, host: &str, stdout: &str) -> Self {
        self.stdout.insert(host.to_string(), stdout.to_string());
        self
    }

    /// Archiver exit code for this host (default: 0).
    pub fn with_exit(mut self, host: &str, code: i32) -> Self {
        self.exit_code.insert(host.to_string(), code);
        self
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    /// The recorded archiver invocations (prep commands filtered out).
    pub fn worker_calls(&self) -> Vec<RemoteCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.argv.first().map(String::as_str) == Some("env"))
            .collect()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn exec(
        &self,
        host: &str,
        _user: Option<&str>,
        _port: Option<u16>,
        argv: &[String],
    ) -> Result<ExecOutput> {
        self.calls.lock().unwrap().push(RemoteCall {
            host: host.to_string(),
            argv: argv.to_vec(),
        });

        // state-file maintenance always succeeds
        if matches!(argv.first().map(String::as_str), Some("rm") | Some("touch")) {
            return Ok(ExecOutput::ok());
        }

        Ok(ExecOutput {
            code: *self.exit_code.get(host).unwrap_or(&0),
            stdout: self
                .stdout
                .get(host)
                .cloned()
                .unwrap_or_else(|| "bytes 0 12345".to_string()),
            stderr: String::new(),
        })
    }

    async fn ping(&self, host: &str) -> bool {
        !self.down.contains(host)
    }
}

/// Local runner that records argvs and hook commands and always succeeds.
#[derive(Default)]
pub struct RecordingRunner {
    pub argvs: Mutex<Vec<Vec<String>>>,
    pub shell_commands: Mutex<Vec<String>>,
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, argv: &[String]) -> Result<ExecOutput> {
        self.argvs.lock().unwrap().push(argv.to_vec());
        Ok(ExecOutput::ok())
    }

    async fn run_shell(&self, command: &str) -> Result<ExecOutput> {
        self.shell_commands.lock().unwrap().push(command.to_string());
        Ok(ExecOutput::ok())
    }
}

/// Mailer that records every message instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingMailer {
    pub fn messages(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

/// Bundle of seams handed to a test context, kept around for assertions.
pub struct Seams {
    pub transport: Arc<FakeTransport>,
    pub runner: Arc<RecordingRunner>,
    pub mailer: Arc<RecordingMailer>,
}

impl Seams {
    pub fn new(transport: FakeTransport) -> Self {
        Seams {
            transport: Arc::new(transport),
            runner: Arc::new(RecordingRunner::default()),
            mailer: Arc::new(RecordingMailer::default()),
        }
    }

    /// A context pinned to midnight UTC of the given date.
    pub fn context(&self, year: i32, month: u32, day: u32) -> RunContext {
        RunContext::with_seams(
            self.transport.clone(),
            self.runner.clone(),
            self.mailer.clone(),
        )
        .at(Utc.with_ymd_and_hms(year, month, day, 2, 30, 0).unwrap())
    }
}

/// Fixture builder for archive records.
pub struct TestRecordBuilder {
    record: ArchiveRecord,
}

impl TestRecordBuilder {
    pub fn new(name: &str, log_dir: &Path) -> Self {
        TestRecordBuilder {
            record: ArchiveRecord {
                meta: Meta {
                    name: name.to_string(),
                    description: "test archive".to_string(),
                },
                manager: ManagerSpec {
                    manager_host: "vault".to_string(),
                    manager_user: "backup".to_string(),
                    manager_port: 22,
                },
                targets: Targets {
                    partitions: "h1:/etc".parse().unwrap(),
                },
                worker: WorkerMap {
                    default: WorkerPaths {
                        script_dir: "/usr/local/backup/bin".to_string(),
                        tcl_lib_path: "/usr/local/backup/lib".to_string(),
                    },
                    overrides: BTreeMap::new(),
                },
                schedule: Schedule::default(),
                storage: StorageSpec {
                    log_dir: log_dir.to_path_buf(),
                    remote_device: "/dev/nst0".to_string(),
                    list_file_dir: "/var/lib/rotab".to_string(),
                    daily_sets: 3,
                    weekly_sets: 2,
                    monthly_sets: 1,
                    buffer: "cat".to_string(),
                },
                notifications: Notifications {
                    admin_user: "ops@example.org".to_string(),
                    notify_tape: String::new(),
                    notify_tar: String::new(),
                    notify_error: String::new(),
                },
                state: RunState::default(),
            },
        }
    }

    pub fn partitions(mut self, spec: &str) -> Self {
        self.record.targets.partitions = spec.parse().unwrap();
        self
    }

    pub fn schedule(mut self, f: impl FnOnce(&mut Schedule)) -> Self {
        f(&mut self.record.schedule);
        self
    }

    pub fn storage(mut self, f: impl FnOnce(&mut StorageSpec)) -> Self {
        f(&mut self.record.storage);
        self
    }

    pub fn state(mut self, f: impl FnOnce(&mut RunState)) -> Self {
        f(&mut self.record.state);
        self
    }

    pub fn build(self) -> ArchiveRecord {
        self.record.validate().expect("test fixture must be valid");
        self.record
    }
}

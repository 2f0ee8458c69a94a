//! Process seams between the manager and the outside world.
//!
//! Two narrow interfaces live here:
//! - [`Transport`]: run a command on a client host over an authenticated
//!   remote shell, plus the liveness pre-check.
//! - [`CommandRunner`]: spawn a command on the manager host itself (tape
//!   control verbs, notification hooks).
//!
//! Remote commands are always built as argv vectors; the one and only
//! shell-escape happens here, at the transport boundary.

use crate::core::{Result, RotabError};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// Captured outcome of a spawned process.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    /// Exit code; -1 when the process died without one (signal).
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// A synthetic success, useful for no-op verbs.
    pub fn ok() -> Self {
        ExecOutput {
            code: 0,
            stdout: String::new(),
            stderr: String::new(),
        }
    }
}

impl From<std::process::Output> for ExecOutput {
    fn from(out: std::process::Output) -> Self {
        ExecOutput {
            code: out.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        }
    }
}

/// Authenticated remote shell to a client host.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute `argv` on `host` and wait for completion.
    async fn exec(
        &self,
        host: &str,
        user: Option<&str>,
        port: Option<u16>,
        argv: &[String],
    ) -> Result<ExecOutput>;

    /// Liveness pre-check: three echo probes. All must fail for the host
    /// to be considered unreachable.
    async fn ping(&self, host: &str) -> bool;
}

/// Local spawns on the manager host.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run an argv vector directly, no shell.
    async fn run(&self, argv: &[String]) -> Result<ExecOutput>;

    /// Run a configured command string through `sh -c`. Used only for
    /// operator-supplied notification hooks.
    async fn run_shell(&self, command: &str) -> Result<ExecOutput>;
}

/// Quote one argument for a POSIX shell.
pub fn shell_quote(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '=' | '@' | ','))
    {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}

/// Render an argv vector as a single shell-safe command line.
pub fn render_command(argv: &[String]) -> String {
    argv.iter()
        .map(|a| shell_quote(a))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The default transport: `ssh` in batch mode.
#[derive(Debug, Default)]
pub struct SshTransport;

#[async_trait]
impl Transport for SshTransport {
    async fn exec(
        &self,
        host: &str,
        user: Option<&str>,
        port: Option<u16>,
        argv: &[String],
    ) -> Result<ExecOutput> {
        let destination = match user {
            Some(user) => format!("{}@{}", user, host),
            None => host.to_string(),
        };

        let mut cmd = Command::new("ssh");
        cmd.arg("-o").arg("BatchMode=yes");
        if let Some(port) = port {
            cmd.arg("-p").arg(port.to_string());
        }
        // ssh re-joins its trailing words with spaces on the remote side,
        // so the whole argv is escaped into one word here.
        cmd.arg(destination).arg(render_command(argv));
        cmd.stdin(Stdio::null());

        tracing::debug!(host, "spawning remote shell");
        let out = cmd
            .output()
            .await
            .map_err(|e| RotabError::transport(format!("cannot spawn ssh to {}: {}", host, e)))?;
        Ok(out.into())
    }

    async fn ping(&self, host: &str) -> bool {
        let probe = Command::new("ping")
            .args(["-c", "3", "-W", "5"])
            .arg(host)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        matches!(probe, Ok(status) if status.success())
    }
}

/// The default local runner.
#[derive(Debug, Default)]
pub struct ShellRunner;

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, argv: &[String]) -> Result<ExecOutput> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| RotabError::transport("empty local command"))?;
        let out = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| RotabError::transport(format!("cannot spawn {}: {}", program, e)))?;
        Ok(out.into())
    }

    async fn run_shell(&self, command: &str) -> Result<ExecOutput> {
        let out = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| RotabError::transport(format!("cannot spawn shell: {}", e)))?;
        Ok(out.into())
    }
}

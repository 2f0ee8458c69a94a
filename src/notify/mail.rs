//! Operator mail, behind a narrow interface. The default implementation
//! pipes the body into the local `mail` command; tests substitute a
//! recording double.

use crate::core::{Result, RotabError};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Delivery seam for operator email.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// Default transport: the local `mail -s` binary.
#[derive(Debug, Default)]
pub struct SendmailMailer;

#[async_trait]
impl MailTransport for SendmailMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let mut child = Command::new("mail")
            .arg("-s")
            .arg(subject)
            .arg(to)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| RotabError::Notify(format!("cannot spawn mail: {}", e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| RotabError::Notify("mail stdin unavailable".to_string()))?;
        stdin.write_all(body.as_bytes()).await?;
        drop(stdin);

        let status = child.wait().await?;
        if !status.success() {
            return Err(RotabError::Notify(format!(
                "mail to {} exited with {}",
                to,
                status.code().unwrap_or(-1)
            )));
        }
        tracing::debug!(to, subject, "operator mail sent");
        Ok(())
    }
}

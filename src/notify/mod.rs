//! Operator notifications: the three hook commands an archive can
//! configure, and the "tomorrow" mail summarizing the next expected run.
//!
//! Hooks are best-effort: a failed hook is logged and never fails the
//! backup it decorates.

pub mod mail;

use crate::archive::record::{ArchiveRecord, Notifications};
use crate::core::context::RunContext;
use crate::core::types::{Rule, Target};
use crate::core::Result;
use crate::schedule::{can_do_monthly, incremental_reset, peek_next};
use crate::transport::CommandRunner;
use chrono::Datelike;
use mail::MailTransport;
use std::sync::Arc;

pub use mail::SendmailMailer;

pub struct Notifier {
    archive: String,
    config: Notifications,
    local: Arc<dyn CommandRunner>,
    mailer: Arc<dyn MailTransport>,
}

impl Notifier {
    pub fn new(ctx: &RunContext, record: &ArchiveRecord) -> Self {
        Notifier {
            archive: record.meta.name.clone(),
            config: record.notifications.clone(),
            local: ctx.local.clone(),
            mailer: ctx.mailer.clone(),
        }
    }

    /// Fire-and-forget tape notification before the archive starts.
    pub async fn preflight(&self) {
        self.hook("notifyTape", &self.config.notify_tape).await;
    }

    /// Per-target notification as its stream begins.
    pub async fn on_archive_start(&self, target: &Target) {
        tracing::info!(archive = %self.archive, target = %target, "starting target");
        self.hook("notifyTar", &self.config.notify_tar).await;
    }

    /// Error notification with the failure context.
    pub async fn on_archive_error(&self, context: &str) {
        tracing::error!(archive = %self.archive, context, "archive error");
        self.hook("notifyError", &self.config.notify_error).await;
    }

    async fn hook(&self, kind: &str, command: &str) {
        if command.is_empty() {
            return;
        }
        match self.local.run_shell(command).await {
            Ok(out) if out.success() => {},
            Ok(out) => {
                tracing::warn!(archive = %self.archive, kind, code = out.code, "notification hook failed")
            },
            Err(e) => tracing::warn!(archive = %self.archive, kind, error = %e, "notification hook failed"),
        }
    }

    /// Mail the operator what tomorrow will bring: the expected rule and
    /// the volume it will use. Quiet when tomorrow runs nothing, or when
    /// tomorrow's monthly falls outside the first week of the month.
    pub async fn notify_tomorrow(&self, record: &ArchiveRecord, ctx: &RunContext) -> Result<()> {
        let tomorrow = ctx.tomorrow();
        let rule = record.schedule.rule_for(tomorrow.weekday());

        if rule == Rule::None {
            return Ok(());
        }
        if rule == Rule::Monthly && !can_do_monthly(tomorrow.day()) {
            return Ok(());
        }

        let set = peek_next(record, rule);
        let pool = record.storage.total_sets(rule);
        let origin = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "localhost".to_string());

        let subject = match set {
            Some(set) => format!(
                "[rotab] {}: {} backup tomorrow, set {}",
                self.archive, rule, set
            ),
            None => format!("[rotab] {}: {} backup tomorrow", self.archive, rule),
        };

        let mut body = format!(
            "rotab on {}\n\narchive:  {}\ntomorrow: {} ({})\nrule:     {}\n",
            origin,
            self.archive,
            tomorrow.format("%m.%d.%Y"),
            tomorrow.weekday(),
            rule,
        );
        if let Some(set) = set {
            body.push_str(&format!("set:      {} of {}\n", set, pool));
        }
        if incremental_reset(record, tomorrow) {
            body.push_str("\nThe incremental chain will be re-rooted: a fresh base is taken first.\n");
        }

        self.mailer
            .send(&record.notifications.admin_user, &subject, &body)
            .await
    }
}

//! The run context: one explicit value carrying the clock, the operator's
//! day/rule overrides and the process seams, threaded through the
//! dispatcher, executor and notifier instead of ambient globals.

use crate::core::types::Rule;
use crate::notify::mail::{MailTransport, SendmailMailer};
use crate::transport::{CommandRunner, ShellRunner, SshTransport, Transport};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use std::sync::Arc;

/// Everything a single manager run needs to know about "today" and how to
/// reach the outside world.
#[derive(Clone)]
pub struct RunContext {
    now: DateTime<Utc>,
    day_override: Option<Weekday>,
    forced_rule: Option<Rule>,
    /// Remote shell to client hosts.
    pub transport: Arc<dyn Transport>,
    /// Spawns on the manager host (tape verbs, notify hooks).
    pub local: Arc<dyn CommandRunner>,
    /// Operator mail delivery.
    pub mailer: Arc<dyn MailTransport>,
}

impl RunContext {
    /// Context with the real clock and the default process seams.
    pub fn new() -> Self {
        RunContext {
            now: Utc::now(),
            day_override: None,
            forced_rule: None,
            transport: Arc::new(SshTransport),
            local: Arc::new(ShellRunner),
            mailer: Arc::new(SendmailMailer),
        }
    }

    /// Context with injected seams; used by tests and by callers that
    /// already own the transports.
    pub fn with_seams(
        transport: Arc<dyn Transport>,
        local: Arc<dyn CommandRunner>,
        mailer: Arc<dyn MailTransport>,
    ) -> Self {
        RunContext {
            now: Utc::now(),
            day_override: None,
            forced_rule: None,
            transport,
            local,
            mailer,
        }
    }

    /// Pin the clock. Labels, month comparisons and log timestamps all
    /// derive from this one instant.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Override the day-of-week used for rule resolution (`--day`).
    pub fn on_day(mut self, day: Option<Weekday>) -> Self {
        self.day_override = day;
        self
    }

    /// Force today's rule regardless of the schedule (`--rule`).
    pub fn forcing(mut self, rule: Option<Rule>) -> Self {
        self.forced_rule = rule;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    pub fn tomorrow(&self) -> NaiveDate {
        self.today() + Duration::days(1)
    }

    /// Day of week driving rule resolution: the `--day` override when
    /// present, otherwise the calendar's.
    pub fn weekday(&self) -> Weekday {
        self.day_override.unwrap_or_else(|| self.today().weekday())
    }

    pub fn day_of_month(&self) -> u32 {
        self.today().day()
    }

    pub fn forced_rule(&self) -> Option<Rule> {
        self.forced_rule
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

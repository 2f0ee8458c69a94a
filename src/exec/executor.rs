//! The per-archive execution pipeline: resolve today's rule, walk the
//! targets in order, stream each through the worker, and commit or divert
//! the record's state.
//!
//! Failure containment: an unreachable or failed target never aborts its
//! siblings; it only downgrades the archive's outcome. The rotation
//! counter advances, and the canonical document is overwritten, only when
//! every target succeeded.

use crate::archive::record::ArchiveRecord;
use crate::archive::store;
use crate::core::context::RunContext;
use crate::core::error::{render_error_block, Result, RotabError, Severity};
use crate::core::types::{Rule, Status, Target};
use crate::exec::sink::Sink;
use crate::exec::{label, results, worker};
use crate::notify::Notifier;
use crate::schedule::{
    advance, can_do_monthly, incremental_reset, peek_next, resolve_rule, state_file_plan,
    StateFilePlan,
};
use crate::transport::render_command;
use std::path::Path;

/// What happened to one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
    Ok { bytes: u64 },
    /// Liveness pre-check failed; the worker was never invoked.
    Unreachable,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReport {
    pub target: Target,
    pub outcome: TargetOutcome,
}

/// What happened to one archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// Nothing to do today (rule `none`, or monthly outside its window).
    Skipped,
    /// Every target succeeded and the canonical document was rewritten.
    Completed,
    /// At least one target failed; state diverted to the error document.
    Failed,
    /// The run succeeded but the canonical document could not be saved.
    SaveFailed,
}

/// Result of running one archive, for the dispatcher's aggregate.
#[derive(Debug, Clone)]
pub struct ArchiveRun {
    pub archive: String,
    pub rule: Rule,
    pub set_index: Option<u32>,
    pub outcome: ArchiveOutcome,
    pub targets: Vec<TargetReport>,
}

impl ArchiveRun {
    pub fn failed(&self) -> bool {
        matches!(self.outcome, ArchiveOutcome::Failed | ArchiveOutcome::SaveFailed)
    }
}

/// Run one archive end to end and persist its record.
pub async fn run_archive(
    ctx: &RunContext,
    record: &mut ArchiveRecord,
    canonical: &Path,
) -> ArchiveRun {
    let name = record.meta.name.clone();
    let rule = resolve_rule(record, ctx.weekday(), ctx.forced_rule());
    record.state.current_rule = rule;

    let skipped = |rule| ArchiveRun {
        archive: name.clone(),
        rule,
        set_index: None,
        outcome: ArchiveOutcome::Skipped,
        targets: Vec::new(),
    };

    if rule == Rule::None {
        tracing::info!(archive = %name, "no rule scheduled today");
        return skipped(rule);
    }
    if rule == Rule::Monthly
        && !can_do_monthly(ctx.day_of_month())
        && ctx.forced_rule() != Some(Rule::Monthly)
    {
        tracing::info!(
            archive = %name,
            day = ctx.day_of_month(),
            "monthly backup refused outside the first week"
        );
        return skipped(rule);
    }

    let notifier = Notifier::new(ctx, record);

    let Some(slot) = peek_next(record, rule) else {
        // only reachable through a forced rule with an empty pool
        let err = RotabError::config_load(format!("archive '{}' has no {} sets", name, rule));
        eprintln!(
            "{}",
            render_error_block(&format!("selecting a {} set for {}", rule, name), &err.to_string(), "empty set pool", ctx.now())
        );
        notifier.on_archive_error(&format!("no {} sets", rule)).await;
        record.state.status = Status::Failed;
        let _ = store::save_error_document(record).await;
        return ArchiveRun {
            archive: name,
            rule,
            set_index: None,
            outcome: ArchiveOutcome::Failed,
            targets: Vec::new(),
        };
    };

    tracing::info!(archive = %name, %rule, set = slot, "archive starting");
    notifier.preflight().await;

    // Decided once, before any target refreshes archive_date.
    let inc_reset = incremental_reset(record, ctx.today());
    let plan = state_file_plan(rule, inc_reset);
    let sink = Sink::new(&record.storage.remote_device, ctx.local.clone());

    let targets: Vec<Target> = record.targets.partitions.0.clone();
    let mut reports = Vec::with_capacity(targets.len());
    let mut all_ok = true;

    for target in targets {
        match run_target(ctx, record, &notifier, &sink, &target, rule, inc_reset, &plan, slot).await
        {
            Ok(bytes) => {
                tracing::info!(archive = %name, target = %target, bytes, "target archived");
                reports.push(TargetReport {
                    target,
                    outcome: TargetOutcome::Ok { bytes },
                });
            },
            Err(err) if err.severity() == Severity::Warn => {
                tracing::warn!(archive = %name, target = %target, error = %err, "target skipped");
                all_ok = false;
                reports.push(TargetReport {
                    target,
                    outcome: TargetOutcome::Unreachable,
                });
            },
            Err(err) => {
                eprintln!(
                    "{}",
                    render_error_block(
                        &format!("archiving {} of {}", target, name),
                        &err.to_string(),
                        err.category(),
                        ctx.now(),
                    )
                );
                notifier
                    .on_archive_error(&format!("{}: {}", target, err))
                    .await;
                all_ok = false;
                reports.push(TargetReport {
                    target,
                    outcome: TargetOutcome::Failed(err.to_string()),
                });
            },
        }
    }

    let outcome = if all_ok {
        advance(record, rule);
        record.state.status = Status::Ok;

        if sink.is_device() {
            if let Err(e) = sink.offline().await {
                tracing::warn!(archive = %name, error = %e, "could not take tape offline");
            }
        }
        if let Err(e) = notifier.notify_tomorrow(record, ctx).await {
            tracing::warn!(archive = %name, error = %e, "tomorrow mail failed");
        }

        match store::save(record, canonical).await {
            Ok(()) => ArchiveOutcome::Completed,
            Err(err) => {
                eprintln!(
                    "{}",
                    render_error_block(
                        &format!("saving state for {}", name),
                        &err.to_string(),
                        err.category(),
                        ctx.now(),
                    )
                );
                let _ = store::save_error_document(record).await;
                ArchiveOutcome::SaveFailed
            },
        }
    } else {
        record.state.status = Status::Failed;
        if let Err(e) = store::save_error_document(record).await {
            tracing::error!(archive = %name, error = %e, "could not write error document");
        }
        ArchiveOutcome::Failed
    };

    ArchiveRun {
        archive: name,
        rule,
        set_index: Some(slot),
        outcome,
        targets: reports,
    }
}

/// One target: liveness, tape position, state-file prep, stream, parse,
/// logs. Returns the byte count the archiver reported.
#[allow(clippy::too_many_arguments)]
async fn run_target(
    ctx: &RunContext,
    record: &mut ArchiveRecord,
    notifier: &Notifier,
    sink: &Sink,
    target: &Target,
    rule: Rule,
    inc_reset: bool,
    plan: &StateFilePlan,
    slot: u32,
) -> Result<u64> {
    if !ctx.transport.ping(&target.host).await {
        return Err(RotabError::PingHost(target.host.clone()));
    }

    notifier.on_archive_start(target).await;
    sink.rewind().await?;

    for argv in worker::prep_commands(record, target, plan) {
        let out = ctx.transport.exec(&target.host, None, None, &argv).await?;
        if !out.success() {
            return Err(RotabError::transport(format!(
                "state-file prep '{}' exited {} on {}: {}",
                render_command(&argv),
                out.code,
                target.host,
                out.stderr.trim()
            )));
        }
    }

    let name = record.meta.name.clone();
    let archive_label = label::build(&name, target, rule, ctx.today());
    let device = sink.effective_path(&name, target, rule, ctx.weekday());
    let argv = worker::build(record, target, &archive_label, &device, rule, inc_reset);
    record.state.command = render_command(&argv);

    let out = ctx.transport.exec(&target.host, None, None, &argv).await?;
    if !out.success() {
        return Err(RotabError::transport(format!(
            "archiver exited {} on {}: {}",
            out.code,
            target.host,
            out.stderr.trim()
        )));
    }

    let report = results::parse(&out.stdout, &target.host)?;
    record.state.archive_date = Some(ctx.now());
    write_target_logs(record, rule, slot, &archive_label, &report, ctx).await;

    Ok(report.total_bytes)
}

/// Best-effort log writing; a full log partition must not fail a target
/// whose stream already landed.
async fn write_target_logs(
    record: &ArchiveRecord,
    rule: Rule,
    slot: u32,
    archive_label: &str,
    report: &results::WorkerReport,
    ctx: &RunContext,
) {
    let log_dir = &record.storage.log_dir;
    if let Err(e) = tokio::fs::create_dir_all(log_dir).await {
        tracing::warn!(dir = %log_dir.display(), error = %e, "cannot create log directory");
        return;
    }

    let results_path = log_dir.join(results::results_log_name(&record.meta.name, rule, slot));
    let mut raw = report.tokens.join(" ");
    raw.push('\n');
    if let Err(e) = tokio::fs::write(&results_path, raw.as_bytes()).await {
        tracing::warn!(path = %results_path.display(), error = %e, "cannot write results log");
    }

    let status_path = log_dir.join(results::status_log_name(&record.meta.name, rule, slot));
    let status = results::render_status(archive_label, ctx.now(), report.total_bytes);
    if let Err(e) = tokio::fs::write(&status_path, status.as_bytes()).await {
        tracing::warn!(path = %status_path.display(), error = %e, "cannot write status log");
    }
}

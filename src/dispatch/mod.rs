//! Discover archive documents, order them, and run them one after
//! another.
//!
//! Archives run strictly sequentially: destination devices and operator
//! mail are single-writer resources. Ordering is priority ascending
//! (none, daily, weekly, monthly) so the monthly tape work, which wants
//! operator attention, finishes the run; ties keep discovery order,
//! which is the lexicographic file-name order.

use crate::archive::record::ArchiveRecord;
use crate::archive::store::{self, DocumentFormat};
use crate::core::context::RunContext;
use crate::core::error::{Result, RotabError};
use crate::exec::executor::{self, ArchiveOutcome, ArchiveRun};
use crate::schedule::resolve_rule;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// What a run sweeps and how it is filtered.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config_dir: PathBuf,
    /// Retain only the archive with this name.
    pub archive: Option<String>,
}

/// Aggregate of one manager run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub runs: Vec<ArchiveRun>,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.runs.iter().filter(|r| r.failed()).count()
    }

    pub fn completed(&self) -> usize {
        self.runs
            .iter()
            .filter(|r| r.outcome == ArchiveOutcome::Completed)
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.runs
            .iter()
            .filter(|r| r.outcome == ArchiveOutcome::Skipped)
            .count()
    }

    /// The run-level error this summary translates to, if any. A backup
    /// failure outranks a state-save failure.
    pub fn exit_error(&self) -> Option<RotabError> {
        let failed = self.failed();
        if failed == 0 {
            return None;
        }
        let only_save_failures = self
            .runs
            .iter()
            .all(|r| !r.failed() || r.outcome == ArchiveOutcome::SaveFailed);
        if only_save_failures {
            return Some(RotabError::state_save(format!(
                "{} archive(s) could not be committed",
                failed
            )));
        }
        Some(RotabError::BackupFailed {
            failed,
            total: self.runs.len(),
        })
    }
}

/// One discovered document, pre-parse.
struct Discovered {
    path: PathBuf,
    format: DocumentFormat,
    record: ArchiveRecord,
}

impl Discovered {
    /// Where the record is committed after a successful run. Legacy
    /// documents are read-only; their state lands in a YAML sibling.
    fn canonical_path(&self) -> PathBuf {
        match self.format {
            DocumentFormat::Yaml => self.path.clone(),
            DocumentFormat::Legacy => self.path.with_extension("yml"),
        }
    }
}

/// Sweep the configuration directory and run every eligible archive.
pub async fn run(ctx: &RunContext, opts: &RunOptions) -> Result<RunSummary> {
    let mut discovered = discover(&opts.config_dir).await?;
    discovered = drop_ambiguous(discovered);

    if let Some(wanted) = &opts.archive {
        discovered.retain(|d| &d.record.meta.name == wanted);
        if discovered.is_empty() {
            return Err(RotabError::config_load(format!(
                "no loadable archive named '{}' in {}",
                wanted,
                opts.config_dir.display()
            )));
        }
    }

    // Priority ascending; the sort is stable, so ties keep discovery order.
    discovered.sort_by_key(|d| {
        resolve_rule(&d.record, ctx.weekday(), ctx.forced_rule()).priority()
    });

    let mut summary = RunSummary::default();
    for mut doc in discovered {
        let canonical = doc.canonical_path();
        let run = executor::run_archive(ctx, &mut doc.record, &canonical).await;
        tracing::info!(
            archive = %run.archive,
            rule = %run.rule,
            outcome = ?run.outcome,
            "archive finished"
        );
        summary.runs.push(run);
    }

    Ok(summary)
}

/// Enumerate and parse every archive document in the directory.
/// Malformed documents are warned about and skipped; they never abort
/// the sweep.
async fn discover(config_dir: &Path) -> Result<Vec<Discovered>> {
    let meta = tokio::fs::metadata(config_dir).await.map_err(|_| {
        RotabError::DirNotFound(config_dir.display().to_string())
    })?;
    if !meta.is_dir() {
        return Err(RotabError::DirNotFound(config_dir.display().to_string()));
    }

    let mut paths = Vec::new();
    let mut entries = tokio::fs::read_dir(config_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if store::format_for(&path).is_some() {
            paths.push(path);
        }
    }
    // read_dir order is platform noise; discovery order is by file name
    paths.sort();

    let mut discovered = Vec::new();
    for path in paths {
        let format = store::format_for(&path).expect("pre-filtered");
        match store::load(&path).await {
            Ok(record) => discovered.push(Discovered { path, format, record }),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping malformed document");
            },
        }
    }
    Ok(discovered)
}

/// An archive present more than once (legacy and YAML form, or plain
/// duplicates) is a configuration error: every copy is dropped.
fn drop_ambiguous(discovered: Vec<Discovered>) -> Vec<Discovered> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for doc in &discovered {
        *counts.entry(doc.record.meta.name.clone()).or_default() += 1;
    }
    discovered
        .into_iter()
        .filter(|doc| {
            let name = &doc.record.meta.name;
            if counts[name] > 1 {
                tracing::warn!(
                    archive = %name,
                    path = %doc.path.display(),
                    "archive defined more than once; skipping all copies"
                );
                false
            } else {
                true
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Rule;
    use crate::exec::executor::ArchiveRun;

    fn run_with(outcome: ArchiveOutcome) -> ArchiveRun {
        ArchiveRun {
            archive: "a".to_string(),
            rule: Rule::Daily,
            set_index: Some(0),
            outcome,
            targets: Vec::new(),
        }
    }

    #[test]
    fn test_summary_counts() {
        let summary = RunSummary {
            runs: vec![
                run_with(ArchiveOutcome::Completed),
                run_with(ArchiveOutcome::Skipped),
                run_with(ArchiveOutcome::Failed),
            ],
        };
        assert_eq!(summary.completed(), 1);
        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.failed(), 1);
    }

    #[test]
    fn test_clean_run_has_no_exit_error() {
        let summary = RunSummary {
            runs: vec![run_with(ArchiveOutcome::Completed), run_with(ArchiveOutcome::Skipped)],
        };
        assert!(summary.exit_error().is_none());
    }

    #[test]
    fn test_backup_failure_outranks_save_failure() {
        let summary = RunSummary {
            runs: vec![run_with(ArchiveOutcome::Failed), run_with(ArchiveOutcome::SaveFailed)],
        };
        let err = summary.exit_error().unwrap();
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_pure_save_failure_maps_to_state_save() {
        let summary = RunSummary {
            runs: vec![run_with(ArchiveOutcome::SaveFailed), run_with(ArchiveOutcome::Completed)],
        };
        let err = summary.exit_error().unwrap();
        assert_eq!(err.exit_code(), 4);
    }
}

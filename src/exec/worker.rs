//! Building the exact remote command the on-client archiver runs, and the
//! state-file maintenance commands that precede it.
//!
//! Commands are argv vectors end to end; the transport applies the single
//! shell-escape when it crosses the ssh boundary.

use crate::archive::record::ArchiveRecord;
use crate::core::types::{Rule, Target};
use crate::schedule::StateFilePlan;

/// Name of the archiver program inside each worker's `scriptDir`.
pub const ARCHIVER_PROGRAM: &str = "tape_push";

/// `<listFileDir>/<archive>::<host>:<pathSlug>` — the per-target prefix
/// all of that target's incremental state files share. The tier suffix
/// (`-monthly` etc.) is appended per file.
pub fn state_file_base(record: &ArchiveRecord, target: &Target) -> String {
    format!(
        "{}/{}::{}:{}",
        record.storage.list_file_dir,
        record.meta.name,
        target.host,
        target.path_slug()
    )
}

/// The remote argv for one target's archiver invocation.
pub fn build(
    record: &ArchiveRecord,
    target: &Target,
    label: &str,
    device: &str,
    rule: Rule,
    inc_reset: bool,
) -> Vec<String> {
    let paths = record.worker.for_host(&target.host);
    let inc_reset = if inc_reset { "yes" } else { "no" };
    // monthly runs are long; keep them quiet
    let verbose = if rule == Rule::Monthly { "off" } else { "on" };

    vec![
        "env".to_string(),
        format!("TCLLIBPATH={}", paths.tcl_lib_path),
        format!("{}/{}", paths.script_dir, ARCHIVER_PROGRAM),
        "--user".to_string(),
        record.manager.manager_user.clone(),
        "--host".to_string(),
        record.manager.manager_host.clone(),
        "--device".to_string(),
        device.to_string(),
        "--label".to_string(),
        label.to_string(),
        "--listFileDir".to_string(),
        record.storage.list_file_dir.clone(),
        "--filesys".to_string(),
        target.path.clone(),
        "--currentRule".to_string(),
        rule.as_str().to_string(),
        "--buffer".to_string(),
        record.storage.buffer.clone(),
        "--incReset".to_string(),
        inc_reset.to_string(),
        "--verbose".to_string(),
        verbose.to_string(),
    ]
}

/// Remote commands realizing a [`StateFilePlan`] for one target, in
/// execution order. Tier suffixes are enumerated explicitly; globs would
/// arrive quoted on the remote side.
pub fn prep_commands(
    record: &ArchiveRecord,
    target: &Target,
    plan: &StateFilePlan,
) -> Vec<Vec<String>> {
    let base = state_file_base(record, target);
    let mut commands = Vec::new();

    let purge_tiers: Vec<Rule> = if plan.purge_all {
        vec![Rule::Monthly, Rule::Weekly, Rule::Daily]
    } else {
        plan.purge.clone()
    };

    if !purge_tiers.is_empty() {
        let mut rm = vec!["rm".to_string(), "-f".to_string()];
        rm.extend(purge_tiers.iter().map(|tier| format!("{}-{}", base, tier)));
        commands.push(rm);
    }

    if let Some(tier) = plan.seed {
        commands.push(vec!["touch".to_string(), format!("{}-{}", base, tier)]);
    }

    commands
}

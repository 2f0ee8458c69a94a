//! Command-line interface for the backup manager.
//!
//! The manager is a one-shot process: resolve the configuration
//! directory, sweep it, print a summary, and exit with the run's
//! aggregate code.

use crate::core::{Result, RotabError, RunContext};
use crate::dispatch::{self, RunOptions, RunSummary};
use crate::exec::ArchiveOutcome;
use chrono::Weekday;
use clap::{CommandFactory, Parser};
use colored::Colorize;
use std::path::PathBuf;

/// Incremental backup manager with rotating tape/disk sets.
#[derive(Parser, Debug)]
#[command(name = "rotab")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory of archive documents (default: ~/.config/rotab/archives)
    #[arg(long, env = "ROTAB_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Run only the named archive
    #[arg(long, env = "ROTAB_ARCHIVE")]
    pub archive: Option<String>,

    /// Force today's rule: monthly|weekly|daily|none
    #[arg(long)]
    pub rule: Option<String>,

    /// Resolve the schedule as if today were this day: Mon|Tue|...|Sun
    #[arg(long)]
    pub day: Option<String>,

    /// Disable colored output
    #[arg(long, env = "ROTAB_NO_COLOR")]
    pub no_color: bool,

    /// Print extended usage and exit
    #[arg(long)]
    pub usage: bool,

    /// Enable debug logging
    #[arg(short, long, env = "ROTAB_DEBUG")]
    pub debug: bool,
}

impl Cli {
    /// Parse command-line arguments without exiting on error, so the
    /// caller controls the exit code.
    pub fn parse_args() -> std::result::Result<Self, clap::Error> {
        Cli::try_parse()
    }

    /// Initialize logging from `--debug` / `ROTAB_LOG`.
    pub fn init_logging(&self) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let env_level = std::env::var("ROTAB_LOG").unwrap_or_else(|_| "info".to_string());
        let level = if self.debug { "debug" } else { env_level.as_str() };

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false).compact();

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| RotabError::cli(format!("failed to initialize logging: {}", e)))?;

        Ok(())
    }

    /// Honor `--no-color` and dumb/absent terminals.
    pub fn init_color(&self) {
        let term = std::env::var("TERM").unwrap_or_default();
        if self.no_color || term.is_empty() || term == "dumb" {
            colored::control::set_override(false);
        }
    }

    fn forced_rule(&self) -> Result<Option<crate::core::Rule>> {
        self.rule.as_deref().map(str::parse).transpose()
    }

    fn day_override(&self) -> Result<Option<Weekday>> {
        self.day
            .as_deref()
            .map(|raw| {
                raw.parse::<Weekday>().map_err(|_| {
                    RotabError::cli(format!("unknown day '{}' (expected Mon|Tue|...|Sun)", raw))
                })
            })
            .transpose()
    }

    fn resolve_config_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.config_dir {
            return Ok(dir.clone());
        }
        dirs::config_dir()
            .map(|d| d.join("rotab").join("archives"))
            .ok_or_else(|| RotabError::cli("no --config-dir given and no config directory known"))
    }
}

/// Execute the manager.
pub async fn execute(cli: Cli) -> Result<()> {
    if cli.usage {
        let mut cmd = Cli::command();
        cmd.print_long_help()
            .map_err(|e| RotabError::cli(e.to_string()))?;
        return Ok(());
    }

    cli.init_color();
    cli.init_logging()?;

    let ctx = RunContext::new()
        .on_day(cli.day_override()?)
        .forcing(cli.forced_rule()?);
    let opts = RunOptions {
        config_dir: cli.resolve_config_dir()?,
        archive: cli.archive.clone(),
    };

    // Children share the process group and see the signal too; archives
    // committed before the interrupt keep their state, the in-progress
    // one never reaches its save and so counts as failed.
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted; in-progress archive is considered failed");
            std::process::exit(crate::core::EXIT_BACKUP_FAILED);
        }
    });

    tracing::info!(dir = %opts.config_dir.display(), "starting backup run");
    let summary = dispatch::run(&ctx, &opts).await?;
    print_summary(&summary);

    match summary.exit_error() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn print_summary(summary: &RunSummary) {
    for run in &summary.runs {
        let status = match run.outcome {
            ArchiveOutcome::Completed => "ok".green().to_string(),
            ArchiveOutcome::Skipped => "skipped".dimmed().to_string(),
            ArchiveOutcome::Failed => "FAILED".red().bold().to_string(),
            ArchiveOutcome::SaveFailed => "SAVE FAILED".red().bold().to_string(),
        };
        let set = run
            .set_index
            .map(|s| format!("set {}", s))
            .unwrap_or_default();
        println!("{:<24} {:<8} {:<6} {}", run.archive, run.rule.as_str(), set, status);
    }
    println!(
        "{} completed, {} skipped, {} failed",
        summary.completed(),
        summary.skipped(),
        summary.failed()
    );
}

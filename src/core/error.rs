use thiserror::Error;

/// Process exit code for a run that ended with one or more failed archives.
pub const EXIT_BACKUP_FAILED: i32 = 5;

#[derive(Error, Debug)]
pub enum RotabError {
    #[error("invalid command line: {0}")]
    CliArgs(String),

    #[error("configuration directory not found: {0}")]
    DirNotFound(String),

    #[error("cannot load archive document: {0}")]
    ConfigLoad(String),

    #[error("host unreachable: {0}")]
    PingHost(String),

    #[error("remote shell failed: {0}")]
    Transport(String),

    #[error("archiver results unparsable: {0}")]
    ParseResults(String),

    #[error("archiver was killed on {0}")]
    WorkerKilled(String),

    #[error("cannot save archive state: {0}")]
    StateSave(String),

    #[error("{failed} of {total} archives failed")]
    BackupFailed { failed: usize, total: usize },

    #[error("notification failed: {0}")]
    Notify(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for rotab operations
pub type Result<T> = std::result::Result<T, RotabError>;

/// How far a failure reaches. Target failures never abort sibling targets
/// and archive failures never abort sibling archives; only run-level
/// failures stop the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Logged, target skipped, archive continues degraded.
    Warn,
    /// Target failed, archive marked failed, siblings still run.
    Target,
    /// Whole archive failed.
    Archive,
    /// The run itself cannot proceed.
    Run,
}

impl RotabError {
    /// Creates a new CLI argument error
    pub fn cli<S: Into<String>>(msg: S) -> Self {
        Self::CliArgs(msg.into())
    }

    /// Creates a new config load error
    pub fn config_load<S: Into<String>>(msg: S) -> Self {
        Self::ConfigLoad(msg.into())
    }

    /// Creates a new transport error
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        Self::Transport(msg.into())
    }

    /// Creates a new result-parsing error
    pub fn parse_results<S: Into<String>>(msg: S) -> Self {
        Self::ParseResults(msg.into())
    }

    /// Creates a new state-save error
    pub fn state_save<S: Into<String>>(msg: S) -> Self {
        Self::StateSave(msg.into())
    }

    /// Maps the error onto the manager's exit-code contract.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CliArgs(_) => 1,
            Self::DirNotFound(_) => 2,
            Self::ConfigLoad(_) => 3,
            Self::StateSave(_) => 4,
            Self::BackupFailed { .. } => EXIT_BACKUP_FAILED,
            Self::PingHost(_)
            | Self::Transport(_)
            | Self::ParseResults(_)
            | Self::WorkerKilled(_)
            | Self::Notify(_) => EXIT_BACKUP_FAILED,
            Self::Io(_) | Self::Yaml(_) => EXIT_BACKUP_FAILED,
        }
    }

    /// How far this failure reaches.
    pub fn severity(&self) -> Severity {
        match self {
            Self::PingHost(_) => Severity::Warn,
            Self::Transport(_) | Self::ParseResults(_) | Self::WorkerKilled(_) => Severity::Target,
            Self::ConfigLoad(_) | Self::StateSave(_) | Self::Notify(_) => Severity::Archive,
            Self::CliArgs(_) | Self::DirNotFound(_) | Self::BackupFailed { .. } => Severity::Run,
            Self::Io(_) | Self::Yaml(_) => Severity::Archive,
        }
    }

    /// Returns the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::CliArgs(_) => "cliArgs",
            Self::DirNotFound(_) => "dirNotFound",
            Self::ConfigLoad(_) => "configLoad",
            Self::PingHost(_) => "pingHost",
            Self::Transport(_) => "transport",
            Self::ParseResults(_) => "parseResults",
            Self::WorkerKilled(_) => "workerKilled",
            Self::StateSave(_) => "stateSave",
            Self::BackupFailed { .. } => "runAggregate",
            Self::Notify(_) => "notify",
            Self::Io(_) => "io",
            Self::Yaml(_) => "yaml",
        }
    }
}

/// Render the standardized user-visible failure block:
///
/// ```text
/// rotab ERROR
///     while <context>, <message>
///     specific: <detail>
///     at <date>
/// ```
pub fn render_error_block(
    context: &str,
    message: &str,
    detail: &str,
    at: chrono::DateTime<chrono::Utc>,
) -> String {
    use colored::Colorize;
    format!(
        "{}\n    while {}, {}\n    specific: {}\n    at {}",
        "rotab ERROR".red().bold(),
        context,
        message,
        detail,
        at.to_rfc3339()
    )
}

//! rotab - incremental backup manager with rotating tape/disk sets.
//!
//! A central manager walks a directory of per-archive documents, decides
//! what tier of backup each archive gets today, streams each target's
//! data from its client host over a secure shell into a rotating pool of
//! destination sets, and persists the updated rotation state back into
//! the document.
//!
//! # Architecture
//!
//! - `archive`: archive records and their on-disk documents
//! - `schedule`: rule resolution and set rotation
//! - `exec`: labels, worker commands, the destination sink, the executor
//! - `dispatch`: document discovery, ordering, the sequential sweep
//! - `notify`: operator hooks and mail
//! - `transport`: remote shell and local process seams
//! - `core`: domain types, errors, the run context
//! - `cli`: command-line interface
//!
//! # Example
//!
//! ```no_run
//! use rotab::core::RunContext;
//! use rotab::dispatch::{self, RunOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ctx = RunContext::new();
//!     let opts = RunOptions {
//!         config_dir: "/etc/rotab/archives".into(),
//!         archive: None,
//!     };
//!     let summary = dispatch::run(&ctx, &opts).await?;
//!     println!("{} archives completed", summary.completed());
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod archive;
pub mod cli;
pub mod core;
pub mod dispatch;
pub mod exec;
pub mod notify;
pub mod schedule;
pub mod transport;

pub use crate::archive::ArchiveRecord;
pub use crate::core::{Result, RotabError, Rule, RunContext, Status};
pub use crate::dispatch::{RunOptions, RunSummary};

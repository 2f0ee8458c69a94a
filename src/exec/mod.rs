//! The execution pipeline: labels, worker commands, the destination sink,
//! result parsing and the per-archive executor that ties them together.

pub mod executor;
pub mod label;
pub mod results;
pub mod sink;
pub mod worker;

pub use executor::{run_archive, ArchiveOutcome, ArchiveRun, TargetOutcome, TargetReport};
pub use sink::{Destination, Sink};

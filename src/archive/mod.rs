//! Archive records and their on-disk documents.

pub mod record;
pub mod store;

pub use record::{
    ArchiveRecord, ManagerSpec, Meta, Notifications, RunState, Schedule, SetCounters, StorageSpec,
    Targets, WorkerMap, WorkerPaths,
};
pub use store::{DocumentFormat, LEGACY_EXTENSION, YAML_EXTENSIONS};

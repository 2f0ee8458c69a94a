//! Scheduling: rule resolution and set rotation.

pub mod rotation;
pub mod rules;

pub use rotation::{advance, peek_next};
pub use rules::{can_do_monthly, incremental_reset, resolve_rule, state_file_plan, StateFilePlan};

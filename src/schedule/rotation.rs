//! The set-rotation state machine: a modular counter per rule over that
//! rule's pool of destination sets.
//!
//! The slot a run writes to is [`peek_next`] of the pre-run state;
//! [`advance`] commits exactly that slot, and is called once per archive,
//! only after every target succeeded. A failed run therefore retries the
//! same volume.

use crate::archive::record::ArchiveRecord;
use crate::core::types::Rule;

/// The slot the next run of `rule` will use: 0 for a never-used pool,
/// otherwise one past the last-used slot, modulo the pool size. `None`
/// when the rule has no pool.
pub fn peek_next(record: &ArchiveRecord, rule: Rule) -> Option<u32> {
    let total = record.storage.total_sets(rule);
    if total == 0 {
        return None;
    }
    Some(match record.state.current_set.get(rule) {
        None => 0,
        Some(current) => (current + 1) % total,
    })
}

/// Commit the rotation: `current_set[rule]` becomes the slot this run
/// used. Returns the committed slot.
pub fn advance(record: &mut ArchiveRecord, rule: Rule) -> Option<u32> {
    let next = peek_next(record, rule)?;
    record.state.current_set.set(rule, next);
    Some(next)
}

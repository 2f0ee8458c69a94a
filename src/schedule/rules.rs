//! Rule resolution: what tier, if any, an archive runs today, and what
//! incremental state maintenance that tier demands on the client.

use crate::archive::record::ArchiveRecord;
use crate::core::types::Rule;
use chrono::{Datelike, NaiveDate, Weekday};

/// Today's rule for an archive: the forced rule when the operator gave
/// one, otherwise the scheduled rule for the day of week.
pub fn resolve_rule(record: &ArchiveRecord, dow: Weekday, force: Option<Rule>) -> Rule {
    force.unwrap_or_else(|| record.schedule.rule_for(dow))
}

/// Monthly runs only in the first week of a calendar month.
pub fn can_do_monthly(day_of_month: u32) -> bool {
    (1..=7).contains(&day_of_month)
}

/// Whether an archive needs a fresh incremental base.
///
/// Archives whose schedule carries no monthly tier never get a scheduled
/// base snapshot, so their chain is re-rooted at month boundaries: reset
/// when there is no prior archive date, or when its month component
/// differs from today's.
pub fn incremental_reset(record: &ArchiveRecord, date: NaiveDate) -> bool {
    if record.schedule.has_monthly() {
        return false;
    }
    match record.state.archive_date {
        None => true,
        Some(last) => last.date_naive().month() != date.month(),
    }
}

/// Client-side state-file maintenance to perform before streaming.
///
/// The tiers chain: monthly is a fresh base, weekly references the
/// monthly state file, daily references the weekly one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StateFilePlan {
    /// Remove every tier's state file for the target.
    pub purge_all: bool,
    /// Remove these tiers' state files.
    pub purge: Vec<Rule>,
    /// Seed this tier's state file empty afterwards.
    pub seed: Option<Rule>,
}

impl StateFilePlan {
    pub fn is_noop(&self) -> bool {
        !self.purge_all && self.purge.is_empty() && self.seed.is_none()
    }
}

/// What the resolved rule requires of the incremental state files.
pub fn state_file_plan(rule: Rule, inc_reset: bool) -> StateFilePlan {
    match rule {
        // A new full base: everything goes, the monthly file starts empty.
        Rule::Monthly => StateFilePlan {
            purge_all: true,
            purge: Vec::new(),
            seed: Some(Rule::Monthly),
        },
        // Re-seed the reference base when the chain is being re-rooted.
        Rule::Weekly if inc_reset => StateFilePlan {
            purge_all: false,
            purge: vec![Rule::Monthly],
            seed: Some(Rule::Monthly),
        },
        Rule::Daily if inc_reset => StateFilePlan {
            purge_all: false,
            purge: vec![Rule::Weekly, Rule::Daily],
            seed: Some(Rule::Weekly),
        },
        _ => StateFilePlan::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::record::fixtures::record;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_schedule_drives_resolution() {
        let mut rec = record("prod");
        rec.schedule.wed = Rule::Daily;
        assert_eq!(resolve_rule(&rec, Weekday::Wed, None), Rule::Daily);
        assert_eq!(resolve_rule(&rec, Weekday::Thu, None), Rule::None);
    }

    #[test]
    fn test_force_overrides_schedule() {
        let mut rec = record("prod");
        rec.schedule.wed = Rule::Daily;
        assert_eq!(resolve_rule(&rec, Weekday::Wed, Some(Rule::Monthly)), Rule::Monthly);
    }

    #[test]
    fn test_monthly_window_is_first_week() {
        for day in 1..=7 {
            assert!(can_do_monthly(day), "day {} should allow monthly", day);
        }
        for day in [8, 14, 28, 31] {
            assert!(!can_do_monthly(day), "day {} should refuse monthly", day);
        }
    }

    #[test]
    fn test_monthly_tier_suppresses_reset() {
        let mut rec = record("prod");
        rec.schedule.sun = Rule::Monthly;
        rec.state.archive_date = None;
        assert!(!incremental_reset(&rec, NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()));
    }

    #[test]
    fn test_reset_on_missing_archive_date() {
        let mut rec = record("prod");
        rec.schedule.wed = Rule::Daily;
        rec.state.archive_date = None;
        assert!(incremental_reset(&rec, NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()));
    }

    #[test]
    fn test_reset_on_month_boundary() {
        let mut rec = record("prod");
        rec.schedule.wed = Rule::Daily;
        rec.state.archive_date = Some(Utc.with_ymd_and_hms(2025, 7, 30, 2, 0, 0).unwrap());

        assert!(incremental_reset(&rec, NaiveDate::from_ymd_opt(2025, 8, 2).unwrap()));
        assert!(!incremental_reset(&rec, NaiveDate::from_ymd_opt(2025, 7, 31).unwrap()));
    }

    #[test]
    fn test_monthly_plan_purges_everything() {
        let plan = state_file_plan(Rule::Monthly, false);
        assert!(plan.purge_all);
        assert_eq!(plan.seed, Some(Rule::Monthly));
    }

    #[test]
    fn test_weekly_reset_reseeds_base() {
        let plan = state_file_plan(Rule::Weekly, true);
        assert_eq!(plan.purge, vec![Rule::Monthly]);
        assert_eq!(plan.seed, Some(Rule::Monthly));
        assert!(state_file_plan(Rule::Weekly, false).is_noop());
    }

    #[test]
    fn test_daily_reset_purges_weekly_chain() {
        let plan = state_file_plan(Rule::Daily, true);
        assert!(plan.purge.contains(&Rule::Weekly));
        assert!(plan.purge.contains(&Rule::Daily));
        assert_eq!(plan.seed, Some(Rule::Weekly));
        assert!(state_file_plan(Rule::Daily, false).is_noop());
    }
}

//! Archive header labels: `<archive>::<host>:<path>-<rule>-<MM.DD.YYYY>`,
//! bounded in length so catalogue tooling stays happy.

use crate::core::types::{Rule, Target};
use chrono::NaiveDate;

/// Labels longer than this collapse the path to its final segment.
pub const MAX_LABEL_LEN: usize = 80;

/// Build the label for one target's archive header.
pub fn build(archive: &str, target: &Target, rule: Rule, date: NaiveDate) -> String {
    build_bounded(archive, target, rule, date, MAX_LABEL_LEN)
}

pub fn build_bounded(
    archive: &str,
    target: &Target,
    rule: Rule,
    date: NaiveDate,
    max_len: usize,
) -> String {
    let stamp = date.format("%m.%d.%Y");
    let full = format!("{}::{}:{}-{}-{}", archive, target.host, target.path, rule, stamp);
    if full.len() <= max_len {
        return full;
    }

    let last = target
        .path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(target.path.as_str());
    format!("{}::{}:{}-{}-{}", archive, target.host, last, rule, stamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(host: &str, path: &str) -> Target {
        Target {
            host: host.to_string(),
            path: path.to_string(),
        }
    }

    fn sep14() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 14).unwrap()
    }

    #[test]
    fn test_label_shape() {
        let label = build("prod", &target("h1", "/etc"), Rule::Daily, sep14());
        assert_eq!(label, "prod::h1:/etc-daily-09.14.2025");
    }

    #[test]
    fn test_long_paths_collapse_to_last_segment() {
        let t = target("db7", "/srv/postgres/clusters/reporting/base/tablespaces");
        let label = build_bounded("warehouse-nightly", &t, Rule::Weekly, sep14(), 60);
        assert_eq!(label, "warehouse-nightly::db7:tablespaces-weekly-09.14.2025");
        assert!(label.len() <= 60);
    }

    #[test]
    fn test_short_labels_keep_full_path() {
        let t = target("h1", "/var/lib/pgsql");
        let label = build("prod", &t, Rule::Monthly, sep14());
        assert!(label.contains("/var/lib/pgsql"));
    }

    #[test]
    fn test_root_path_survives_collapse() {
        let t = target("h1", "/");
        let label = build_bounded("x", &t, Rule::Daily, sep14(), 1);
        assert!(label.contains("::h1:"));
    }
}

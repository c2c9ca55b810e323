use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// Start of a trailing window of `days` days ending at `now`.
pub fn window_start(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - Duration::days(days)
}

/// ISO 8601 week key (week-based year, week number) for a calendar date.
///
/// Uses the standard Thursday rule via chrono, so dates around new year
/// land in the correct week-based year (e.g. 2024-12-30 is 2025-W01).
pub fn week_key(date: NaiveDate) -> (i32, u32) {
    let week = date.iso_week();
    (week.year(), week.week())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn monday_and_sunday_share_a_week() {
        // 2026-03-09 is a Monday, 2026-03-15 the following Sunday.
        assert_eq!(week_key(date("2026-03-09")), week_key(date("2026-03-15")));
        assert_ne!(week_key(date("2026-03-09")), week_key(date("2026-03-16")));
    }

    #[test]
    fn year_boundary_follows_thursday_rule() {
        // 2024-12-30 is a Monday whose Thursday falls in 2025.
        assert_eq!(week_key(date("2024-12-30")), (2025, 1));
    }

    #[test]
    fn window_start_subtracts_days() {
        let now = DateTime::parse_from_rfc3339("2026-03-10T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(window_start(now, 7).to_rfc3339(), "2026-03-03T12:00:00+00:00");
    }
}

//! Business-day arithmetic for escalation thresholds.

use chrono::{DateTime, Datelike, Utc, Weekday};

/// Count Monday–Friday calendar days in the inclusive range
/// `[start.date(), end.date()]`. Holiday-agnostic by design; a reversed
/// range counts as empty and yields 0.
pub fn business_days(start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    let mut current = start.date_naive();
    let end = end.date_naive();

    let mut count = 0;
    while current <= end {
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            count += 1;
        }
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    count
}

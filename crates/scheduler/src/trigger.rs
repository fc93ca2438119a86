//! Trigger evaluation: when a job's next firing instant falls.

use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike, Utc, Weekday};
use cron::Schedule;

/// When a job fires. Evaluated against explicit instants so the scheduler
/// can be driven deterministically in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Fire at `at` (UTC) on each of `days`.
    Weekly { days: Vec<Weekday>, at: NaiveTime },
    /// Fire at `at` (UTC) on the last calendar day of every month.
    MonthlyLastDay { at: NaiveTime },
}

impl Trigger {
    /// Convenience constructor for Monday–Friday triggers.
    pub fn weekdays_at(at: NaiveTime) -> Self {
        Trigger::Weekly {
            days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            at,
        }
    }

    /// The first scheduled instant strictly after `after`, or `None` for a
    /// trigger that can never fire (empty weekday set).
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Trigger::Weekly { days, at } => {
                let schedule = Schedule::from_str(&weekly_cron_expr(days, *at)?).ok()?;
                schedule.after(&after).next()
            }
            Trigger::MonthlyLastDay { at } => next_last_day_after(after, *at),
        }
    }

    /// Check if this trigger is due at `now`.
    ///
    /// Due iff a scheduled instant falls between `last_fired` (exclusive)
    /// and `now` (inclusive). If the trigger never fired, any instant
    /// within the last day counts — bounds catch-up after a restart.
    pub fn is_due(&self, now: DateTime<Utc>, last_fired: Option<DateTime<Utc>>) -> bool {
        let check_from = last_fired.unwrap_or(now - chrono::Duration::days(1));
        match self.next_after(check_from) {
            Some(next) => next <= now,
            None => false,
        }
    }
}

/// Render a weekday trigger as a 6-field cron expression
/// (`sec min hour day-of-month month day-of-week`) for the `cron` crate.
fn weekly_cron_expr(days: &[Weekday], at: NaiveTime) -> Option<String> {
    if days.is_empty() {
        return None;
    }
    let day_list = days
        .iter()
        .map(|d| weekday_name(*d))
        .collect::<Vec<_>>()
        .join(",");
    Some(format!(
        "{} {} {} * * {}",
        at.second(),
        at.minute(),
        at.hour(),
        day_list
    ))
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// The `cron` crate has no last-day-of-month token, so this is plain
/// calendar arithmetic: scan forward day by day (bounded by two months)
/// for a month-final date whose firing instant lies after `after`.
fn next_last_day_after(after: DateTime<Utc>, at: NaiveTime) -> Option<DateTime<Utc>> {
    let mut date = after.date_naive();
    for _ in 0..64 {
        if is_last_day_of_month(date) {
            let candidate = date.and_time(at).and_utc();
            if candidate > after {
                return Some(candidate);
            }
        }
        date = date.succ_opt()?;
    }
    None
}

fn is_last_day_of_month(date: NaiveDate) -> bool {
    match date.succ_opt() {
        Some(next) => next.month() != date.month(),
        None => true,
    }
}

// * Target day resolution
// * Works out which day a timetable email is for, from its subject and arrival time.

use crate::config::settings::ScheduleConfig;
use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, Timelike, Weekday};
use regex::Regex;
use std::sync::LazyLock;

static FOR_WEEKDAY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bfor\s+(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b")
        .expect("Invalid weekday regex")
});

/// Day a snapshot describes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDay {
    pub for_day: String,
    pub for_date: NaiveDate,
}

impl TargetDay {
    fn on(date: NaiveDate) -> Self {
        Self {
            for_day: date.format("%A").to_string(),
            for_date: date,
        }
    }
}

/// Weekday named by "... for Monday" in a subject line
pub fn subject_weekday(subject: &str) -> Option<Weekday> {
    FOR_WEEKDAY_PATTERN
        .captures(subject)
        .and_then(|caps| caps[1].parse::<Weekday>().ok())
}

/// First date on or after `from` that falls on `weekday`
pub fn next_on_or_after(from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let ahead = (7 + weekday.num_days_from_monday() - from.weekday().num_days_from_monday()) % 7;
    from.checked_add_days(Days::new(u64::from(ahead))).unwrap_or(from)
}

/// Resolves the target day.
///
/// A weekday named in the subject wins. Otherwise mail arriving at or after the
/// publish hour is for tomorrow, and earlier mail is for today.
pub fn resolve_target(
    subject: &str,
    received_at: DateTime<FixedOffset>,
    config: &ScheduleConfig,
) -> TargetDay {
    let local = received_at.with_timezone(&config.utc_offset);
    let today = local.date_naive();

    if let Some(weekday) = subject_weekday(subject) {
        return TargetDay::on(next_on_or_after(today, weekday));
    }

    if local.hour() >= config.next_day_available_hour {
        return TargetDay::on(today.succ_opt().unwrap_or(today));
    }

    TargetDay::on(today)
}

//! Month-relative date arithmetic.
//!
//! Pure search helpers that locate the next concrete date satisfying a
//! month-relative day selector: an absolute day of month (possibly counted
//! from the month's end) or the Nth/Nth-from-last weekday of a month. All
//! functions take the reference instant as a parameter; nothing in here
//! reads a clock.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};

use crate::error::{PickupError, PickupResult};

/// Canonical time precision for the engine is one minute; seconds and
/// sub-second components are dropped on input.
pub fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap()
}

/// Next date-time on or after `base` whose day of month matches `day`, at
/// `time_of_day`.
///
/// Positive `day` counts from the month's start; negative counts from its
/// end (-1 = last day). Months too short for the selector are skipped, so
/// day 31 from February resolves to March 31 rather than failing.
pub fn next_day_of_month(
    base: NaiveDateTime,
    day: i32,
    time_of_day: NaiveTime,
) -> PickupResult<NaiveDateTime> {
    if day == 0 || day.abs() > 31 {
        return Err(PickupError::InvalidArgument(format!(
            "day of month {day} out of range"
        )));
    }

    let time_of_day = truncate_to_minute(time_of_day);
    let (mut year, mut month) = (base.year(), base.month());

    // Every selector in -31..=31 lands within a few months (31/-31 need a
    // 31-day month), so walking forward always terminates.
    loop {
        let len = days_in_month(year, month) as i32;
        let concrete = if day > 0 { day } else { len + day + 1 };
        if concrete >= 1 && concrete <= len {
            let date = NaiveDate::from_ymd_opt(year, month, concrete as u32).unwrap();
            let candidate = date.and_time(time_of_day);
            if candidate >= base {
                return Ok(candidate);
            }
        }
        (year, month) = next_month(year, month);
    }
}

/// Next date-time on or after `base` that is the `week`-th occurrence of
/// `dow` in its month, at `time_of_day`.
///
/// Positive `week` counts occurrences from the month's start, negative from
/// its end. Months without that many occurrences (a 5th Saturday, say) are
/// skipped. Searches at most 12 months; week numbers are capped at ±5 and
/// always satisfiable within a year, so running out is a contract violation.
pub fn next_weekday_of_month(
    base: NaiveDateTime,
    dow: Weekday,
    week: i32,
    time_of_day: NaiveTime,
) -> PickupResult<NaiveDateTime> {
    if week == 0 || week.abs() > 5 {
        return Err(PickupError::InvalidArgument(format!(
            "week number {week} out of range"
        )));
    }

    let time_of_day = truncate_to_minute(time_of_day);
    let (mut year, mut month) = (base.year(), base.month());

    for _ in 0..12 {
        if let Some(date) = weekday_of_month(year, month, dow, week) {
            let candidate = date.and_time(time_of_day);
            if candidate >= base {
                return Ok(candidate);
            }
        }
        (year, month) = next_month(year, month);
    }

    Err(PickupError::NotFound(format!(
        "no occurrence of {dow} (week {week}) within 12 months of {base}"
    )))
}

/// The `week`-th occurrence of `dow` in the given month, or `None` if the
/// month does not contain that many occurrences.
pub(crate) fn weekday_of_month(year: i32, month: u32, dow: Weekday, week: i32) -> Option<NaiveDate> {
    let len = days_in_month(year, month);
    if week > 0 {
        let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
        let offset =
            (dow.num_days_from_monday() + 7 - first.weekday().num_days_from_monday()) % 7;
        let day = 1 + offset + (week as u32 - 1) * 7;
        (day <= len).then(|| NaiveDate::from_ymd_opt(year, month, day).unwrap())
    } else {
        let last = NaiveDate::from_ymd_opt(year, month, len).unwrap();
        let offset =
            (last.weekday().num_days_from_monday() + 7 - dow.num_days_from_monday()) % 7;
        let day = len as i32 - offset as i32 - (week.abs() - 1) * 7;
        (day >= 1).then(|| NaiveDate::from_ymd_opt(year, month, day as u32).unwrap())
    }
}

/// First date on or after `from` falling on `dow`.
pub(crate) fn next_on_weekday(from: NaiveDate, dow: Weekday) -> NaiveDate {
    let offset = (dow.num_days_from_monday() + 7 - from.weekday().num_days_from_monday()) % 7;
    from + Duration::days(offset as i64)
}

pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next) = next_month(year, month);
    NaiveDate::from_ymd_opt(next_year, next, 1)
        .unwrap()
        .pred_opt()
        .unwrap()
        .day()
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 { (year + 1, 1) } else { (year, month + 1) }
}

//! RRULE value text for the closed rule-shape set.
//!
//! Only the shapes the engine supports are produced or accepted:
//! `FREQ=WEEKLY[;INTERVAL=n];BYDAY=XX`, `FREQ=MONTHLY;BYMONTHDAY=n`, and
//! `FREQ=MONTHLY;BYDAY=<ordinal><XX>`. Anything else (COUNT, UNTIL, BYDAY
//! lists) is rejected at parse time so stored state stays inside the
//! supported set.

use chrono::Weekday;

use crate::error::{PickupError, PickupResult};
use crate::rule::RecurrenceRule;

pub fn to_rrule_day(dow: Weekday) -> &'static str {
    match dow {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

pub fn from_rrule_day(day: &str) -> Option<Weekday> {
    match day {
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        "SU" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Render a rule as an RRULE value. INTERVAL is omitted when 1, matching
/// the RFC default.
pub fn build_rrule(rule: &RecurrenceRule) -> String {
    match *rule {
        RecurrenceRule::Weekly {
            day_of_week,
            interval,
        } => {
            let mut parts = vec!["FREQ=WEEKLY".to_string()];
            if interval > 1 {
                parts.push(format!("INTERVAL={interval}"));
            }
            parts.push(format!("BYDAY={}", to_rrule_day(day_of_week)));
            parts.join(";")
        }
        RecurrenceRule::MonthlyByDay { day } => format!("FREQ=MONTHLY;BYMONTHDAY={day}"),
        RecurrenceRule::MonthlyByWeekday { day_of_week, week } => {
            format!("FREQ=MONTHLY;BYDAY={week}{}", to_rrule_day(day_of_week))
        }
    }
}

/// Parse an RRULE value back into one of the supported shapes.
pub fn parse_rrule(value: &str) -> PickupResult<RecurrenceRule> {
    let mut freq = None;
    let mut interval: u32 = 1;
    let mut byday = None;
    let mut bymonthday = None;

    for part in value.split(';') {
        let (key, val) = part.split_once('=').ok_or_else(|| {
            PickupError::IcsParse(format!("malformed RRULE part {part:?}"))
        })?;
        match key {
            "FREQ" => freq = Some(val),
            "INTERVAL" => {
                interval = val
                    .parse()
                    .map_err(|_| PickupError::IcsParse(format!("bad INTERVAL {val:?}")))?;
            }
            "BYDAY" => {
                if val.contains(',') {
                    return Err(PickupError::IcsParse(
                        "multiple BYDAY entries are not supported".into(),
                    ));
                }
                byday = Some(val);
            }
            "BYMONTHDAY" => {
                if val.contains(',') {
                    return Err(PickupError::IcsParse(
                        "multiple BYMONTHDAY entries are not supported".into(),
                    ));
                }
                bymonthday = Some(val.parse::<i32>().map_err(|_| {
                    PickupError::IcsParse(format!("bad BYMONTHDAY {val:?}"))
                })?);
            }
            other => {
                return Err(PickupError::IcsParse(format!(
                    "unsupported RRULE key {other:?}"
                )));
            }
        }
    }

    match freq {
        Some("WEEKLY") => {
            let day = byday
                .ok_or_else(|| PickupError::IcsParse("WEEKLY rule without BYDAY".into()))?;
            let dow = from_rrule_day(day)
                .ok_or_else(|| PickupError::IcsParse(format!("bad BYDAY {day:?}")))?;
            RecurrenceRule::weekly(dow, interval)
                .map_err(|e| PickupError::IcsParse(e.to_string()))
        }
        Some("MONTHLY") => {
            if let Some(day) = bymonthday {
                return RecurrenceRule::monthly_by_day(day)
                    .map_err(|e| PickupError::IcsParse(e.to_string()));
            }
            let day = byday.ok_or_else(|| {
                PickupError::IcsParse("MONTHLY rule without BYDAY or BYMONTHDAY".into())
            })?;
            parse_ordinal_byday(day)
        }
        other => Err(PickupError::IcsParse(format!(
            "unsupported FREQ {other:?}"
        ))),
    }
}

/// "-1FR" / "2TU": a signed ordinal followed by a two-letter weekday.
fn parse_ordinal_byday(value: &str) -> PickupResult<RecurrenceRule> {
    if value.len() < 3 {
        return Err(PickupError::IcsParse(format!(
            "bad ordinal BYDAY {value:?}"
        )));
    }
    let (ordinal, day) = value.split_at(value.len() - 2);
    let week: i32 = ordinal
        .parse()
        .map_err(|_| PickupError::IcsParse(format!("bad ordinal BYDAY {value:?}")))?;
    let dow = from_rrule_day(day)
        .ok_or_else(|| PickupError::IcsParse(format!("bad BYDAY {day:?}")))?;
    RecurrenceRule::monthly_by_weekday(dow, week).map_err(|e| PickupError::IcsParse(e.to_string()))
}

//! Recurrence rule shapes and per-rule operations.
//!
//! The engine supports a closed set of shapes: weekly on one weekday (with
//! an interval, so "every other Friday" is expressible), monthly on a day of
//! month (counted from either end), and monthly on the Nth/Nth-from-last
//! weekday. Each rule instance carries exactly one day selector.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::datemath;
use crate::error::{PickupError, PickupResult};

/// One recurrence shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecurrenceRule {
    /// Every `interval` weeks on `day_of_week`. The anchor of the owning
    /// event decides which week is "week zero" when `interval > 1`.
    Weekly { day_of_week: Weekday, interval: u32 },
    /// On a day of the month: positive counts from the start, negative from
    /// the end (-1 = last day).
    MonthlyByDay { day: i32 },
    /// On the `week`-th occurrence of `day_of_week` in the month; negative
    /// counts occurrences from the month's end.
    MonthlyByWeekday { day_of_week: Weekday, week: i32 },
}

/// The deletion/matching key for a rule. Mirrors the rule shapes, since
/// every rule carries a single selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selector {
    Weekly { day_of_week: Weekday, interval: u32 },
    MonthlyByDay { day: i32 },
    MonthlyByWeekday { day_of_week: Weekday, week: i32 },
}

/// Result of removing a selector from a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// The rule does not contain the selector.
    NotFound,
    /// The selector was removed and the rule has nothing left; the owning
    /// event should drop it.
    RemovedRuleNowEmpty,
    /// The selector was removed and the rule still carries entries. Not
    /// produced while rules hold a single selector; kept so call sites stay
    /// exhaustive if multi-selector rules are ever needed.
    RemovedRuleStillHasEntries,
}

impl RecurrenceRule {
    pub fn weekly(day_of_week: Weekday, interval: u32) -> PickupResult<Self> {
        if interval == 0 {
            return Err(PickupError::InvalidArgument(
                "weekly interval must be at least 1".into(),
            ));
        }
        Ok(RecurrenceRule::Weekly {
            day_of_week,
            interval,
        })
    }

    pub fn monthly_by_day(day: i32) -> PickupResult<Self> {
        if day == 0 || day.abs() > 31 {
            return Err(PickupError::InvalidArgument(format!(
                "day of month {day} out of range"
            )));
        }
        Ok(RecurrenceRule::MonthlyByDay { day })
    }

    pub fn monthly_by_weekday(day_of_week: Weekday, week: i32) -> PickupResult<Self> {
        if week == 0 || week.abs() > 5 {
            return Err(PickupError::InvalidArgument(format!(
                "week number {week} out of range"
            )));
        }
        Ok(RecurrenceRule::MonthlyByWeekday { day_of_week, week })
    }

    /// Whether this rule recurs weekly (as opposed to monthly). Duplicate
    /// detection only compares rules within the same frequency class.
    pub fn is_weekly(&self) -> bool {
        matches!(self, RecurrenceRule::Weekly { .. })
    }

    pub fn selector(&self) -> Selector {
        match *self {
            RecurrenceRule::Weekly {
                day_of_week,
                interval,
            } => Selector::Weekly {
                day_of_week,
                interval,
            },
            RecurrenceRule::MonthlyByDay { day } => Selector::MonthlyByDay { day },
            RecurrenceRule::MonthlyByWeekday { day_of_week, week } => {
                Selector::MonthlyByWeekday { day_of_week, week }
            }
        }
    }

    /// Earliest occurrence of this rule on or after `after`.
    ///
    /// The anchor supplies the canonical time of day and, for weekly rules
    /// with `interval > 1`, the phase: occurrences fall only on weeks a
    /// whole multiple of `interval` away from the anchor's week.
    pub fn next_occurrence(
        &self,
        anchor: NaiveDateTime,
        after: NaiveDateTime,
    ) -> PickupResult<NaiveDateTime> {
        let time_of_day = datemath::truncate_to_minute(anchor.time());
        match *self {
            RecurrenceRule::Weekly {
                day_of_week,
                interval,
            } => Ok(next_weekly(
                anchor.date(),
                day_of_week,
                interval,
                time_of_day,
                after,
            )),
            RecurrenceRule::MonthlyByDay { day } => {
                datemath::next_day_of_month(after, day, time_of_day)
            }
            RecurrenceRule::MonthlyByWeekday { day_of_week, week } => {
                datemath::next_weekday_of_month(after, day_of_week, week, time_of_day)
            }
        }
    }

    /// Structural match used during deletion. Weekly selectors also compare
    /// the interval, so deleting "every other Friday" leaves a plain weekly
    /// Friday rule alone.
    pub fn matches_selector(&self, selector: &Selector) -> bool {
        self.selector() == *selector
    }

    pub fn remove_selector(&mut self, selector: &Selector) -> RemovalOutcome {
        if self.matches_selector(selector) {
            // A rule holds exactly one selector, so a hit always empties it.
            RemovalOutcome::RemovedRuleNowEmpty
        } else {
            RemovalOutcome::NotFound
        }
    }
}

/// Weekly search: first `dow` on or after `after` at `time_of_day`, pushed
/// out to the next phase-aligned week when `interval > 1`.
fn next_weekly(
    anchor_date: NaiveDate,
    dow: Weekday,
    interval: u32,
    time_of_day: NaiveTime,
    after: NaiveDateTime,
) -> NaiveDateTime {
    // The anchor's first on-or-after occurrence of `dow` is week zero.
    let phase_start = datemath::next_on_weekday(anchor_date, dow);

    let mut date = datemath::next_on_weekday(after.date(), dow);
    if date.and_time(time_of_day) < after {
        date += Duration::days(7);
    }
    if date < phase_start {
        date = phase_start;
    }

    let span = i64::from(interval) * 7;
    let off = (date - phase_start).num_days() % span;
    if off != 0 {
        date += Duration::days(span - off);
    }

    date.and_time(time_of_day)
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            RecurrenceRule::Weekly {
                day_of_week,
                interval: 1,
            } => write!(f, "every {day_of_week}"),
            RecurrenceRule::Weekly {
                day_of_week,
                interval,
            } => write!(f, "every {interval} weeks on {day_of_week}"),
            RecurrenceRule::MonthlyByDay { day } if day > 0 => {
                write!(f, "monthly on day {day}")
            }
            RecurrenceRule::MonthlyByDay { day } => {
                write!(f, "monthly on the {}. day from the end", -day)
            }
            RecurrenceRule::MonthlyByWeekday { day_of_week, week } if week > 0 => {
                write!(f, "monthly on the {week}. {day_of_week}")
            }
            RecurrenceRule::MonthlyByWeekday { day_of_week, week } => {
                write!(f, "monthly on the {}. {day_of_week} from the end", -week)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_weekly_next_occurrence() {
        // Trash anchored Tuesday 2017-01-31 07:30, every week.
        let rule = RecurrenceRule::weekly(Weekday::Tue, 1).unwrap();
        let next = rule
            .next_occurrence(dt(2017, 1, 31, 7, 30), dt(2017, 2, 1, 0, 0))
            .unwrap();
        assert_eq!(next, dt(2017, 2, 7, 7, 30));
    }

    #[test]
    fn test_weekly_same_day_before_pickup_time() {
        let rule = RecurrenceRule::weekly(Weekday::Tue, 1).unwrap();
        let next = rule
            .next_occurrence(dt(2017, 1, 31, 7, 30), dt(2017, 2, 7, 7, 0))
            .unwrap();
        assert_eq!(next, dt(2017, 2, 7, 7, 30));
    }

    #[test]
    fn test_weekly_same_day_after_pickup_time() {
        let rule = RecurrenceRule::weekly(Weekday::Tue, 1).unwrap();
        let next = rule
            .next_occurrence(dt(2017, 1, 31, 7, 30), dt(2017, 2, 7, 8, 0))
            .unwrap();
        assert_eq!(next, dt(2017, 2, 14, 7, 30));
    }

    #[test]
    fn test_biweekly_phase_from_anchor() {
        // Recycling anchored Friday 2017-02-03 07:30, every other week.
        // From Wednesday 2017-02-08 the intervening Friday (the 10th) is off
        // phase; the 17th is two weeks after the anchor.
        let rule = RecurrenceRule::weekly(Weekday::Fri, 2).unwrap();
        let next = rule
            .next_occurrence(dt(2017, 2, 3, 7, 30), dt(2017, 2, 8, 10, 27))
            .unwrap();
        assert_eq!(next, dt(2017, 2, 17, 7, 30));
    }

    #[test]
    fn test_biweekly_opposite_phase() {
        // Anchored one week later, the same query lands on the 10th.
        let rule = RecurrenceRule::weekly(Weekday::Fri, 2).unwrap();
        let next = rule
            .next_occurrence(dt(2017, 2, 10, 7, 30), dt(2017, 2, 8, 10, 27))
            .unwrap();
        assert_eq!(next, dt(2017, 2, 10, 7, 30));
    }

    #[test]
    fn test_weekly_anchor_in_the_future() {
        // Querying before the anchor's first occurrence returns that first
        // occurrence, not an earlier phase-aligned week.
        let rule = RecurrenceRule::weekly(Weekday::Fri, 2).unwrap();
        let next = rule
            .next_occurrence(dt(2017, 2, 10, 7, 30), dt(2017, 2, 1, 0, 0))
            .unwrap();
        assert_eq!(next, dt(2017, 2, 10, 7, 30));
    }

    #[test]
    fn test_monthly_by_day_uses_anchor_time() {
        let rule = RecurrenceRule::monthly_by_day(-1).unwrap();
        let next = rule
            .next_occurrence(dt(2017, 1, 31, 12, 0), dt(2017, 2, 1, 0, 0))
            .unwrap();
        assert_eq!(next, dt(2017, 2, 28, 12, 0));
    }

    #[test]
    fn test_monthly_by_weekday_delegates() {
        let rule = RecurrenceRule::monthly_by_weekday(Weekday::Sat, 5).unwrap();
        let next = rule
            .next_occurrence(dt(2017, 1, 1, 9, 0), dt(2017, 2, 1, 0, 0))
            .unwrap();
        assert_eq!(next, dt(2017, 4, 29, 9, 0));
    }

    #[test]
    fn test_constructor_rejects_bad_values() {
        assert!(RecurrenceRule::weekly(Weekday::Mon, 0).is_err());
        assert!(RecurrenceRule::monthly_by_day(0).is_err());
        assert!(RecurrenceRule::monthly_by_day(32).is_err());
        assert!(RecurrenceRule::monthly_by_weekday(Weekday::Mon, 0).is_err());
        assert!(RecurrenceRule::monthly_by_weekday(Weekday::Mon, 6).is_err());
    }

    #[test]
    fn test_remove_matching_selector_empties_rule() {
        let mut rule = RecurrenceRule::weekly(Weekday::Fri, 2).unwrap();
        let outcome = rule.remove_selector(&Selector::Weekly {
            day_of_week: Weekday::Fri,
            interval: 2,
        });
        assert_eq!(outcome, RemovalOutcome::RemovedRuleNowEmpty);
    }

    #[test]
    fn test_remove_selector_interval_mismatch() {
        let mut rule = RecurrenceRule::weekly(Weekday::Fri, 2).unwrap();
        let outcome = rule.remove_selector(&Selector::Weekly {
            day_of_week: Weekday::Fri,
            interval: 1,
        });
        assert_eq!(outcome, RemovalOutcome::NotFound);
    }

    #[test]
    fn test_remove_selector_cross_shape() {
        let mut rule = RecurrenceRule::monthly_by_day(15).unwrap();
        let outcome = rule.remove_selector(&Selector::MonthlyByWeekday {
            day_of_week: Weekday::Mon,
            week: 3,
        });
        assert_eq!(outcome, RemovalOutcome::NotFound);
    }
}

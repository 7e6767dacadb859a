//! Cross-event reduction to "next occurrence per pickup name".

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::calendar::Calendar;
use crate::event::normalize_name;

/// Earliest upcoming occurrence for every pickup name on the calendar.
///
/// A name carried by several events (trash on Tuesday and on Friday) reduces
/// to whichever occurrence comes first. Returned as a BTreeMap so iteration
/// order is deterministic for rendering.
pub fn next_occurrences(
    calendar: &Calendar,
    after: NaiveDateTime,
) -> BTreeMap<String, NaiveDateTime> {
    let mut next: BTreeMap<String, NaiveDateTime> = BTreeMap::new();
    for event in calendar.events() {
        let Some(occurrence) = event.earliest_next_occurrence(after) else {
            continue;
        };
        next.entry(event.name.clone())
            .and_modify(|current| {
                if occurrence < *current {
                    *current = occurrence;
                }
            })
            .or_insert(occurrence);
    }
    next
}

/// Earliest upcoming occurrence for a single pickup name, or `None` if the
/// name has no events.
pub fn next_occurrence(
    calendar: &Calendar,
    after: NaiveDateTime,
    name: &str,
) -> Option<NaiveDateTime> {
    let name = normalize_name(name);
    calendar
        .events()
        .iter()
        .filter(|event| event.name == name)
        .filter_map(|event| event.earliest_next_occurrence(after))
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RecurrenceRule;
    use chrono::{NaiveDate, Weekday};

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn sample_calendar(now: NaiveDateTime) -> Calendar {
        let mut calendar = Calendar::new();
        calendar
            .add(
                now,
                "trash",
                dt(2017, 1, 31, 6, 30),
                RecurrenceRule::weekly(Weekday::Tue, 1).unwrap(),
            )
            .unwrap();
        calendar
            .add(
                now,
                "trash",
                dt(2017, 2, 3, 6, 30),
                RecurrenceRule::weekly(Weekday::Fri, 1).unwrap(),
            )
            .unwrap();
        calendar
            .add(
                now,
                "mortgage",
                dt(2017, 1, 1, 9, 0),
                RecurrenceRule::monthly_by_day(1).unwrap(),
            )
            .unwrap();
        calendar
    }

    #[test]
    fn test_all_names_reduction() {
        let now = dt(2017, 2, 1, 0, 0);
        let occurrences = next_occurrences(&sample_calendar(now), now);

        assert_eq!(occurrences.len(), 2);
        assert_eq!(occurrences.get("trash"), Some(&dt(2017, 2, 3, 6, 30)));
        assert_eq!(occurrences.get("mortgage"), Some(&dt(2017, 2, 1, 9, 0)));
    }

    #[test]
    fn test_single_name_folds_case() {
        let now = dt(2017, 2, 1, 0, 0);
        let calendar = sample_calendar(now);

        assert_eq!(
            next_occurrence(&calendar, now, " Trash "),
            Some(dt(2017, 2, 3, 6, 30))
        );
        assert_eq!(next_occurrence(&calendar, now, "compost"), None);
    }

    #[test]
    fn test_empty_calendar_yields_empty_map() {
        let now = dt(2017, 2, 1, 0, 0);
        assert!(next_occurrences(&Calendar::new(), now).is_empty());
    }
}

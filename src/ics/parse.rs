//! ICS parsing using the icalendar crate's parser.

use chrono::NaiveDateTime;
use icalendar::parser::{read_calendar, unfold};

use crate::calendar::Calendar;
use crate::error::{PickupError, PickupResult};
use crate::event::PickupEvent;
use crate::ics::rrule::parse_rrule;

/// Parse stored VCALENDAR text back into a pickup calendar.
///
/// Every VEVENT must carry SUMMARY, DTSTART and at least one supported
/// RRULE; anything else means the stored text is corrupt and the whole parse
/// fails rather than silently dropping events.
pub fn parse_calendar(content: &str) -> PickupResult<Calendar> {
    let unfolded = unfold(content);
    let parsed =
        read_calendar(&unfolded).map_err(|e| PickupError::IcsParse(e.to_string()))?;

    let mut calendar = Calendar::new();
    for vevent in parsed.components.iter().filter(|c| c.name == "VEVENT") {
        let name = vevent
            .find_prop("SUMMARY")
            .map(|p| p.val.to_string())
            .ok_or_else(|| PickupError::IcsParse("VEVENT without SUMMARY".into()))?;

        let anchor = vevent
            .find_prop("DTSTART")
            .map(|p| parse_floating_datetime(p.val.as_ref()))
            .ok_or_else(|| PickupError::IcsParse(format!("event {name:?} has no DTSTART")))??;

        let rules = vevent
            .properties
            .iter()
            .filter(|p| p.name == "RRULE")
            .map(|p| parse_rrule(p.val.as_ref()))
            .collect::<PickupResult<Vec<_>>>()?;
        if rules.is_empty() {
            return Err(PickupError::IcsParse(format!(
                "event {name:?} has no RRULE"
            )));
        }

        calendar.push_event(PickupEvent::new(&name, anchor, rules));
    }

    Ok(calendar)
}

/// The engine stores floating local datetimes; a trailing Z from foreign
/// producers is tolerated and ignored.
fn parse_floating_datetime(value: &str) -> PickupResult<NaiveDateTime> {
    let trimmed = value.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(trimmed, "%Y%m%dT%H%M%S")
        .map_err(|_| PickupError::IcsParse(format!("bad DTSTART {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ics::generate_ics;
    use crate::rule::RecurrenceRule;
    use chrono::{NaiveDate, Weekday};

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_minimal_calendar() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:PICKUPCAL\r\n\
BEGIN:VEVENT\r\n\
UID:trash-20170131T0730@pickupcal\r\n\
SUMMARY:trash\r\n\
DTSTART:20170131T073000\r\n\
RRULE:FREQ=WEEKLY;BYDAY=TU\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let calendar = parse_calendar(ics).expect("should parse");
        assert_eq!(calendar.events().len(), 1);

        let event = &calendar.events()[0];
        assert_eq!(event.name, "trash");
        assert_eq!(event.anchor, dt(2017, 1, 31, 7, 30));
        assert_eq!(
            event.rules,
            vec![RecurrenceRule::weekly(Weekday::Tue, 1).unwrap()]
        );
    }

    #[test]
    fn test_parse_multiple_rrules_on_one_event() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:PICKUPCAL\r\n\
BEGIN:VEVENT\r\n\
UID:trash-20170131T0630@pickupcal\r\n\
SUMMARY:trash\r\n\
DTSTART:20170131T063000\r\n\
RRULE:FREQ=WEEKLY;BYDAY=TU\r\n\
RRULE:FREQ=WEEKLY;BYDAY=FR\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let calendar = parse_calendar(ics).expect("should parse");
        assert_eq!(calendar.events()[0].rules.len(), 2);
    }

    #[test]
    fn test_round_trip_preserves_calendar() {
        let now = dt(2017, 2, 1, 0, 0);
        let mut calendar = Calendar::new();
        calendar
            .add(
                now,
                "trash",
                dt(2017, 1, 31, 7, 30),
                RecurrenceRule::weekly(Weekday::Tue, 1).unwrap(),
            )
            .unwrap();
        calendar
            .add(
                now,
                "recycling",
                dt(2017, 2, 3, 7, 30),
                RecurrenceRule::weekly(Weekday::Fri, 2).unwrap(),
            )
            .unwrap();
        calendar
            .add(
                now,
                "mortgage",
                dt(2017, 1, 1, 9, 0),
                RecurrenceRule::monthly_by_day(-1).unwrap(),
            )
            .unwrap();
        calendar
            .add(
                now,
                "street sweeping",
                dt(2017, 1, 7, 8, 0),
                RecurrenceRule::monthly_by_weekday(Weekday::Sat, 1).unwrap(),
            )
            .unwrap();

        let ics = generate_ics(&calendar).unwrap().expect("non-empty output");
        let parsed = parse_calendar(&ics).expect("should reparse");
        assert_eq!(parsed, calendar);
    }

    #[test]
    fn test_unparseable_text_is_rejected() {
        assert!(parse_calendar("not a calendar at all").is_err());
    }

    #[test]
    fn test_event_without_rrule_is_rejected() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:PICKUPCAL\r\n\
BEGIN:VEVENT\r\n\
UID:x@pickupcal\r\n\
SUMMARY:trash\r\n\
DTSTART:20170131T073000\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let err = parse_calendar(ics).unwrap_err();
        assert!(matches!(err, PickupError::IcsParse(_)));
    }

    #[test]
    fn test_event_with_bad_dtstart_is_rejected() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:PICKUPCAL\r\n\
BEGIN:VEVENT\r\n\
UID:x@pickupcal\r\n\
SUMMARY:trash\r\n\
DTSTART:tomorrow\r\n\
RRULE:FREQ=WEEKLY;BYDAY=TU\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        assert!(parse_calendar(ics).is_err());
    }
}

//! ICS generation using the icalendar crate.

use icalendar::{Calendar as IcsCalendar, Component, EventLike, Property};

use crate::calendar::Calendar;
use crate::error::PickupResult;
use crate::event::PickupEvent;
use crate::ics::rrule::build_rrule;

/// Generate VCALENDAR text for storage.
///
/// Returns `None` for an empty calendar: nothing is written, and the stored
/// attribute is cleared instead of holding an event-less VCALENDAR.
pub fn generate_ics(calendar: &Calendar) -> PickupResult<Option<String>> {
    if calendar.is_empty() {
        return Ok(None);
    }

    let mut cal = IcsCalendar::new();
    for event in calendar.events() {
        cal.push(event_to_vevent(event));
    }
    let cal = cal.done();

    // Post-process to remove unnecessary bloat from the icalendar crate's output
    Ok(Some(strip_ics_bloat(&cal.to_string())))
}

fn event_to_vevent(event: &PickupEvent) -> icalendar::Event {
    let mut vevent = icalendar::Event::new();
    vevent.uid(&event_uid(event));
    vevent.summary(&event.name);

    // DTSTAMP is required by RFC 5545. Derive it from the anchor rather
    // than the wall clock so output is a pure function of calendar state.
    vevent.add_property("DTSTAMP", event.anchor.format("%Y%m%dT%H%M%SZ").to_string());

    // Floating local datetime; the engine is timezone-naive and the caller
    // owns localization.
    vevent.add_property("DTSTART", event.anchor.format("%Y%m%dT%H%M%S").to_string());

    // RRULE can appear once per rule (multi-property, like EXDATE).
    for rule in &event.rules {
        vevent.append_multi_property(Property::new("RRULE", build_rrule(rule)));
    }

    vevent.done()
}

/// Deterministic UID so stored text is stable across requests and safe to
/// diff. Name plus anchor uniquely identifies an event: same-name events
/// always differ in anchor date or time.
fn event_uid(event: &PickupEvent) -> String {
    format!(
        "{}-{}@pickupcal",
        event.name.replace(char::is_whitespace, "-"),
        event.anchor.format("%Y%m%dT%H%M")
    )
}

/// Clean up ICS output from the icalendar crate
/// - Replace PRODID with PICKUPCAL (we post-process the output)
/// - Remove CALSCALE:GREGORIAN (it's the default)
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:PICKUPCAL\r\n");
            continue;
        }
        if line == "CALSCALE:GREGORIAN" {
            continue;
        }
        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}

//! ICS generation and parsing for calendar storage.
//!
//! The stored form is RFC 5545 VCALENDAR text: one VEVENT per pickup event,
//! with SUMMARY carrying the name, a floating DTSTART carrying the anchor,
//! and one RRULE per recurrence rule.

mod generate;
mod parse;
pub mod rrule;

pub use generate::generate_ics;
pub use parse::parse_calendar;

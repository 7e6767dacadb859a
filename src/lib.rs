//! Recurrence engine for recurring pickup schedules.
//!
//! This crate owns the calendar of named recurring "pickups" (trash day,
//! recycling, mortgage due date): the closed set of recurrence rule shapes,
//! the date arithmetic that finds their next concrete occurrences, the
//! phase-aware duplicate detection applied when rules are added, and the
//! ICS text round-trip used for storage.
//!
//! It deliberately does no I/O and reads no clocks: every query and
//! mutation takes its reference instant as a parameter, so callers own
//! persistence, localization, and "now".

pub mod calendar;
pub mod datemath;
pub mod error;
pub mod event;
pub mod ics;
pub mod rule;
pub mod schedule;

// Re-export the engine surface at the crate root for convenience
pub use calendar::Calendar;
pub use error::{PickupError, PickupResult};
pub use event::PickupEvent;
pub use ics::{generate_ics, parse_calendar};
pub use rule::{RecurrenceRule, RemovalOutcome, Selector};

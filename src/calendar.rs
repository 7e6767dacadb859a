//! The pickup calendar: an unordered collection of pickup events.
//!
//! A calendar is built empty or deserialized from stored text at the start
//! of a request, mutated in place, and re-serialized by the caller. It is
//! exclusively owned by one request; there is no interior locking and no
//! clock access, the reference instant is always a parameter.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::datemath;
use crate::error::{PickupError, PickupResult};
use crate::event::{PickupEvent, normalize_name};
use crate::rule::{RecurrenceRule, Selector};
use crate::schedule;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Calendar {
    events: Vec<PickupEvent>,
}

impl Calendar {
    pub fn new() -> Self {
        Calendar { events: Vec::new() }
    }

    pub fn events(&self) -> &[PickupEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Used by the deserializer, which restores events verbatim without
    /// re-running duplicate detection.
    pub(crate) fn push_event(&mut self, event: PickupEvent) {
        self.events.push(event);
    }

    /// Add a single-rule pickup, unless an equivalent schedule already
    /// exists under the same name. Returns whether the calendar changed.
    ///
    /// `now` is the reference instant for the phase comparison in duplicate
    /// detection; two biweekly rules on the same weekday only merge when
    /// their next occurrences from `now` coincide.
    pub fn add(
        &mut self,
        now: NaiveDateTime,
        name: &str,
        anchor: NaiveDateTime,
        rule: RecurrenceRule,
    ) -> PickupResult<bool> {
        if name.trim().is_empty() {
            return Err(PickupError::InvalidName(name.to_string()));
        }

        let candidate = PickupEvent::new(name, anchor, vec![rule]);
        let duplicate = self
            .events
            .iter()
            .any(|existing| existing.is_duplicate_of(&candidate, now));
        if duplicate {
            debug!(name = %candidate.name, "skipped duplicate pickup rule");
            return Ok(false);
        }

        debug!(name = %candidate.name, anchor = %candidate.anchor, "added pickup rule");
        self.events.push(candidate);
        Ok(true)
    }

    /// Remove `selector` from every same-name pickup whose canonical
    /// time-of-day matches, destroying events left without rules. Returns
    /// how many events had a removal applied.
    ///
    /// A biweekly delete request deliberately matches both phase variants
    /// under the same name/day/time (and so may return 2): the caller does
    /// not need to know which phase is currently active.
    pub fn delete_by_selector(
        &mut self,
        name: &str,
        selector: &Selector,
        time_of_day: NaiveTime,
    ) -> usize {
        let name = normalize_name(name);
        let time_of_day = datemath::truncate_to_minute(time_of_day);

        let mut removed = 0;
        for event in &mut self.events {
            if event.name == name
                && event.time_of_day() == time_of_day
                && event.remove_selector(selector)
            {
                removed += 1;
            }
        }
        self.events.retain(PickupEvent::has_rules);

        if removed > 0 {
            debug!(%name, removed, "deleted pickup selector");
        }
        removed
    }

    /// Remove every pickup with the given name. Returns whether anything
    /// was removed.
    pub fn delete_entire_name(&mut self, name: &str) -> bool {
        let name = normalize_name(name);
        let before = self.events.len();
        self.events.retain(|event| event.name != name);
        let removed = before - self.events.len();
        if removed > 0 {
            debug!(%name, removed, "deleted pickup");
        }
        removed > 0
    }

    /// Empty the calendar. Returns whether it held anything beforehand.
    pub fn delete_all(&mut self) -> bool {
        let had_events = !self.events.is_empty();
        self.events.clear();
        if had_events {
            debug!("cleared calendar");
        }
        had_events
    }

    /// Earliest upcoming occurrence per pickup name.
    pub fn next_occurrences(&self, after: NaiveDateTime) -> BTreeMap<String, NaiveDateTime> {
        schedule::next_occurrences(self, after)
    }

    /// Earliest upcoming occurrence for one pickup name.
    pub fn next_occurrence(&self, after: NaiveDateTime, name: &str) -> Option<NaiveDateTime> {
        schedule::next_occurrence(self, after, name)
    }
}

impl PartialEq for Calendar {
    /// Calendars are equal when they hold the same set of events; insertion
    /// order is not observable. Duplicate detection keeps stored events
    /// distinct, so containment in both directions reduces to length plus
    /// one-sided containment.
    fn eq(&self, other: &Self) -> bool {
        self.events.len() == other.events.len()
            && self.events.iter().all(|event| other.events.contains(event))
    }
}

//! A named pickup: an anchor date-time plus its recurrence rules.

use std::fmt;

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::datemath;
use crate::rule::{RecurrenceRule, RemovalOutcome, Selector};

/// Canonical form for pickup names: trimmed and case-folded, so "Trash",
/// " trash " and "TRASH" group the same schedule.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// One named recurring pickup.
///
/// Several `PickupEvent`s may share a name (trash on Tuesday and on Friday
/// are separate instances with separate anchors); queries reduce them per
/// name. An event without rules is destroyed by its owner, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupEvent {
    pub name: String,
    /// Seeds month/week-relative math; its time-of-day is canonical for the
    /// event. Truncated to minute precision at construction.
    pub anchor: NaiveDateTime,
    pub rules: Vec<RecurrenceRule>,
}

impl PickupEvent {
    pub fn new(name: &str, anchor: NaiveDateTime, rules: Vec<RecurrenceRule>) -> Self {
        PickupEvent {
            name: normalize_name(name),
            anchor: anchor
                .date()
                .and_time(datemath::truncate_to_minute(anchor.time())),
            rules,
        }
    }

    /// The event's canonical pickup time.
    pub fn time_of_day(&self) -> NaiveTime {
        self.anchor.time()
    }

    pub fn has_rules(&self) -> bool {
        !self.rules.is_empty()
    }

    /// Phase-aware duplicate check against a single-rule candidate.
    ///
    /// The candidate is a duplicate only when its rule's selector is already
    /// covered here (same frequency class, same interval for weekly rules)
    /// AND both schedules produce the identical next occurrence from `now`.
    /// The occurrence comparison is what keeps two biweekly Friday rules
    /// anchored a week apart separate: both read "Friday, every 2 weeks",
    /// but they are different schedules.
    pub fn is_duplicate_of(&self, candidate: &PickupEvent, now: NaiveDateTime) -> bool {
        if self.name != candidate.name {
            return false;
        }
        // Dedup checks only ever receive single-rule candidates.
        let rule = match candidate.rules.as_slice() {
            [rule] => rule,
            _ => return false,
        };

        self.rules.iter().any(|existing| {
            if existing.is_weekly() != rule.is_weekly() {
                return false;
            }
            if !existing.matches_selector(&rule.selector()) {
                return false;
            }
            // Same selector on both sides, so evaluating the existing rule
            // from our own anchor is the "synthetic rule" of the matching
            // algorithm. Equal next occurrences mean equal phase and time.
            let ours = existing.next_occurrence(self.anchor, now);
            let theirs = rule.next_occurrence(candidate.anchor, now);
            matches!((ours, theirs), (Ok(a), Ok(b)) if a == b)
        })
    }

    /// Minimum next occurrence over all rules, or `None` for a rule-less
    /// event (which should already have been destroyed).
    pub fn earliest_next_occurrence(&self, after: NaiveDateTime) -> Option<NaiveDateTime> {
        self.rules
            .iter()
            .filter_map(|rule| rule.next_occurrence(self.anchor, after).ok())
            .min()
    }

    /// Remove every rule matching `selector`, dropping rules that become
    /// empty. Returns whether anything was removed.
    pub fn remove_selector(&mut self, selector: &Selector) -> bool {
        let before = self.rules.len();
        self.rules
            .retain_mut(|rule| rule.remove_selector(selector) != RemovalOutcome::RemovedRuleNowEmpty);
        before != self.rules.len()
    }
}

impl fmt::Display for PickupEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} at {}", self.name, self.anchor.format("%H:%M"))?;
        for rule in &self.rules {
            write!(f, ", {rule}")?;
        }
        Ok(())
    }
}

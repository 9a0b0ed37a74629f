// File: ./src/model/recurrence.rs
use crate::model::dates;
use crate::model::item::Schedule;
use crate::model::rule::RecurrenceRule;
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use rrule::RRuleSet;
use serde::{Serialize, Serializer};
use std::str::FromStr;

/// A recurrence rule bound to the dates of the task it was read from.
///
/// The reference date is the due start when present, else the scheduled
/// start. Every other date keeps its offset to the reference on the next
/// occurrence, and every stop keeps its offset to its own start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recurrence {
    rule: RecurrenceRule,
    reference_date: Option<NaiveDateTime>,
    schedule: Schedule,
}

impl Recurrence {
    /// Returns `None` when the phrase is not understood or cannot be expanded.
    pub fn from_text(text: &str, schedule: Schedule) -> Option<Self> {
        let rule = RecurrenceRule::parse(text)?;
        if !RecurrenceEngine::is_expandable(&rule) {
            log::debug!("Rule '{}' rejected by the occurrence engine", rule.to_rrule());
            return None;
        }
        Some(Self {
            rule,
            reference_date: schedule.reference_date(),
            schedule,
        })
    }

    /// The same rule anchored on another set of dates.
    pub fn with_schedule(&self, schedule: Schedule) -> Self {
        Self {
            rule: self.rule.clone(),
            reference_date: schedule.reference_date(),
            schedule,
        }
    }

    pub fn reference_date(&self) -> Option<NaiveDateTime> {
        self.reference_date
    }

    /// Canonical phrase, stable under re-parsing.
    pub fn to_text(&self) -> String {
        self.rule.to_string()
    }

    pub fn next(&self) -> Option<Schedule> {
        self.next_after(Local::now().date_naive())
    }

    /// Dates of the first occurrence strictly after the reference date.
    /// Without a reference the rule is expanded from `today` and the result
    /// only carries a date-only scheduled start. `None` once the rule is
    /// exhausted or the dates no longer fit a four-digit year.
    pub fn next_after(&self, today: NaiveDate) -> Option<Schedule> {
        let next = self.shifted(today)?;
        if !fits_line_format(&next) {
            log::debug!("Next occurrence of '{}' is past year {}", self.rule, MAX_YEAR);
            return None;
        }
        Some(next)
    }

    fn shifted(&self, today: NaiveDate) -> Option<Schedule> {
        let Some(reference) = self.reference_date else {
            let midnight = dates::start_of_day(today);
            let next = RecurrenceEngine::first_after(&self.rule, midnight, midnight)?;
            return Some(Schedule {
                scheduled_start: Some(dates::start_of_day(next.date())),
                ..Schedule::default()
            });
        };

        let next = RecurrenceEngine::first_after(&self.rule, reference, reference)?;
        let (scheduled_start, scheduled_stop) = shift_range(
            self.schedule.scheduled_start,
            self.schedule.scheduled_stop,
            reference,
            next,
        )?;
        let (due_start, due_stop) =
            shift_range(self.schedule.due_start, self.schedule.due_stop, reference, next)?;

        Some(Schedule {
            scheduled_start,
            scheduled_stop,
            due_start,
            due_stop,
        })
    }
}

impl Serialize for Recurrence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.rule)
    }
}

/// Dates are written as `YYYY-MM-DD`.
const MAX_YEAR: i32 = 9999;

fn fits_line_format(schedule: &Schedule) -> bool {
    [
        schedule.scheduled_start,
        schedule.scheduled_stop,
        schedule.due_start,
        schedule.due_stop,
    ]
    .into_iter()
    .flatten()
    .all(|dt| (0..=MAX_YEAR).contains(&dt.year()))
}

type Range = (Option<NaiveDateTime>, Option<NaiveDateTime>);

/// Moves a start/stop pair so the start sits at the same offset from `next`
/// as it did from `reference`. `None` only on calendar overflow.
fn shift_range(
    start: Option<NaiveDateTime>,
    stop: Option<NaiveDateTime>,
    reference: NaiveDateTime,
    next: NaiveDateTime,
) -> Option<Range> {
    let Some(start) = start else {
        return Some((None, None));
    };
    let new_start = next.checked_add_signed(start - reference)?;
    let new_stop = match stop {
        Some(stop) => Some(new_start.checked_add_signed(stop - start)?),
        None => None,
    };
    Some((Some(new_start), new_stop))
}

/// Expands rules through the `rrule` crate. All arithmetic happens on
/// floating wall-clock times written as UTC, so no zone shifts apply.
pub struct RecurrenceEngine;

impl RecurrenceEngine {
    fn rule_set(rule: &RecurrenceRule, seed: NaiveDateTime) -> Option<RRuleSet> {
        let rrule_string = format!(
            "DTSTART:{}\nRRULE:{}\n",
            seed.format("%Y%m%dT%H%M%SZ"),
            rule.to_rrule()
        );
        match RRuleSet::from_str(&rrule_string) {
            Ok(set) => Some(set),
            Err(e) => {
                log::debug!("Cannot expand '{}': {}", rrule_string.trim(), e);
                None
            }
        }
    }

    /// First occurrence of `rule` seeded at `seed` that is strictly later than `floor`.
    pub fn first_after(
        rule: &RecurrenceRule,
        seed: NaiveDateTime,
        floor: NaiveDateTime,
    ) -> Option<NaiveDateTime> {
        Self::rule_set(rule, seed)?
            .into_iter()
            .map(|d| d.naive_utc())
            .find(|d| *d > floor)
    }

    pub fn is_expandable(rule: &RecurrenceRule) -> bool {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).map(dates::start_of_day);
        epoch.is_some_and(|seed| Self::rule_set(rule, seed).is_some())
    }
}

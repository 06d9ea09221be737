//! Recurrence expansion -- turns a booking window plus a [`RecurrenceRule`]
//! into a bounded, ordered sequence of concrete occurrences.
//!
//! Only three cadences exist (daily, weekly, monthly) with a single positive
//! step. Occurrence `n` is computed from the series anchor as
//! `start + n * interval` units, so a monthly series starting on the 31st
//! clamps to the last day of short months without drifting afterwards
//! (Jan 31 → Feb 28 → Mar 31 → Apr 30).
//!
//! The expander never looks at the clock or at existing bookings; the caller
//! decides per occurrence whether to skip, reject, or commit.

use std::num::NonZeroU32;

use chrono::{DateTime, Months, NaiveDate, TimeDelta, Utc};
use thiserror::Error;

use crate::model::{Occurrence, RecurrenceKind, RecurrenceRule};

/// Hard ceiling on occurrences generated from one request.
pub const MAX_OCCURRENCES: usize = 100;

/// Horizon applied when a rule has no end date.
pub const DEFAULT_HORIZON_MONTHS: u32 = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    #[error("interval must be a positive number of steps")]
    ZeroInterval,

    #[error("default horizon of {0} months is outside the supported calendar range")]
    HorizonOutOfRange(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Daily,
    Weekly,
    Monthly,
}

/// A recurrence rule with defaults applied and the interval checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Once,
    Repeating {
        cadence: Cadence,
        interval: NonZeroU32,
        /// Last UTC date on which an occurrence may start.
        until: NaiveDate,
    },
}

impl Schedule {
    /// Resolve `rule` for a series anchored at `start`.
    ///
    /// A missing interval means 1; a missing end date means `horizon_months`
    /// calendar months after `start`.
    ///
    /// # Errors
    ///
    /// Returns [`RecurrenceError::ZeroInterval`] for an explicit zero interval,
    /// or [`RecurrenceError::HorizonOutOfRange`] if the default horizon cannot
    /// be represented.
    pub fn resolve(
        rule: &RecurrenceRule,
        start: DateTime<Utc>,
        horizon_months: u32,
    ) -> Result<Self, RecurrenceError> {
        let cadence = match rule.kind {
            RecurrenceKind::None => return Ok(Schedule::Once),
            RecurrenceKind::Daily => Cadence::Daily,
            RecurrenceKind::Weekly => Cadence::Weekly,
            RecurrenceKind::Monthly => Cadence::Monthly,
        };

        let interval =
            NonZeroU32::new(rule.interval.unwrap_or(1)).ok_or(RecurrenceError::ZeroInterval)?;

        let end_date = match rule.end_date {
            Some(end) => end,
            None => start
                .checked_add_months(Months::new(horizon_months))
                .ok_or(RecurrenceError::HorizonOutOfRange(horizon_months))?,
        };

        Ok(Schedule::Repeating {
            cadence,
            interval,
            until: end_date.date_naive(),
        })
    }
}

/// Expand `[start, end)` according to `schedule`, yielding at most `cap`
/// occurrences.
///
/// The iterator is lazy: callers that abort early never compute the rest of
/// the series.
///
/// # Examples
///
/// ```
/// use booking_engine::recurrence::{expand, Schedule, MAX_OCCURRENCES};
/// use booking_engine::RecurrenceRule;
/// use chrono::{Datelike, Duration, TimeZone, Utc};
///
/// let start = Utc.with_ymd_and_hms(2026, 1, 31, 18, 0, 0).unwrap();
/// let until = Utc.with_ymd_and_hms(2026, 3, 31, 0, 0, 0).unwrap();
/// let schedule = Schedule::resolve(&RecurrenceRule::monthly(1).until(until), start, 3).unwrap();
///
/// let days: Vec<u32> = expand(start, start + Duration::hours(1), schedule, MAX_OCCURRENCES)
///     .map(|o| o.start.day())
///     .collect();
/// // Clamped in February, back to the 31st in March
/// assert_eq!(days, vec![31, 28, 31]);
/// ```
pub fn expand(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    schedule: Schedule,
    cap: usize,
) -> Occurrences {
    Occurrences {
        anchor: start,
        duration: end - start,
        schedule,
        cap,
        index: 0,
        previous: None,
        done: false,
    }
}

/// Iterator returned by [`expand`].
#[derive(Debug, Clone)]
pub struct Occurrences {
    anchor: DateTime<Utc>,
    duration: TimeDelta,
    schedule: Schedule,
    cap: usize,
    index: u32,
    previous: Option<DateTime<Utc>>,
    done: bool,
}

impl Occurrences {
    fn nth_start(&self, n: u32) -> Option<DateTime<Utc>> {
        match self.schedule {
            Schedule::Once => (n == 0).then_some(self.anchor),
            Schedule::Repeating {
                cadence, interval, ..
            } => {
                let steps = n.checked_mul(interval.get())?;
                match cadence {
                    Cadence::Daily => add_days(self.anchor, i64::from(steps)),
                    Cadence::Weekly => add_days(self.anchor, i64::from(steps) * 7),
                    Cadence::Monthly => add_months_clamped(self.anchor, steps),
                }
            }
        }
    }

    fn past_horizon(&self, occurrence: DateTime<Utc>) -> bool {
        match self.schedule {
            Schedule::Once => false,
            Schedule::Repeating { until, .. } => occurrence.date_naive() > until,
        }
    }
}

impl Iterator for Occurrences {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Occurrence> {
        if self.done || self.index as usize >= self.cap {
            return None;
        }

        let next = self.nth_start(self.index).filter(|candidate| {
            // A step that fails to move forward would repeat forever.
            self.previous.is_none_or(|prev| *candidate > prev) && !self.past_horizon(*candidate)
        });
        let Some(start) = next else {
            self.done = true;
            return None;
        };
        let Some(end) = start.checked_add_signed(self.duration) else {
            self.done = true;
            return None;
        };

        self.index += 1;
        self.previous = Some(start);
        Some(Occurrence { start, end })
    }
}

// ── Calendar arithmetic ─────────────────────────────────────────────────────

fn add_days(dt: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    dt.checked_add_signed(TimeDelta::try_days(days)?)
}

/// Add whole calendar months, clamping the day-of-month to the last valid day
/// of the target month. Time of day is preserved.
pub fn add_months_clamped(dt: DateTime<Utc>, months: u32) -> Option<DateTime<Utc>> {
    dt.checked_add_months(Months::new(months))
}

// ── Tests ───────────────────────────────────────────────────────────────────

//! Detect overlapping bookings.
//!
//! Intervals are half-open: `[a, b)` and `[c, d)` overlap when `a < d && b > c`.
//! Adjacent bookings (one ends exactly when another starts) are NOT conflicts.

use chrono::{DateTime, TimeDelta, Utc};

use crate::model::Booking;

/// Whether `[a_start, a_end)` and `[b_start, b_end)` share any instant.
///
/// # Examples
///
/// ```
/// use booking_engine::overlap::intervals_overlap;
/// use chrono::{TimeZone, Utc};
///
/// let at = |h| Utc.with_ymd_and_hms(2026, 3, 16, h, 0, 0).unwrap();
/// assert!(intervals_overlap(at(9), at(11), at(10), at(12)));
/// // Back-to-back bookings do not conflict
/// assert!(!intervals_overlap(at(9), at(10), at(10), at(11)));
/// ```
pub fn intervals_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Length of the shared part of two intervals, or `None` if they do not overlap.
pub fn overlap_duration(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> Option<TimeDelta> {
    intervals_overlap(a_start, a_end, b_start, b_end)
        .then(|| a_end.min(b_end) - a_start.max(b_start))
}

/// Whether the candidate window overlaps any of `existing`.
pub fn overlaps<'a>(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    existing: impl IntoIterator<Item = &'a Booking>,
) -> bool {
    find_overlap(start, end, existing).is_some()
}

/// The first booking in `existing` that overlaps the candidate window.
pub fn find_overlap<'a>(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    existing: impl IntoIterator<Item = &'a Booking>,
) -> Option<&'a Booking> {
    existing
        .into_iter()
        .find(|b| intervals_overlap(start, end, b.start, b.end))
}

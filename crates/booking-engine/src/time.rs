//! Owner-local time validation.
//!
//! Decides whether a booking window is still in the future as seen on the
//! owner's wall clock. All functions take the "now" anchor explicitly (no
//! system clock access), so they are deterministic and safe to call once per
//! occurrence in a tight loop.
//!
//! # Functions
//!
//! - [`parse_timezone`] — Resolve an IANA timezone name
//! - [`to_owner_local`] — Project a UTC instant onto an owner's wall clock
//! - [`describe_local`] — Wall-clock time plus UTC offset, for display
//! - [`validate_window`] — Classify `[start, end)` as valid or past

use chrono::{DateTime, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use thiserror::Error;

/// Format used when reporting the owner's current local time.
const LOCAL_NOW_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Why a booking window was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeViolation {
    #[error("Start time is in the past: {0}")]
    PastStart(String),

    #[error("End time is in the past: {0}")]
    PastEnd(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Time validation failed: {0}")]
    Validation(String),
}

// ── Timezone resolution ─────────────────────────────────────────────────────

/// Parse an IANA timezone name into `Tz`.
///
/// Empty and whitespace-only names are rejected rather than falling back to UTC.
pub fn parse_timezone(id: &str) -> Result<Tz, TimeViolation> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(TimeViolation::InvalidTimezone("missing timezone".to_string()));
    }
    trimmed
        .parse::<Tz>()
        .map_err(|_| TimeViolation::InvalidTimezone(format!("'{}'", id)))
}

// ── Local projection ────────────────────────────────────────────────────────

/// Project a UTC instant onto the wall clock of `tz`, using the offset in
/// force at that instant (DST-aware).
///
/// # Errors
///
/// Returns [`TimeViolation::Validation`] when the shifted value falls outside
/// the representable calendar range.
pub fn to_owner_local(instant: DateTime<Utc>, tz: &Tz) -> Result<NaiveDateTime, TimeViolation> {
    let utc = instant.naive_utc();
    let offset_secs = tz.offset_from_utc_datetime(&utc).fix().local_minus_utc();
    TimeDelta::try_seconds(i64::from(offset_secs))
        .and_then(|offset| utc.checked_add_signed(offset))
        .ok_or_else(|| {
            TimeViolation::Validation("unable to convert time to owner local time".to_string())
        })
}

/// A UTC instant as it appears on an owner's wall clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerLocalTime {
    /// Wall-clock time, `yyyy-MM-dd HH:mm`.
    pub local: String,
    /// The IANA timezone name used.
    pub timezone: String,
    /// The UTC offset at this instant (e.g., "-05:00").
    pub utc_offset: String,
}

/// Describe `instant` in the owner's timezone.
///
/// # Errors
///
/// Returns [`TimeViolation::InvalidTimezone`] for an unknown timezone name, or
/// [`TimeViolation::Validation`] if the projection overflows.
pub fn describe_local(instant: DateTime<Utc>, timezone: &str) -> Result<OwnerLocalTime, TimeViolation> {
    let tz = parse_timezone(timezone)?;
    let local = to_owner_local(instant, &tz)?;
    let offset_secs = tz
        .offset_from_utc_datetime(&instant.naive_utc())
        .fix()
        .local_minus_utc();

    Ok(OwnerLocalTime {
        local: local.format(LOCAL_NOW_FORMAT).to_string(),
        timezone: tz.name().to_string(),
        utc_offset: format_utc_offset(offset_secs),
    })
}

/// Format the UTC offset as a string (e.g., "-05:00", "+09:00").
fn format_utc_offset(offset_secs: i32) -> String {
    let sign = if offset_secs >= 0 { "+" } else { "-" };
    let abs_secs = offset_secs.unsigned_abs();
    let hours = abs_secs / 3600;
    let minutes = (abs_secs % 3600) / 60;
    format!("{sign}{hours:02}:{minutes:02}")
}

// ── Window validation ───────────────────────────────────────────────────────

/// Check that `[start, end)` lies strictly after `now` on the owner's wall clock.
///
/// Start is checked before end: a window whose start has passed reports
/// [`TimeViolation::PastStart`] even if its end has passed too. A start equal
/// to `now` counts as past.
///
/// # Errors
///
/// - [`TimeViolation::InvalidTimezone`] if `timezone` is empty or unknown
/// - [`TimeViolation::PastStart`] / [`TimeViolation::PastEnd`] with the
///   timezone and the owner's current local time in the message
/// - [`TimeViolation::Validation`] if any instant cannot be projected
///
/// # Examples
///
/// ```
/// use booking_engine::time::{validate_window, TimeViolation};
/// use chrono::{TimeZone, Utc};
///
/// let now = Utc.with_ymd_and_hms(2026, 3, 16, 14, 0, 0).unwrap();
/// let start = Utc.with_ymd_and_hms(2026, 3, 16, 13, 30, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2026, 3, 16, 15, 0, 0).unwrap();
///
/// // 14:00 UTC is 10:00 in New York (EDT)
/// let err = validate_window(start, end, "America/New_York", now).unwrap_err();
/// assert!(matches!(err, TimeViolation::PastStart(ref d) if d.contains("2026-03-16 10:00")));
/// ```
pub fn validate_window(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    timezone: &str,
    now: DateTime<Utc>,
) -> Result<(), TimeViolation> {
    let tz = parse_timezone(timezone)?;

    let local_start = to_owner_local(start, &tz)?;
    let local_end = to_owner_local(end, &tz)?;
    let local_now = to_owner_local(now, &tz)?;

    if local_start <= local_now {
        return Err(TimeViolation::PastStart(past_detail(timezone, &local_now)));
    }
    if local_end <= local_now {
        return Err(TimeViolation::PastEnd(past_detail(timezone, &local_now)));
    }
    Ok(())
}

fn past_detail(timezone: &str, local_now: &NaiveDateTime) -> String {
    format!(
        "current time in {} is {}",
        timezone,
        local_now.format(LOCAL_NOW_FORMAT)
    )
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn now() -> DateTime<Utc> {
        // Monday, March 16 2026, 14:00 UTC
        Utc.with_ymd_and_hms(2026, 3, 16, 14, 0, 0).unwrap()
    }

    // ── parse_timezone tests ────────────────────────────────────────────

    #[test]
    fn test_parse_known_timezone() {
        assert_eq!(parse_timezone("Asia/Tokyo").unwrap(), chrono_tz::Asia::Tokyo);
    }

    #[test]
    fn test_parse_unknown_timezone_is_error() {
        let err = parse_timezone("Mars/Olympus_Mons").unwrap_err();
        assert!(matches!(err, TimeViolation::InvalidTimezone(_)));
        assert!(err.to_string().contains("Mars/Olympus_Mons"), "got: {err}");
    }

    #[test]
    fn test_parse_empty_timezone_is_error() {
        assert!(matches!(
            parse_timezone(""),
            Err(TimeViolation::InvalidTimezone(_))
        ));
        assert!(matches!(
            parse_timezone("   "),
            Err(TimeViolation::InvalidTimezone(_))
        ));
    }

    // ── to_owner_local tests ────────────────────────────────────────────

    #[test]
    fn test_local_projection_tracks_dst() {
        let tz = chrono_tz::America::New_York;
        // Jan 15 is EST (UTC-5)
        let winter = to_owner_local(Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap(), &tz)
            .unwrap();
        assert_eq!(
            winter,
            NaiveDate::from_ymd_opt(2026, 1, 15)
                .unwrap()
                .and_hms_opt(7, 0, 0)
                .unwrap()
        );
        // Mar 15 is EDT (UTC-4)
        let summer = to_owner_local(Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap(), &tz)
            .unwrap();
        assert_eq!(
            summer,
            NaiveDate::from_ymd_opt(2026, 3, 15)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_local_projection_overflow_is_validation_error() {
        let tz = chrono_tz::Pacific::Kiritimati; // UTC+14
        let err = to_owner_local(DateTime::<Utc>::MAX_UTC, &tz).unwrap_err();
        assert!(matches!(err, TimeViolation::Validation(_)));
    }

    #[test]
    fn test_describe_local_reports_offset() {
        let described = describe_local(now(), "America/New_York").unwrap();
        assert_eq!(described.local, "2026-03-16 10:00");
        assert_eq!(described.utc_offset, "-04:00");
        assert_eq!(described.timezone, "America/New_York");

        let kolkata = describe_local(now(), "Asia/Kolkata").unwrap();
        assert_eq!(kolkata.utc_offset, "+05:30");
    }

    // ── validate_window tests ───────────────────────────────────────────

    #[test]
    fn test_future_window_is_valid() {
        let start = now() + Duration::hours(1);
        let end = start + Duration::hours(1);
        assert_eq!(validate_window(start, end, "Europe/Berlin", now()), Ok(()));
    }

    #[test]
    fn test_start_equal_to_now_is_past() {
        let err = validate_window(now(), now() + Duration::hours(1), "UTC", now()).unwrap_err();
        assert!(matches!(err, TimeViolation::PastStart(_)));
    }

    #[test]
    fn test_past_start_detail_names_timezone_and_local_now() {
        let start = now() - Duration::minutes(30);
        let end = now() + Duration::minutes(30);
        let err = validate_window(start, end, "America/New_York", now()).unwrap_err();
        match err {
            TimeViolation::PastStart(detail) => {
                assert!(detail.contains("America/New_York"), "got: {detail}");
                assert!(detail.contains("2026-03-16 10:00"), "got: {detail}");
            }
            other => panic!("expected PastStart, got {other:?}"),
        }
    }

    #[test]
    fn test_end_at_now_is_past_end() {
        // A future start with an end at or before now only happens for a
        // reversed window; the validator still reports the end separately.
        let start = now() + Duration::hours(1);
        let err = validate_window(start, now(), "UTC", now()).unwrap_err();
        assert!(matches!(err, TimeViolation::PastEnd(_)));
    }

    #[test]
    fn test_repeated_fall_back_hour_compares_wall_clock() {
        // Nov 1 2026, New York falls back 02:00 EDT → 01:00 EST. At 01:50 EDT
        // (05:50 UTC) a slot starting at 01:10 EST (06:10 UTC) is later in UTC
        // but earlier on the owner's wall clock.
        let now = Utc.with_ymd_and_hms(2026, 11, 1, 5, 50, 0).unwrap();
        let start = Utc.with_ymd_and_hms(2026, 11, 1, 6, 10, 0).unwrap();
        let err = validate_window(start, start + Duration::hours(2), "America/New_York", now)
            .unwrap_err();
        assert!(matches!(err, TimeViolation::PastStart(_)));
    }

    #[test]
    fn test_unknown_timezone_never_falls_back() {
        let start = now() + Duration::hours(1);
        let err = validate_window(start, start + Duration::hours(1), "Not/AZone", now())
            .unwrap_err();
        assert!(matches!(err, TimeViolation::InvalidTimezone(_)));
    }

    #[test]
    fn test_degenerate_instant_reports_validation_error() {
        let err = validate_window(
            DateTime::<Utc>::MAX_UTC - Duration::hours(1),
            DateTime::<Utc>::MAX_UTC,
            "Pacific/Kiritimati",
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, TimeViolation::Validation(_)));
    }

    #[test]
    fn test_format_utc_offset() {
        assert_eq!(format_utc_offset(-5 * 3600), "-05:00");
        assert_eq!(format_utc_offset(9 * 3600), "+09:00");
        assert_eq!(format_utc_offset(0), "+00:00");
    }
}

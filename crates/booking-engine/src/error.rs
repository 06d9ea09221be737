//! Error types for booking-engine operations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::{BookingId, OwnerId};
use crate::recurrence::RecurrenceError;
use crate::repository::RepositoryError;
use crate::time::TimeViolation;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("User not found: {0}")]
    UserNotFound(OwnerId),

    #[error("Invalid time range: start {start} must be before end {end}")]
    InvalidTimeRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Start time is in the past: {0}")]
    PastStart(String),

    #[error("End time is in the past: {0}")]
    PastEnd(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Time validation failed: {0}")]
    Validation(String),

    #[error("Invalid recurrence: {0}")]
    InvalidRecurrence(String),

    #[error(
        "Booking on {date} overlaps existing booking {conflicting} by {overlap_minutes} minutes"
    )]
    OverlapConflict {
        date: NaiveDate,
        conflicting: BookingId,
        overlap_minutes: i64,
    },

    #[error("All occurrences are in the past")]
    NoFutureOccurrences,

    #[error("Booking not found: {0}")]
    NotFound(BookingId),

    #[error("Booking {booking} does not belong to user {requester}")]
    Unauthorized {
        booking: BookingId,
        requester: OwnerId,
    },

    #[error("Repository failure: {0}")]
    Repository(String),
}

/// Flat classification of a [`BookingError`], for callers that map failures
/// onto their own response codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UserNotFound,
    InvalidTimeRange,
    PastStart,
    PastEnd,
    InvalidTimezone,
    ValidationError,
    InvalidRecurrence,
    OverlapConflict,
    NoFutureOccurrences,
    NotFound,
    Unauthorized,
    RepositoryFailure,
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::UserNotFound(_) => ErrorKind::UserNotFound,
            BookingError::InvalidTimeRange { .. } => ErrorKind::InvalidTimeRange,
            BookingError::PastStart(_) => ErrorKind::PastStart,
            BookingError::PastEnd(_) => ErrorKind::PastEnd,
            BookingError::InvalidTimezone(_) => ErrorKind::InvalidTimezone,
            BookingError::Validation(_) => ErrorKind::ValidationError,
            BookingError::InvalidRecurrence(_) => ErrorKind::InvalidRecurrence,
            BookingError::OverlapConflict { .. } => ErrorKind::OverlapConflict,
            BookingError::NoFutureOccurrences => ErrorKind::NoFutureOccurrences,
            BookingError::NotFound(_) => ErrorKind::NotFound,
            BookingError::Unauthorized { .. } => ErrorKind::Unauthorized,
            BookingError::Repository(_) => ErrorKind::RepositoryFailure,
        }
    }
}

impl From<TimeViolation> for BookingError {
    fn from(violation: TimeViolation) -> Self {
        match violation {
            TimeViolation::PastStart(detail) => BookingError::PastStart(detail),
            TimeViolation::PastEnd(detail) => BookingError::PastEnd(detail),
            TimeViolation::InvalidTimezone(id) => BookingError::InvalidTimezone(id),
            TimeViolation::Validation(detail) => BookingError::Validation(detail),
        }
    }
}

impl From<RecurrenceError> for BookingError {
    fn from(err: RecurrenceError) -> Self {
        BookingError::InvalidRecurrence(err.to_string())
    }
}

impl From<RepositoryError> for BookingError {
    fn from(err: RepositoryError) -> Self {
        BookingError::Repository(err.message().to_string())
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;

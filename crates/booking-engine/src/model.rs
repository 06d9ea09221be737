//! Domain types shared by the validator, the expander, and the service.
//!
//! All instants are UTC. Callers convert wall-clock input to UTC before it
//! reaches the engine and project stored instants back into the owner's
//! timezone for display (see [`crate::time::to_owner_local`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type OwnerId = Uuid;
pub type BookingId = Uuid;

// ── Owners ──────────────────────────────────────────────────────────────────

/// The booking owner, as far as the engine cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerProfile {
    pub id: OwnerId,
    /// Display identifier, matched by keyword search.
    pub username: String,
    /// IANA timezone name (e.g., `"Europe/Berlin"`).
    pub timezone: String,
}

impl OwnerProfile {
    pub fn new(username: impl Into<String>, timezone: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            timezone: timezone.into(),
        }
    }
}

// ── Recurrence ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceKind {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
}

/// How a requested booking repeats.
///
/// Consumed once at creation time; the resulting occurrences are stored as
/// independent bookings and carry no link back to the rule.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecurrenceRule {
    #[serde(default)]
    pub kind: RecurrenceKind,
    /// Step count in units of `kind`. Absent means 1; zero is rejected.
    #[serde(default)]
    pub interval: Option<u32>,
    /// Last date (UTC) on which an occurrence may start. Absent means the
    /// configured horizon after the first start.
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

impl RecurrenceRule {
    pub fn once() -> Self {
        Self::default()
    }

    pub fn daily(interval: u32) -> Self {
        Self::repeating(RecurrenceKind::Daily, interval)
    }

    pub fn weekly(interval: u32) -> Self {
        Self::repeating(RecurrenceKind::Weekly, interval)
    }

    pub fn monthly(interval: u32) -> Self {
        Self::repeating(RecurrenceKind::Monthly, interval)
    }

    fn repeating(kind: RecurrenceKind, interval: u32) -> Self {
        Self {
            kind,
            interval: Some(interval),
            end_date: None,
        }
    }

    pub fn until(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.kind != RecurrenceKind::None
    }
}

// ── Bookings ────────────────────────────────────────────────────────────────

/// Descriptive metadata carried by requests and stored bookings alike.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BookingDetails {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl BookingDetails {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Case-insensitive substring match over the searchable text fields.
    /// `needle` must already be lowercased.
    pub fn matches_keyword(&self, needle: &str) -> bool {
        let hit = |field: &str| field.to_lowercase().contains(needle);
        hit(&self.title)
            || self.description.as_deref().is_some_and(hit)
            || self.location.as_deref().is_some_and(hit)
            || self.attendees.iter().any(|a| hit(a.as_str()))
    }
}

/// A request to book `[start, end)` for an owner, possibly repeating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub owner_id: OwnerId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(flatten)]
    pub details: BookingDetails,
    #[serde(default)]
    pub recurrence: RecurrenceRule,
}

impl BookingRequest {
    pub fn new(owner_id: OwnerId, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            owner_id,
            start,
            end,
            details: BookingDetails::default(),
            recurrence: RecurrenceRule::once(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.details.title = title.into();
        self
    }

    pub fn with_details(mut self, details: BookingDetails) -> Self {
        self.details = details;
        self
    }

    pub fn with_recurrence(mut self, recurrence: RecurrenceRule) -> Self {
        self.recurrence = recurrence;
        self
    }
}

/// Replacement window and metadata for an existing booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingUpdate {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(flatten)]
    pub details: BookingDetails,
}

/// A stored, non-recurring booking occupying `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub owner_id: OwnerId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(flatten)]
    pub details: BookingDetails,
}

impl Booking {
    pub fn new(
        owner_id: OwnerId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        details: BookingDetails,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            start,
            end,
            details,
        }
    }
}

/// One materialized slot of a recurrence expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Occurrence {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Outcome of a successful create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingCreated {
    /// The first committed occurrence, standing in for the whole request.
    pub booking: Booking,
    /// Number of bookings committed by the call.
    pub occurrences: usize,
    /// Occurrences dropped because they had already started.
    pub skipped_past: usize,
}

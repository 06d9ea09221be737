//! Booking orchestration.
//!
//! [`BookingService`] composes the time validator, the recurrence expander and
//! the overlap detector with the repository collaborators. It owns the
//! control flow of every operation and the error taxonomy; the leaf modules
//! stay pure.
//!
//! Structured logging goes through `tracing`. Callers inject a parent span
//! with [`BookingService::with_span`]; every operation opens a child span
//! carrying the ids involved.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, info_span, warn, Span};

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::{BookingError, Result};
use crate::model::{
    Booking, BookingCreated, BookingId, BookingRequest, BookingUpdate, OwnerId, OwnerProfile,
};
use crate::overlap;
use crate::recurrence::{self, Schedule};
use crate::repository::{BookingStore, OwnerDirectory};
use crate::time;

pub struct BookingService<O, S, C = SystemClock> {
    owners: O,
    store: S,
    clock: C,
    config: EngineConfig,
    span: Span,
}

impl<O, S> BookingService<O, S, SystemClock>
where
    O: OwnerDirectory,
    S: BookingStore,
{
    pub fn new(owners: O, store: S) -> Self {
        Self {
            owners,
            store,
            clock: SystemClock,
            config: EngineConfig::default(),
            span: Span::none(),
        }
    }
}

impl<O, S, C> BookingService<O, S, C>
where
    O: OwnerDirectory,
    S: BookingStore,
    C: Clock,
{
    pub fn with_clock<C2: Clock>(self, clock: C2) -> BookingService<O, S, C2> {
        BookingService {
            owners: self.owners,
            store: self.store,
            clock,
            config: self.config,
            span: self.span,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Parent span for every operation's span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    // ── Create ──────────────────────────────────────────────────────────

    /// Book a window for its owner, expanding the recurrence rule if any.
    ///
    /// Checks run in this order: owner exists, `start < end`, window is in the
    /// future on the owner's clock, recurrence rule is well formed. A
    /// recurring request is then planned occurrence by occurrence: ones that
    /// have already started are skipped, and any overlap (with the owner's
    /// existing bookings or with an earlier occurrence of the same request)
    /// fails the whole call. The planned series is committed in one batch, so
    /// a failure leaves nothing behind.
    ///
    /// # Errors
    ///
    /// `UserNotFound`, `InvalidTimeRange`, `PastStart`, `PastEnd`,
    /// `InvalidTimezone`, `Validation`, `InvalidRecurrence`,
    /// `OverlapConflict`, `NoFutureOccurrences`, or `Repository`.
    pub fn create_booking(&self, request: BookingRequest) -> Result<BookingCreated> {
        let span = info_span!(
            parent: &self.span,
            "create_booking",
            owner_id = %request.owner_id,
            recurrence = ?request.recurrence.kind,
        );
        let _enter = span.enter();

        let owner = self.require_owner(request.owner_id)?;
        ensure_range(request.start, request.end)?;

        time::validate_window(request.start, request.end, &owner.timezone, self.clock.now())?;
        let tz = time::parse_timezone(&owner.timezone)?;

        let schedule = Schedule::resolve(
            &request.recurrence,
            request.start,
            self.config.default_horizon_months,
        )?;
        let existing = self.store.bookings_for_owner(owner.id)?;

        match schedule {
            Schedule::Once => self.create_single(&owner, &tz, request, &existing),
            Schedule::Repeating { .. } => {
                self.create_series(&owner, &tz, request, schedule, &existing)
            }
        }
    }

    fn create_single(
        &self,
        owner: &OwnerProfile,
        tz: &Tz,
        request: BookingRequest,
        existing: &[Booking],
    ) -> Result<BookingCreated> {
        if let Some(conflict) = overlap::find_overlap(request.start, request.end, existing) {
            warn!(conflicting = %conflict.id, "requested window overlaps an existing booking");
            return Err(overlap_error(tz, request.start, request.end, conflict));
        }

        let booking = Booking::new(owner.id, request.start, request.end, request.details);
        self.store.add(booking.clone())?;
        info!(booking_id = %booking.id, start = %booking.start, "booking created");

        Ok(BookingCreated {
            booking,
            occurrences: 1,
            skipped_past: 0,
        })
    }

    fn create_series(
        &self,
        owner: &OwnerProfile,
        tz: &Tz,
        request: BookingRequest,
        schedule: Schedule,
        existing: &[Booking],
    ) -> Result<BookingCreated> {
        let mut planned: Vec<Booking> = Vec::new();
        let mut skipped_past: usize = 0;

        let occurrences = recurrence::expand(
            request.start,
            request.end,
            schedule,
            self.config.max_occurrences,
        );
        for occurrence in occurrences {
            let now = self.clock.now();
            if let Err(violation) =
                time::validate_window(occurrence.start, occurrence.end, &owner.timezone, now)
            {
                skipped_past += 1;
                debug!(start = %occurrence.start, %violation, "skipping occurrence");
                continue;
            }

            let universe = existing.iter().chain(planned.iter());
            if let Some(conflict) = overlap::find_overlap(occurrence.start, occurrence.end, universe)
            {
                warn!(
                    start = %occurrence.start,
                    conflicting = %conflict.id,
                    "occurrence overlaps a booking; rejecting series"
                );
                return Err(overlap_error(tz, occurrence.start, occurrence.end, conflict));
            }

            planned.push(Booking::new(
                owner.id,
                occurrence.start,
                occurrence.end,
                request.details.clone(),
            ));
        }

        let Some(first) = planned.first().cloned() else {
            warn!(skipped_past, "every occurrence of the series is in the past");
            return Err(BookingError::NoFutureOccurrences);
        };
        let count = planned.len();
        self.store.add_all(planned)?;
        info!(
            booking_id = %first.id,
            occurrences = count,
            skipped_past,
            "recurring booking created"
        );

        Ok(BookingCreated {
            booking: first,
            occurrences: count,
            skipped_past,
        })
    }

    // ── Update / delete / category ──────────────────────────────────────

    /// Move and re-describe one of the requester's bookings.
    ///
    /// The new window must be well formed and free of overlaps with the
    /// owner's other bookings. A moved window must also lie in the future on
    /// the owner's clock; keeping the stored window skips that check, so a
    /// booking in progress or already over can still be re-described.
    pub fn update_booking(
        &self,
        id: BookingId,
        requester: OwnerId,
        update: BookingUpdate,
    ) -> Result<Booking> {
        let span = info_span!(
            parent: &self.span,
            "update_booking",
            booking_id = %id,
            requester = %requester,
        );
        let _enter = span.enter();

        let mut booking = self.owned_booking(id, requester)?;
        ensure_range(update.start, update.end)?;

        let owner = self.require_owner(booking.owner_id)?;
        let moved = update.start != booking.start || update.end != booking.end;
        if moved {
            time::validate_window(update.start, update.end, &owner.timezone, self.clock.now())?;
        }
        let tz = time::parse_timezone(&owner.timezone)?;

        let others = self.store.bookings_for_owner(owner.id)?;
        let conflict = overlap::find_overlap(
            update.start,
            update.end,
            others.iter().filter(|b| b.id != id),
        );
        if let Some(conflict) = conflict {
            warn!(conflicting = %conflict.id, "updated window overlaps another booking");
            return Err(overlap_error(&tz, update.start, update.end, conflict));
        }

        booking.start = update.start;
        booking.end = update.end;
        booking.details = update.details;
        self.store.update(booking.clone())?;
        info!("booking updated");
        Ok(booking)
    }

    /// Delete one of the requester's bookings, returning what was removed.
    pub fn delete_booking(&self, id: BookingId, requester: OwnerId) -> Result<Booking> {
        let span = info_span!(
            parent: &self.span,
            "delete_booking",
            booking_id = %id,
            requester = %requester,
        );
        let _enter = span.enter();

        let booking = self.owned_booking(id, requester)?;
        self.store.delete(&booking)?;
        info!("booking deleted");
        Ok(booking)
    }

    /// Change the category ("type") of one of the requester's bookings.
    pub fn change_category(
        &self,
        id: BookingId,
        requester: OwnerId,
        category: Option<String>,
    ) -> Result<Booking> {
        let span = info_span!(
            parent: &self.span,
            "change_category",
            booking_id = %id,
            requester = %requester,
        );
        let _enter = span.enter();

        let mut booking = self.owned_booking(id, requester)?;
        booking.details.category = category;
        self.store.update(booking.clone())?;
        info!(category = ?booking.details.category, "booking category changed");
        Ok(booking)
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn get_booking(&self, id: BookingId, requester: OwnerId) -> Result<Booking> {
        self.owned_booking(id, requester)
    }

    /// All bookings of `owner`, ordered by start.
    pub fn list_bookings(&self, owner: OwnerId) -> Result<Vec<Booking>> {
        let owner = self.require_owner(owner)?;
        Ok(self.store.bookings_for_owner(owner.id)?)
    }

    /// Keyword search across title, description, location, attendees and
    /// owner username. A blank keyword means no search was requested and
    /// yields nothing.
    pub fn search(&self, keyword: &str, owner: Option<OwnerId>) -> Result<Vec<Booking>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(Vec::new());
        }
        let span = info_span!(parent: &self.span, "search", owner_id = ?owner);
        let _enter = span.enter();

        let found = self.store.search(keyword, owner)?;
        debug!(hits = found.len(), "search finished");
        Ok(found)
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    fn require_owner(&self, id: OwnerId) -> Result<OwnerProfile> {
        self.owners.get_owner(id)?.ok_or_else(|| {
            warn!(owner_id = %id, "owner not found");
            BookingError::UserNotFound(id)
        })
    }

    fn owned_booking(&self, id: BookingId, requester: OwnerId) -> Result<Booking> {
        let booking = self.store.get(id)?.ok_or(BookingError::NotFound(id))?;
        if booking.owner_id != requester {
            warn!(booking_id = %id, requester = %requester, "requester does not own booking");
            return Err(BookingError::Unauthorized {
                booking: id,
                requester,
            });
        }
        Ok(booking)
    }
}

fn ensure_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if start >= end {
        return Err(BookingError::InvalidTimeRange { start, end });
    }
    Ok(())
}

/// Build the conflict error, dating it on the owner's calendar.
fn overlap_error(
    tz: &Tz,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    conflict: &Booking,
) -> BookingError {
    let date: NaiveDate = time::to_owner_local(start, tz)
        .map(|local| local.date())
        .unwrap_or_else(|_| start.date_naive());
    let overlap_minutes = overlap::overlap_duration(start, end, conflict.start, conflict.end)
        .map(|d| d.num_minutes())
        .unwrap_or_default();

    BookingError::OverlapConflict {
        date,
        conflicting: conflict.id,
        overlap_minutes,
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

//! # booking-engine
//!
//! Deterministic booking computation for calendar backends.
//!
//! The engine turns a booking request, possibly repeating daily, weekly or
//! monthly, into concrete non-recurring bookings. It validates every window
//! against "now" on the owner's wall clock, expands recurrence rules with
//! calendar-safe month arithmetic, and rejects overlaps with the owner's
//! existing bookings.
//!
//! ## Modules
//!
//! - [`time`] — Owner-local time projection and past-time validation
//! - [`recurrence`] — Recurrence rule → bounded sequence of occurrences
//! - [`overlap`] — Half-open interval overlap detection
//! - [`service`] — Create / update / delete / search orchestration
//! - [`repository`] — Owner lookup and booking store interfaces
//! - [`memory`] — In-memory store with JSON snapshots
//! - [`clock`] — Injectable source of "now"
//! - [`config`] — Engine limits
//! - [`error`] — Error types

pub mod clock;
pub mod config;
pub mod error;
pub mod memory;
pub mod model;
pub mod overlap;
pub mod recurrence;
pub mod repository;
pub mod service;
pub mod time;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use error::{BookingError, ErrorKind};
pub use memory::{MemoryStore, Snapshot};
pub use model::{
    Booking, BookingCreated, BookingDetails, BookingId, BookingRequest, BookingUpdate,
    Occurrence, OwnerId, OwnerProfile, RecurrenceKind, RecurrenceRule,
};
pub use overlap::{find_overlap, intervals_overlap, overlaps};
pub use recurrence::{expand, Schedule, DEFAULT_HORIZON_MONTHS, MAX_OCCURRENCES};
pub use repository::{BookingStore, OwnerDirectory, RepositoryError};
pub use service::BookingService;
pub use time::{describe_local, to_owner_local, validate_window, OwnerLocalTime, TimeViolation};

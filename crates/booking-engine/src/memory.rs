//! In-memory owner directory and booking store.
//!
//! Backs the tests and the CLI. State can be round-tripped through a JSON
//! [`Snapshot`] so a command-line session can persist between invocations.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::model::{Booking, BookingId, OwnerId, OwnerProfile};
use crate::repository::{BookingStore, OwnerDirectory, RepoResult, RepositoryError};

/// Serializable image of a [`MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub owners: Vec<OwnerProfile>,
    #[serde(default)]
    pub bookings: Vec<Booking>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    owners: RwLock<HashMap<OwnerId, OwnerProfile>>,
    bookings: RwLock<HashMap<BookingId, Booking>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            owners: RwLock::new(snapshot.owners.into_iter().map(|o| (o.id, o)).collect()),
            bookings: RwLock::new(snapshot.bookings.into_iter().map(|b| (b.id, b)).collect()),
        }
    }

    /// Owners and bookings, each sorted for stable output.
    pub fn snapshot(&self) -> RepoResult<Snapshot> {
        let mut owners: Vec<OwnerProfile> = self.read_owners()?.values().cloned().collect();
        owners.sort_by(|a, b| a.username.cmp(&b.username).then(a.id.cmp(&b.id)));
        let mut bookings: Vec<Booking> = self.read_bookings()?.values().cloned().collect();
        sort_by_start(&mut bookings);
        Ok(Snapshot { owners, bookings })
    }

    pub fn insert_owner(&self, owner: OwnerProfile) -> RepoResult<()> {
        self.write_owners()?.insert(owner.id, owner);
        Ok(())
    }

    /// Store a booking without any validation. For seeding fixtures.
    pub fn insert_booking(&self, booking: Booking) -> RepoResult<()> {
        self.write_bookings()?.insert(booking.id, booking);
        Ok(())
    }

    pub fn booking_count(&self) -> RepoResult<usize> {
        Ok(self.read_bookings()?.len())
    }

    fn read_owners(&self) -> RepoResult<RwLockReadGuard<'_, HashMap<OwnerId, OwnerProfile>>> {
        self.owners.read().map_err(|_| poisoned("owners"))
    }

    fn write_owners(&self) -> RepoResult<RwLockWriteGuard<'_, HashMap<OwnerId, OwnerProfile>>> {
        self.owners.write().map_err(|_| poisoned("owners"))
    }

    fn read_bookings(&self) -> RepoResult<RwLockReadGuard<'_, HashMap<BookingId, Booking>>> {
        self.bookings.read().map_err(|_| poisoned("bookings"))
    }

    fn write_bookings(&self) -> RepoResult<RwLockWriteGuard<'_, HashMap<BookingId, Booking>>> {
        self.bookings.write().map_err(|_| poisoned("bookings"))
    }
}

fn poisoned(table: &str) -> RepositoryError {
    RepositoryError::new(format!("{table} lock poisoned"))
}

fn sort_by_start(bookings: &mut [Booking]) {
    bookings.sort_by(|a, b| a.start.cmp(&b.start).then(a.id.cmp(&b.id)));
}

impl OwnerDirectory for MemoryStore {
    fn get_owner(&self, id: OwnerId) -> RepoResult<Option<OwnerProfile>> {
        Ok(self.read_owners()?.get(&id).cloned())
    }
}

impl BookingStore for MemoryStore {
    fn bookings_for_owner(&self, owner: OwnerId) -> RepoResult<Vec<Booking>> {
        let mut found: Vec<Booking> = self
            .read_bookings()?
            .values()
            .filter(|b| b.owner_id == owner)
            .cloned()
            .collect();
        sort_by_start(&mut found);
        Ok(found)
    }

    fn get(&self, id: BookingId) -> RepoResult<Option<Booking>> {
        Ok(self.read_bookings()?.get(&id).cloned())
    }

    fn add(&self, booking: Booking) -> RepoResult<()> {
        let mut bookings = self.write_bookings()?;
        if bookings.contains_key(&booking.id) {
            return Err(RepositoryError::new(format!(
                "booking {} already exists",
                booking.id
            )));
        }
        bookings.insert(booking.id, booking);
        Ok(())
    }

    fn add_all(&self, batch: Vec<Booking>) -> RepoResult<()> {
        let mut bookings = self.write_bookings()?;
        let mut seen = HashSet::with_capacity(batch.len());
        for booking in &batch {
            if bookings.contains_key(&booking.id) || !seen.insert(booking.id) {
                return Err(RepositoryError::new(format!(
                    "booking {} already exists",
                    booking.id
                )));
            }
        }
        bookings.extend(batch.into_iter().map(|b| (b.id, b)));
        Ok(())
    }

    fn update(&self, booking: Booking) -> RepoResult<()> {
        let mut bookings = self.write_bookings()?;
        match bookings.get_mut(&booking.id) {
            Some(slot) => {
                *slot = booking;
                Ok(())
            }
            None => Err(RepositoryError::new(format!(
                "booking {} does not exist",
                booking.id
            ))),
        }
    }

    fn delete(&self, booking: &Booking) -> RepoResult<()> {
        self.write_bookings()?
            .remove(&booking.id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::new(format!("booking {} does not exist", booking.id)))
    }

    /// Blank keywords match nothing, the same as the service-level search.
    fn search(&self, keyword: &str, owner: Option<OwnerId>) -> RepoResult<Vec<Booking>> {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let owners = self.read_owners()?;
        let owner_matches = |id: &OwnerId| {
            owners
                .get(id)
                .is_some_and(|o| o.username.to_lowercase().contains(&needle))
        };

        let mut found: Vec<Booking> = self
            .read_bookings()?
            .values()
            .filter(|b| owner.is_none_or(|o| b.owner_id == o))
            .filter(|b| b.details.matches_keyword(&needle) || owner_matches(&b.owner_id))
            .cloned()
            .collect();
        sort_by_start(&mut found);
        Ok(found)
    }
}

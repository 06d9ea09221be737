//! Collaborator interfaces the service talks to.
//!
//! Persistence mechanics live behind these traits; the engine only needs an
//! owner lookup and a booking store. Implementations report failures as an
//! opaque [`RepositoryError`], which the service surfaces unchanged.

use std::sync::Arc;

use thiserror::Error;

use crate::model::{Booking, BookingId, OwnerId, OwnerProfile};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RepositoryError {
    message: String,
}

impl RepositoryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type RepoResult<T> = std::result::Result<T, RepositoryError>;

pub trait OwnerDirectory {
    fn get_owner(&self, id: OwnerId) -> RepoResult<Option<OwnerProfile>>;
}

pub trait BookingStore {
    /// All bookings of `owner`, ordered by start.
    fn bookings_for_owner(&self, owner: OwnerId) -> RepoResult<Vec<Booking>>;

    fn get(&self, id: BookingId) -> RepoResult<Option<Booking>>;

    fn add(&self, booking: Booking) -> RepoResult<()>;

    /// Persist a batch. Either every booking is stored or none is.
    fn add_all(&self, bookings: Vec<Booking>) -> RepoResult<()>;

    fn update(&self, booking: Booking) -> RepoResult<()>;

    fn delete(&self, booking: &Booking) -> RepoResult<()>;

    /// Case-insensitive keyword search, optionally scoped to one owner.
    fn search(&self, keyword: &str, owner: Option<OwnerId>) -> RepoResult<Vec<Booking>>;
}

impl<T: OwnerDirectory + ?Sized> OwnerDirectory for Arc<T> {
    fn get_owner(&self, id: OwnerId) -> RepoResult<Option<OwnerProfile>> {
        (**self).get_owner(id)
    }
}

impl<T: BookingStore + ?Sized> BookingStore for Arc<T> {
    fn bookings_for_owner(&self, owner: OwnerId) -> RepoResult<Vec<Booking>> {
        (**self).bookings_for_owner(owner)
    }

    fn get(&self, id: BookingId) -> RepoResult<Option<Booking>> {
        (**self).get(id)
    }

    fn add(&self, booking: Booking) -> RepoResult<()> {
        (**self).add(booking)
    }

    fn add_all(&self, bookings: Vec<Booking>) -> RepoResult<()> {
        (**self).add_all(bookings)
    }

    fn update(&self, booking: Booking) -> RepoResult<()> {
        (**self).update(booking)
    }

    fn delete(&self, booking: &Booking) -> RepoResult<()> {
        (**self).delete(booking)
    }

    fn search(&self, keyword: &str, owner: Option<OwnerId>) -> RepoResult<Vec<Booking>> {
        (**self).search(keyword, owner)
    }
}

//! Repository layer for reservation persistence

pub mod memory;
pub mod reservations;

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{NewReservation, Reservation},
};

pub use memory::InMemoryReservationStore;
pub use reservations::ReservationsRepository;

/// Persistence capability used by the reservation workflow
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// All reservations; an empty table is reported as `NotFound`
    async fn list_all(&self) -> AppResult<Vec<Reservation>>;

    async fn get_by_id(&self, id: i64) -> AppResult<Reservation>;

    /// Insert a reservation checked out now
    async fn save(&self, reservation: NewReservation) -> AppResult<()>;

    /// Close an open reservation with a return date of now
    async fn set_return_date(&self, id: i64) -> AppResult<()>;

    /// Connectivity check for readiness
    async fn ping(&self) -> AppResult<()>;
}

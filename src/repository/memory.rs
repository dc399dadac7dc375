//! In-memory reservation store, used in tests and local runs without a database

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;

use crate::{
    error::{AppError, AppResult},
    models::{NewReservation, Reservation},
};

use super::ReservationStore;

#[derive(Default)]
pub struct InMemoryReservationStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    rows: Vec<Reservation>,
    next_id: i64,
}

impl InMemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing rows; new ids continue after the highest one
    pub fn with_reservations(rows: Vec<Reservation>) -> Self {
        let next_id = rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        Self {
            inner: Mutex::new(Inner { rows, next_id }),
        }
    }

    /// Snapshot of all rows, including an empty one
    pub fn snapshot(&self) -> Vec<Reservation> {
        self.lock().rows.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn list_all(&self) -> AppResult<Vec<Reservation>> {
        let inner = self.lock();
        if inner.rows.is_empty() {
            return Err(AppError::NotFound("No reservations recorded".to_string()));
        }
        Ok(inner.rows.clone())
    }

    async fn get_by_id(&self, id: i64) -> AppResult<Reservation> {
        self.lock()
            .rows
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Reservation with id {} not found", id)))
    }

    async fn save(&self, reservation: NewReservation) -> AppResult<()> {
        let mut inner = self.lock();
        let id = inner.next_id.max(1);
        inner.next_id = id + 1;
        inner.rows.push(Reservation {
            id,
            book_id: reservation.book_id,
            user_id: reservation.user_id,
            checkout_date: Utc::now(),
            return_date: None,
        });
        Ok(())
    }

    async fn set_return_date(&self, id: i64) -> AppResult<()> {
        let mut inner = self.lock();
        let row = inner
            .rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Reservation with id {} not found", id)))?;

        if row.return_date.is_some() {
            return Err(AppError::AlreadyCompleted);
        }
        row.return_date = Some(Utc::now());
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

//! Reservation model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Reservation model from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reservation {
    pub id: i64,
    pub book_id: i64,
    pub user_id: i64,
    pub checkout_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
}

impl Reservation {
    /// A reservation is closed once its return date is set
    pub fn is_completed(&self) -> bool {
        self.return_date.is_some()
    }

    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }
}

/// Reservation to be inserted; the store assigns id and checkout date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewReservation {
    pub book_id: i64,
    pub user_id: i64,
}

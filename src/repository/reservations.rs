//! Reservations repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{NewReservation, Reservation},
};

use super::ReservationStore;

#[derive(Clone)]
pub struct ReservationsRepository {
    pool: Pool<Postgres>,
}

impl ReservationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReservationStore for ReservationsRepository {
    async fn list_all(&self) -> AppResult<Vec<Reservation>> {
        let reservations = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT id, book_id, user_id, checkout_date, return_date
            FROM reservations
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        if reservations.is_empty() {
            return Err(AppError::NotFound("No reservations recorded".to_string()));
        }

        Ok(reservations)
    }

    async fn get_by_id(&self, id: i64) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>(
            "SELECT id, book_id, user_id, checkout_date, return_date FROM reservations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Reservation with id {} not found", id)))
    }

    async fn save(&self, reservation: NewReservation) -> AppResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO reservations (book_id, user_id, checkout_date)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(reservation.book_id)
        .bind(reservation.user_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_return_date(&self, id: i64) -> AppResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE reservations
            SET return_date = $1
            WHERE id = $2 AND return_date IS NULL
            "#,
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        // Nothing updated: either the row is missing or it was already closed
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM reservations WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        if exists {
            Err(AppError::AlreadyCompleted)
        } else {
            Err(AppError::NotFound(format!("Reservation with id {} not found", id)))
        }
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

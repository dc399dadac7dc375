//! Reservation endpoints

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{Book, Reservation},
    AppState,
};

use super::AuthenticatedUser;

/// Create reservation request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReservationRequest {
    /// Catalog id of the book to reserve
    pub book_id: i64,
}

/// Plain status message
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn json(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

/// List all reservations
#[utoipa::path(
    get,
    path = "/reservations",
    tag = "reservations",
    responses(
        (status = 200, description = "All reservations", body = Vec<Reservation>),
        (status = 500, description = "Could not fetch reservations", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_reservations(State(state): State<AppState>) -> AppResult<Json<Vec<Reservation>>> {
    let reservations = state.services.reservations.list_reservations().await?;
    Ok(Json(reservations))
}

/// List the book catalog from the book service
#[utoipa::path(
    get,
    path = "/reservations/books",
    tag = "reservations",
    responses(
        (status = 200, description = "Catalog entries", body = Vec<Book>),
        (status = 500, description = "Book service failure", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.reservations.list_catalog().await?;
    Ok(Json(books))
}

/// Reserve a book for the authenticated user
#[utoipa::path(
    post,
    path = "/reservations",
    tag = "reservations",
    security(("bearer_auth" = [])),
    request_body = CreateReservationRequest,
    responses(
        (status = 201, description = "Reservation added", body = MessageResponse),
        (status = 400, description = "Malformed body or book not available", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorResponse),
        (status = 500, description = "Book service or storage failure", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_reservation(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    payload: Result<Json<CreateReservationRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let Json(request) = payload.map_err(|e| {
        tracing::debug!("Rejected reservation body: {}", e);
        AppError::BadRequest("Could not parse request data!".to_string())
    })?;

    state
        .services
        .reservations
        .create_reservation(request.book_id, user_id)
        .await?;

    Ok((StatusCode::CREATED, MessageResponse::json("Reservation added!")))
}

/// Complete (return) a reservation owned by the authenticated user
#[utoipa::path(
    post,
    path = "/reservations/{id}",
    tag = "reservations",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Reservation ID")
    ),
    responses(
        (status = 200, description = "Reservation completed", body = MessageResponse),
        (status = 400, description = "Malformed id or already completed", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorResponse),
        (status = 403, description = "Reservation belongs to another user", body = crate::error::ErrorResponse),
        (status = 500, description = "Book service or storage failure", body = crate::error::ErrorResponse)
    )
)]
pub async fn complete_reservation(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    reservation_id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Path(reservation_id) = reservation_id
        .map_err(|_| AppError::BadRequest("Could not parse reservationId!".to_string()))?;

    state
        .services
        .reservations
        .complete_reservation(reservation_id, user_id)
        .await?;

    Ok(MessageResponse::json("Reservation copmleted!"))
}

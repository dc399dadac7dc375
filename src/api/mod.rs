//! API handlers for the reservation REST endpoints

pub mod health;
pub mod openapi;
pub mod reservations;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, AppState};

/// Extractor for the authenticated caller's user id
pub struct AuthenticatedUser(pub i64);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let credential = parts
            .headers
            .get(AUTHORIZATION)
            .map(|value| {
                value
                    .to_str()
                    .map_err(|_| AppError::InvalidCredential("Authorization header is not valid ASCII".to_string()))
            })
            .transpose()?;

        let user_id = state.services.auth.verify(credential)?;
        Ok(AuthenticatedUser(user_id))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Reservations
        .route("/reservations", get(reservations::list_reservations))
        .route("/reservations", post(reservations::create_reservation))
        // POST falls through to completion so `books` is rejected as an id
        .route(
            "/reservations/books",
            get(reservations::list_books).post(reservations::complete_reservation),
        )
        .route("/reservations/:id", post(reservations::complete_reservation))
        .with_state(state);

    Router::new()
        .merge(api)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

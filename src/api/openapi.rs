//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{health, reservations};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Reservation API",
        version = "1.0.0",
        description = "Library book reservation REST API"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Reservations
        reservations::list_reservations,
        reservations::list_books,
        reservations::create_reservation,
        reservations::complete_reservation,
    ),
    components(
        schemas(
            reservations::CreateReservationRequest,
            reservations::MessageResponse,
            crate::models::Reservation,
            crate::models::Book,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "reservations", description = "Book reservation lifecycle")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

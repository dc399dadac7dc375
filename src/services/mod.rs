//! Business logic services

pub mod auth;
pub mod books;
pub mod reservations;

use std::sync::Arc;

use crate::{config::AuthConfig, repository::ReservationStore};

use books::BookCatalog;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub reservations: reservations::ReservationsService,
    store: Arc<dyn ReservationStore>,
}

impl Services {
    /// Create all services with the given collaborators
    pub fn new(
        store: Arc<dyn ReservationStore>,
        books: Arc<dyn BookCatalog>,
        auth_config: &AuthConfig,
    ) -> Self {
        Self {
            auth: auth::AuthService::new(auth_config),
            reservations: reservations::ReservationsService::new(store.clone(), books),
            store,
        }
    }

    /// Store connectivity, for readiness checks
    pub async fn ping_store(&self) -> crate::error::AppResult<()> {
        self.store.ping().await
    }
}

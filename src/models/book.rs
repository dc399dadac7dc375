//! Book view owned by the inventory service

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Catalog entry as returned by the book service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Book {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub publication_year: i64,
    pub available_copies: i64,
}

impl Book {
    pub fn is_available(&self) -> bool {
        self.available_copies >= 1
    }
}

/// Body of the available-copies update sent to the book service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableCopiesUpdate {
    pub book_id: i64,
    pub available_copies: i64,
}

//! Client for the external book inventory service

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::{
    config::BookServiceConfig,
    error::{AppError, AppResult},
    models::{AvailableCopiesUpdate, Book},
};

/// Book inventory capability used by the reservation workflow
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookCatalog: Send + Sync {
    async fn list_books(&self) -> AppResult<Vec<Book>>;

    async fn get_book(&self, id: i64) -> AppResult<Book>;

    /// Overwrite the available-copy count; no check against the previous value
    async fn set_available_copies(&self, id: i64, available_copies: i64) -> AppResult<()>;
}

/// HTTP implementation talking to `GET /books/`, `GET /books/{id}` and `PUT /books/{id}`
#[derive(Clone)]
pub struct HttpBookClient {
    client: Client,
    base_url: String,
}

impl HttpBookClient {
    pub fn new(config: &BookServiceConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::UpstreamUnavailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url(),
        })
    }

    fn books_url(&self) -> String {
        format!("{}/books/", self.base_url)
    }

    fn book_url(&self, id: i64) -> String {
        format!("{}/books/{}", self.base_url, id)
    }

    async fn fetch<T: DeserializeOwned>(&self, url: String) -> AppResult<T> {
        tracing::debug!("GET {}", url);

        let response = self.client.get(&url).send().await.map_err(transport_error)?;
        let response = ensure_ok(response)?;

        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                transport_error(e)
            } else {
                AppError::DecodeError(e.to_string())
            }
        })
    }
}

#[async_trait]
impl BookCatalog for HttpBookClient {
    async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.fetch(self.books_url()).await
    }

    async fn get_book(&self, id: i64) -> AppResult<Book> {
        self.fetch(self.book_url(id)).await
    }

    async fn set_available_copies(&self, id: i64, available_copies: i64) -> AppResult<()> {
        let url = self.book_url(id);
        tracing::debug!("PUT {} available_copies={}", url, available_copies);

        let response = self
            .client
            .put(&url)
            .json(&AvailableCopiesUpdate {
                book_id: id,
                available_copies,
            })
            .send()
            .await
            .map_err(transport_error)?;

        ensure_ok(response)?;
        Ok(())
    }
}

fn ensure_ok(response: reqwest::Response) -> AppResult<reqwest::Response> {
    let status = response.status();
    if status != StatusCode::OK {
        tracing::warn!("Book service answered {} for {}", status, response.url());
        return Err(AppError::UpstreamError {
            status: status.as_u16(),
        });
    }
    Ok(response)
}

fn transport_error(e: reqwest::Error) -> AppError {
    if e.is_decode() {
        AppError::DecodeError(e.to_string())
    } else {
        AppError::UpstreamUnavailable(e.to_string())
    }
}

/// In-memory catalog, used in tests and local runs without the book service
#[derive(Default)]
pub struct InMemoryBookCatalog {
    books: Mutex<BTreeMap<i64, Book>>,
}

impl InMemoryBookCatalog {
    pub fn new(books: Vec<Book>) -> Self {
        Self {
            books: Mutex::new(books.into_iter().map(|b| (b.id, b)).collect()),
        }
    }

    /// Current copy count, `None` for unknown books
    pub fn available_copies(&self, id: i64) -> Option<i64> {
        self.lock().get(&id).map(|b| b.available_copies)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<i64, Book>> {
        self.books.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BookCatalog for InMemoryBookCatalog {
    async fn list_books(&self) -> AppResult<Vec<Book>> {
        Ok(self.lock().values().cloned().collect())
    }

    async fn get_book(&self, id: i64) -> AppResult<Book> {
        self.lock()
            .get(&id)
            .cloned()
            .ok_or(AppError::UpstreamError { status: 404 })
    }

    async fn set_available_copies(&self, id: i64, available_copies: i64) -> AppResult<()> {
        let mut books = self.lock();
        let book = books.get_mut(&id).ok_or(AppError::UpstreamError { status: 404 })?;
        book.available_copies = available_copies;
        Ok(())
    }
}

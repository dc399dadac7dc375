//! Reservation lifecycle workflow
//!
//! Creation and completion each touch the local store and the book service
//! in sequence, without a shared transaction. When the inventory update fails
//! after the local write has succeeded, the local write is kept and the
//! failure is reported to the caller.

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult, ResultExt},
    models::{Book, NewReservation, Reservation},
    repository::ReservationStore,
};

use super::books::BookCatalog;

const FETCH_BOOK_FAILED: &str = "Could not fetch book!";
const UPDATE_COPIES_FAILED: &str = "Failed to update the number of book copies in book service";

#[derive(Clone)]
pub struct ReservationsService {
    store: Arc<dyn ReservationStore>,
    books: Arc<dyn BookCatalog>,
}

impl ReservationsService {
    pub fn new(store: Arc<dyn ReservationStore>, books: Arc<dyn BookCatalog>) -> Self {
        Self { store, books }
    }

    pub async fn list_reservations(&self) -> AppResult<Vec<Reservation>> {
        self.store
            .list_all()
            .await
            .storage_failure("Could not fetch reservations!")
    }

    pub async fn list_catalog(&self) -> AppResult<Vec<Book>> {
        self.books.list_books().await.dependency_failure("Could not get books!")
    }

    /// Reserve a copy of `book_id` for `user_id`
    pub async fn create_reservation(&self, book_id: i64, user_id: i64) -> AppResult<()> {
        let book = self.books.get_book(book_id).await.dependency_failure(FETCH_BOOK_FAILED)?;

        if !book.is_available() {
            tracing::info!("Book {} has no available copies", book_id);
            return Err(AppError::NotAvailable);
        }

        self.store
            .save(NewReservation { book_id, user_id })
            .await
            .storage_failure("Could not add reservation!")?;

        tracing::info!("Reservation recorded for book {} by user {}", book_id, user_id);

        if let Err(e) = self.books.set_available_copies(book.id, book.available_copies - 1).await {
            tracing::warn!(
                "Reservation for book {} by user {} is persisted but the copy count was not decremented: {}",
                book_id,
                user_id,
                e
            );
            return Err(e).dependency_failure(UPDATE_COPIES_FAILED);
        }

        Ok(())
    }

    /// Close `reservation_id` on behalf of `user_id` and give the copy back
    pub async fn complete_reservation(&self, reservation_id: i64, user_id: i64) -> AppResult<()> {
        let reservation = self
            .store
            .get_by_id(reservation_id)
            .await
            .storage_failure("Could not fetch reservation!")?;

        if !reservation.is_owned_by(user_id) {
            tracing::info!(
                "User {} attempted to complete reservation {} owned by user {}",
                user_id,
                reservation_id,
                reservation.user_id
            );
            return Err(AppError::Forbidden);
        }

        if reservation.is_completed() {
            return Err(AppError::AlreadyCompleted);
        }

        match self.store.set_return_date(reservation_id).await {
            Ok(()) => {}
            // Lost a race with a concurrent completion
            Err(AppError::AlreadyCompleted) => return Err(AppError::AlreadyCompleted),
            Err(e) => return Err(e).storage_failure("Could not copmlete reservation!"),
        }

        tracing::info!("Reservation {} returned by user {}", reservation_id, user_id);

        let book = match self.books.get_book(reservation.book_id).await {
            Ok(book) => book,
            Err(e) => {
                self.warn_not_restocked(&reservation, &e);
                return Err(e).dependency_failure(FETCH_BOOK_FAILED);
            }
        };

        let restocked = match book.available_copies.checked_add(1) {
            Some(count) => count,
            None => {
                let e = AppError::DecodeError(format!(
                    "book {} reports an out-of-range copy count {}",
                    book.id, book.available_copies
                ));
                self.warn_not_restocked(&reservation, &e);
                return Err(e).dependency_failure(UPDATE_COPIES_FAILED);
            }
        };

        if let Err(e) = self.books.set_available_copies(book.id, restocked).await {
            self.warn_not_restocked(&reservation, &e);
            return Err(e).dependency_failure(UPDATE_COPIES_FAILED);
        }

        Ok(())
    }

    fn warn_not_restocked(&self, reservation: &Reservation, e: &AppError) {
        tracing::warn!(
            "Reservation {} is returned but book {} copy count was not incremented: {}",
            reservation.id,
            reservation.book_id,
            e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        repository::{InMemoryReservationStore, MockReservationStore},
        services::books::{InMemoryBookCatalog, MockBookCatalog},
    };
    use axum::http::StatusCode;
    use chrono::Utc;
    use tokio_test::{assert_err, assert_ok};

    fn book(id: i64, available_copies: i64) -> Book {
        Book {
            id,
            title: format!("Book_{}", id),
            author: "Author".to_string(),
            isbn: "978-0".to_string(),
            publication_year: 1999,
            available_copies,
        }
    }

    fn reservation(id: i64, book_id: i64, user_id: i64, returned: bool) -> Reservation {
        Reservation {
            id,
            book_id,
            user_id,
            checkout_date: Utc::now(),
            return_date: returned.then(Utc::now),
        }
    }

    struct Env {
        store: Arc<InMemoryReservationStore>,
        books: Arc<InMemoryBookCatalog>,
        service: ReservationsService,
    }

    fn env(reservations: Vec<Reservation>, books: Vec<Book>) -> Env {
        let store = Arc::new(InMemoryReservationStore::with_reservations(reservations));
        let books = Arc::new(InMemoryBookCatalog::new(books));
        let service = ReservationsService::new(store.clone(), books.clone());
        Env { store, books, service }
    }

    #[tokio::test]
    async fn create_persists_and_decrements() {
        let env = env(vec![], vec![book(1, 1)]);

        assert_ok!(env.service.create_reservation(1, 1).await);

        let saved = env.store.get_by_id(1).await.unwrap();
        assert_eq!((saved.book_id, saved.user_id), (1, 1));
        assert!(saved.return_date.is_none());
        assert_eq!(env.books.available_copies(1), Some(0));
    }

    #[tokio::test]
    async fn create_for_unavailable_book_writes_nothing() {
        let env = env(vec![], vec![book(1, 0)]);

        let err = assert_err!(env.service.create_reservation(1, 1).await);
        assert!(matches!(err, AppError::NotAvailable));
        assert!(env.store.snapshot().is_empty());
        assert_eq!(env.books.available_copies(1), Some(0));
    }

    #[tokio::test]
    async fn create_for_unknown_book_is_dependency_failure() {
        let env = env(vec![], vec![]);

        let err = assert_err!(env.service.create_reservation(18, 1).await);
        assert!(matches!(err, AppError::DependencyFailure { context: FETCH_BOOK_FAILED, .. }));
        assert!(env.store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn create_storage_failure_leaves_inventory_alone() {
        let mut store = MockReservationStore::new();
        store
            .expect_save()
            .returning(|_| Err(AppError::StorageUnavailable(sqlx::Error::PoolTimedOut)));

        let mut books = MockBookCatalog::new();
        books.expect_get_book().returning(|id| Ok(book(id, 2)));
        books.expect_set_available_copies().never();

        let service = ReservationsService::new(Arc::new(store), Arc::new(books));
        let err = assert_err!(service.create_reservation(1, 1).await);
        assert_eq!(err.to_string(), "Could not add reservation!");
    }

    #[tokio::test]
    async fn create_keeps_reservation_when_inventory_update_fails() {
        let store = Arc::new(InMemoryReservationStore::new());

        let mut books = MockBookCatalog::new();
        books.expect_get_book().returning(|id| Ok(book(id, 1)));
        books
            .expect_set_available_copies()
            .withf(|id, copies| *id == 1 && *copies == 0)
            .times(1)
            .returning(|_, _| Err(AppError::UpstreamUnavailable("connection refused".to_string())));

        let service = ReservationsService::new(store.clone(), Arc::new(books));
        let err = assert_err!(service.create_reservation(1, 3).await);

        assert!(matches!(err, AppError::DependencyFailure { context: UPDATE_COPIES_FAILED, .. }));
        let rows = store.snapshot();
        assert_eq!(rows.len(), 1);
        assert_eq!((rows[0].book_id, rows[0].user_id), (1, 3));
    }

    #[tokio::test]
    async fn complete_sets_return_date_and_restocks() {
        let env = env(vec![reservation(1, 1, 1, false)], vec![book(1, 1)]);

        assert_ok!(env.service.complete_reservation(1, 1).await);

        let closed = env.store.get_by_id(1).await.unwrap();
        assert!(closed.return_date.unwrap() >= closed.checkout_date);
        assert_eq!(env.books.available_copies(1), Some(2));
    }

    #[tokio::test]
    async fn complete_by_other_user_is_forbidden() {
        let env = env(vec![reservation(1, 1, 2, false)], vec![book(1, 1)]);

        let err = assert_err!(env.service.complete_reservation(1, 1).await);
        assert!(matches!(err, AppError::Forbidden));
        assert!(env.store.get_by_id(1).await.unwrap().return_date.is_none());
        assert_eq!(env.books.available_copies(1), Some(1));
    }

    #[tokio::test]
    async fn complete_twice_is_rejected() {
        let env = env(vec![reservation(1, 1, 1, true)], vec![book(1, 1)]);
        let before = env.store.get_by_id(1).await.unwrap().return_date;

        let err = assert_err!(env.service.complete_reservation(1, 1).await);
        assert!(matches!(err, AppError::AlreadyCompleted));
        assert_eq!(env.store.get_by_id(1).await.unwrap().return_date, before);
        assert_eq!(env.books.available_copies(1), Some(1));
    }

    #[tokio::test]
    async fn complete_unknown_reservation() {
        let env = env(vec![reservation(1, 1, 1, false)], vec![book(1, 1)]);

        let err = assert_err!(env.service.complete_reservation(2, 1).await);
        assert_eq!(err.to_string(), "Could not fetch reservation!");
    }

    #[tokio::test]
    async fn complete_keeps_return_date_when_book_service_fails() {
        let store = Arc::new(InMemoryReservationStore::with_reservations(vec![reservation(
            1, 4, 1, false,
        )]));

        let mut books = MockBookCatalog::new();
        books
            .expect_get_book()
            .returning(|_| Err(AppError::UpstreamError { status: 503 }));
        books.expect_set_available_copies().never();

        let service = ReservationsService::new(store.clone(), Arc::new(books));
        let err = assert_err!(service.complete_reservation(1, 1).await);

        assert!(matches!(err, AppError::DependencyFailure { context: FETCH_BOOK_FAILED, .. }));
        assert!(store.get_by_id(1).await.unwrap().return_date.is_some());
    }

    #[tokio::test]
    async fn complete_reports_failed_restock() {
        let store = Arc::new(InMemoryReservationStore::with_reservations(vec![reservation(
            1, 4, 1, false,
        )]));

        let mut books = MockBookCatalog::new();
        books.expect_get_book().returning(|id| Ok(book(id, 0)));
        books
            .expect_set_available_copies()
            .withf(|id, copies| *id == 4 && *copies == 1)
            .returning(|_, _| Err(AppError::UpstreamError { status: 500 }));

        let service = ReservationsService::new(store.clone(), Arc::new(books));
        let err = assert_err!(service.complete_reservation(1, 1).await);

        assert!(matches!(err, AppError::DependencyFailure { context: UPDATE_COPIES_FAILED, .. }));
        assert!(store.get_by_id(1).await.unwrap().return_date.is_some());
    }

    #[tokio::test]
    async fn complete_race_lost_is_already_completed() {
        let mut store = MockReservationStore::new();
        store
            .expect_get_by_id()
            .returning(|id| Ok(reservation(id, 1, 1, false)));
        store
            .expect_set_return_date()
            .returning(|_| Err(AppError::AlreadyCompleted));

        let mut books = MockBookCatalog::new();
        books.expect_get_book().never();

        let service = ReservationsService::new(Arc::new(store), Arc::new(books));
        let err = assert_err!(service.complete_reservation(1, 1).await);
        assert!(matches!(err, AppError::AlreadyCompleted));
    }

    #[tokio::test]
    async fn complete_storage_failure_skips_restock() {
        let mut store = MockReservationStore::new();
        store
            .expect_get_by_id()
            .returning(|id| Ok(reservation(id, 1, 1, false)));
        store
            .expect_set_return_date()
            .returning(|_| Err(AppError::StorageUnavailable(sqlx::Error::PoolTimedOut)));

        let mut books = MockBookCatalog::new();
        books.expect_get_book().never();
        books.expect_set_available_copies().never();

        let service = ReservationsService::new(Arc::new(store), Arc::new(books));
        let err = assert_err!(service.complete_reservation(1, 1).await);

        assert!(matches!(
            err,
            AppError::StorageFailure { context: "Could not copmlete reservation!", .. }
        ));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn complete_rejects_out_of_range_copy_count() {
        let store = Arc::new(InMemoryReservationStore::with_reservations(vec![reservation(
            1, 4, 1, false,
        )]));

        let mut books = MockBookCatalog::new();
        books.expect_get_book().returning(|id| Ok(book(id, i64::MAX)));
        books.expect_set_available_copies().never();

        let service = ReservationsService::new(store.clone(), Arc::new(books));
        let err = assert_err!(service.complete_reservation(1, 1).await);

        match err {
            AppError::DependencyFailure { context, source } => {
                assert_eq!(context, UPDATE_COPIES_FAILED);
                assert!(matches!(*source, AppError::DecodeError(_)));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(store.get_by_id(1).await.unwrap().return_date.is_some());
    }

    #[tokio::test]
    async fn list_catalog_upstream_failure() {
        let mut books = MockBookCatalog::new();
        books
            .expect_list_books()
            .returning(|| Err(AppError::UpstreamUnavailable("connection refused".to_string())));

        let service = ReservationsService::new(Arc::new(MockReservationStore::new()), Arc::new(books));
        let err = assert_err!(service.list_catalog().await);

        assert!(matches!(
            err,
            AppError::DependencyFailure { context: "Could not get books!", .. }
        ));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn list_reservations_on_empty_store_fails() {
        let env = env(vec![], vec![]);

        let err = assert_err!(env.service.list_reservations().await);
        assert_eq!(err.to_string(), "Could not fetch reservations!");
        assert!(err.is_server_error());
    }

    #[tokio::test]
    async fn list_catalog_passes_books_through() {
        let env = env(vec![], vec![book(1, 1), book(2, 5)]);

        let books = env.service.list_catalog().await.unwrap();
        assert_eq!(books.iter().map(|b| b.id).collect::<Vec<_>>(), vec![1, 2]);
    }
}

//! Data models for the reservation server

pub mod book;
pub mod reservation;
pub mod user;

// Re-export commonly used types
pub use book::{AvailableCopiesUpdate, Book};
pub use reservation::{NewReservation, Reservation};
pub use user::UserClaims;

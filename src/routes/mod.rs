pub mod auth;
pub mod listing;
pub mod booking;
pub mod shifting;
pub mod payment;
pub mod admin;

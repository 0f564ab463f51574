//! Business logic services.
//!
//! - `auth` - Registration, login and vendor stall upkeep
//! - `token` - Session token issuing and verification
//! - `uploads` - Local storage for uploaded images

pub mod auth;
pub mod token;
pub mod uploads;

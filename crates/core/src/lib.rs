//! Stall Market Core - Shared types library.
//!
//! This crate provides the domain vocabulary used by every Stall Market component:
//! - `api` - HTTP service for accounts, stalls, products and images
//! - `cli` - Command-line tools for migrations and seed data
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP handling. With the `postgres` feature enabled the types also
//! implement the `sqlx` encoding traits so repositories can bind them directly.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, account roles, prices and image kinds

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

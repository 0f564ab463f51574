//! Stall Market API library.
//!
//! Accounts, session tokens and the one-stall-per-vendor rule, plus the
//! stall, product and image routes built on them. The binary in `main.rs`
//! only wires configuration and logging around [`routes::app`], so the whole
//! service can be driven in tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

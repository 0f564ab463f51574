//! Core types for Stall Market.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod image;
pub mod price;
pub mod role;

pub use email::{Email, EmailError};
pub use id::*;
pub use image::{ImageEntity, ImageType};
pub use price::{Price, PriceError};
pub use role::{Role, RoleError};

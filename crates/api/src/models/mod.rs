//! Domain models for the marketplace.
//!
//! These are validated domain objects, separate from the row types the
//! repositories decode from `PostgreSQL`.

pub mod image;
pub mod product;
pub mod stall;
pub mod user;

pub use image::Image;
pub use product::{NewProduct, Product, ProductChanges};
pub use stall::{NewStall, Stall, StallCard, StallSummary};
pub use user::{User, UserRecord, UserSummary};

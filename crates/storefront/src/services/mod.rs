//! Business logic services for storefront.
//!
//! # Services
//!
//! - `cart` - Cart store (stock-checked add/remove/update with persistence)

pub mod cart;

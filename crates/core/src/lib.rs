//! RocketShoes Core - Shared types library.
//!
//! This crate provides the domain types used across the RocketShoes crates:
//! - `storefront` - Catalog and cart pages plus the cart store
//! - `integration-tests` - End-to-end tests against a fake catalog service
//!
//! # Architecture
//!
//! The core crate contains only types and pure operations - no I/O, no HTTP
//! clients, no storage. Cart transitions are expressed as functions returning a
//! new [`Cart`], so callers can persist a candidate before committing it.
//!
//! # Modules
//!
//! - [`types`] - Product ids, prices, catalog records and the cart sequence

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

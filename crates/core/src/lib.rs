//! Record Store Core - Shared domain types.
//!
//! This crate provides the types used across the record store components:
//! - `storefront` - JSON API for catalog browsing, reviews and ordering
//! - `cli` - Command-line tools for migrations, seeding and maintenance
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Database encoding is opt-in through the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, zip codes, ratings, order states and money helpers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

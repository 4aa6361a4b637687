//! Record store storefront library.
//!
//! The JSON API for the catalog, reviews, customer profiles and orders,
//! exposed as a library so the binary, the CLI and the contract tests
//! share one router and one storage layer.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;

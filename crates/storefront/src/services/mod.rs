//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Bearer token verification (tokens come from the identity service)
//! - `email` - Payment instruction emails (SMTP or log)
//! - `ordering` - Order placement with the post-commit bank transfer email

pub mod auth;
pub mod email;
pub mod ordering;

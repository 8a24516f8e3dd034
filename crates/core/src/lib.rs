//! Vitrine Core - Shared types library.
//!
//! This crate provides common types used across all Vitrine components:
//! - `storefront` - Public-facing storefront server and cart resolver
//! - `cli` - Command-line tools for migrations and cart operations
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Cart IDs, profile identifiers, and cart statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

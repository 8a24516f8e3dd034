//! Core types for Vitrine.
//!
//! This module provides type-safe wrappers for the cart domain.

pub mod id;
pub mod profile;
pub mod status;

pub use id::CartId;
pub use profile::{ProfileId, ProfileIdError};
pub use status::*;

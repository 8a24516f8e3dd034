//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Access token verification with the authentication provider
//! - `cart` - Active-cart acquisition (get-or-create with conflict recovery)

pub mod auth;
pub mod cart;

pub use auth::{AccessTokenVerifier, AuthError};
pub use cart::{CartError, CartResolution, CartResolver, ProfileWait};

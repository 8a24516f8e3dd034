//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Cart (requires auth)
//! POST /api/cart/active        - Get or create the user's active cart
//!
//! # Auth
//! POST /auth/session           - Exchange a bearer access token for a session
//! POST /auth/logout            - Logout action
//! ```

pub mod auth;
pub mod cart;

use axum::{Router, routing::post};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/session", post(auth::establish_session))
        .route("/logout", post(auth::logout))
}

/// Create the cart API routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new().route("/active", post(cart::active))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/cart", cart_routes())
        .nest("/auth", auth_routes())
}

//! Session middleware configuration.
//!
//! Sessions live in `tower_sessions.session` of the storefront database. The
//! session cookie is signed with a key derived from the session secret.

use sqlx::PgPool;
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "vitrine_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// The session table is created by the storefront migrations.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
    key: Key,
) -> SessionManagerLayer<PostgresStore, SignedCookie> {
    session_layer(PostgresStore::new(pool.clone()), &config.base_url, key)
}

/// Apply the storefront cookie policy to a session layer over any store.
///
/// The cookie is only marked `Secure` when the storefront is served over HTTPS.
/// Cookies whose signature does not verify under `key` are ignored.
#[must_use]
pub fn session_layer<S: SessionStore + Clone>(
    store: S,
    base_url: &str,
    key: Key,
) -> SessionManagerLayer<S, SignedCookie> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(base_url.starts_with("https://"))
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key)
}

//! Authentication route handlers.
//!
//! Sign-in happens at the authentication provider. A client holding a
//! provider access token can exchange it for a storefront session.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use tower_sessions::Session;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};

/// Establish a session for the bearer of a valid access token.
///
/// The session id is rotated so a pre-existing cookie cannot be fixated.
pub async fn establish_session(
    RequireAuth(user): RequireAuth,
    session: Session,
) -> Result<StatusCode> {
    session.cycle_id().await?;
    set_current_user(&session, &user).await?;
    set_sentry_user(&user.id, user.email.as_deref());

    tracing::info!(profile_id = %user.id, "User signed in");

    Ok(StatusCode::NO_CONTENT)
}

/// Handle logout.
///
/// Clears the user from the session, destroys the session and redirects home.
pub async fn logout(OptionalAuth(user): OptionalAuth, session: Session) -> Response {
    if let Some(user) = user {
        tracing::info!(profile_id = %user.id, "User signed out");
    }

    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }

    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {}", e);
    }

    clear_sentry_user();

    Redirect::to("/").into_response()
}

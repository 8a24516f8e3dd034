//! Authentication extractors.
//!
//! A request is authenticated by a provider-issued access token in the
//! `Authorization: Bearer` header, or by a session established from such a
//! token via `POST /auth/session`.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{HeaderValue, StatusCode, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};
use crate::services::AuthError;
use crate::state::AppState;

/// Seconds a client should wait before retrying when the provider is down.
const AUTH_RETRY_AFTER_SECS: &str = "1";

/// Extractor that requires an authenticated user.
///
/// A bearer token, when present, takes precedence over the session and must be
/// valid. API requests without a user get `401 Unauthorized`; page requests
/// are redirected to the home page.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.id)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but no user is signed in.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to the home page (for HTML requests).
    RedirectHome,
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// The authentication provider could not verify the token right now.
    Unavailable,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectHome => Redirect::to("/").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                [(header::RETRY_AFTER, HeaderValue::from_static(AUTH_RETRY_AFTER_SECS))],
            )
                .into_response(),
        }
    }
}

/// Extract the token of an `Authorization: Bearer` header.
///
/// `Some("")` for a header that is present but not a bearer credential.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?;
    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map_or("", str::trim);
    Some(token)
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(token) = bearer_token(parts) {
            return match state.tokens().verify(token).await {
                Ok(user) => Ok(Self(user)),
                Err(AuthError::InvalidToken | AuthError::Malformed(_)) => {
                    Err(AuthRejection::Unauthorized)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Access token verification failed");
                    Err(AuthRejection::Unavailable)
                }
            };
        }

        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| {
                // Nested routers see a stripped path
                let uri = parts
                    .extensions
                    .get::<OriginalUri>()
                    .map_or(&parts.uri, |original| &original.0);
                if uri.path().starts_with("/api/") {
                    AuthRejection::Unauthorized
                } else {
                    AuthRejection::RedirectHome
                }
            })?;

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is signed in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Helper to set the current user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_with(authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/cart/active");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&parts_with(None)), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&parts_with(Some("Basic dXNlcjpwdw=="))), Some(""));
    }

    #[test]
    fn test_unavailable_rejection_asks_client_to_retry() {
        let response = AuthRejection::Unavailable.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "1");
    }
}

//! Access token verification against the authentication provider.
//!
//! The provider issues access tokens at sign-in. The storefront never decodes
//! them itself; it asks the provider who the token belongs to:
//!
//! ```text
//! GET /auth/v1/user    (Authorization: Bearer {access token})
//! ```

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use vitrine_core::ProfileId;

use crate::config::AuthConfig;
use crate::models::CurrentUser;

/// Errors from access token verification.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The provider does not accept the token (expired, revoked, forged).
    #[error("access token rejected")]
    InvalidToken,

    /// The provider could not be asked.
    #[error("authentication provider unavailable: {0}")]
    Unavailable(String),

    /// The provider answered with something that is not a usable user.
    #[error("unexpected provider response: {0}")]
    Malformed(String),

    /// The verifier could not be constructed from its configuration.
    #[error("invalid authentication configuration: {0}")]
    Config(String),
}

/// User record returned by the provider.
#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// Verifies bearer access tokens with the authentication provider.
#[derive(Clone)]
pub struct AccessTokenVerifier {
    client: reqwest::Client,
    user_url: Url,
}

impl AccessTokenVerifier {
    /// Create a verifier for the configured provider.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Config` if the API key is not a valid header value,
    /// the base URL cannot carry a path, or the HTTP client fails to build.
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(config.api_key.expose_secret())
                .map_err(|e| AuthError::Config(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| AuthError::Config(format!("failed to build HTTP client: {e}")))?;

        let mut user_url = config.base_url.clone();
        user_url
            .path_segments_mut()
            .map_err(|()| AuthError::Config(format!("invalid base URL: {}", config.base_url)))?
            .pop_if_empty()
            .extend(["auth", "v1", "user"]);

        Ok(Self { client, user_url })
    }

    /// Resolve an access token to the user it was issued to.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` when the provider refuses the token,
    /// `AuthError::Unavailable` when it cannot be reached or fails, and
    /// `AuthError::Malformed` when its answer carries no usable user id.
    #[instrument(skip_all)]
    pub async fn verify(&self, token: &str) -> Result<CurrentUser, AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        let response = self
            .client
            .get(self.user_url.clone())
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                tracing::debug!("Access token rejected by provider");
                return Err(AuthError::InvalidToken);
            }
            status => {
                tracing::warn!(%status, "Authentication provider error");
                return Err(AuthError::Unavailable(format!("provider answered {status}")));
            }
        }

        let user: ProviderUser = response
            .json()
            .await
            .map_err(|e| AuthError::Malformed(e.to_string()))?;
        let id = ProfileId::parse(&user.id).map_err(|e| AuthError::Malformed(e.to_string()))?;

        Ok(CurrentUser {
            id,
            email: user.email,
        })
    }
}

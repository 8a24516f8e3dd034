//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use vitrine_core::ProfileId;

/// Session-stored user identity.
///
/// Built from a verified access token; stored by `POST /auth/session` and
/// cleared on sign-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Identifier issued by the authentication provider.
    pub id: ProfileId,
    /// User's email address, if the provider shared it.
    pub email: Option<String>,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}

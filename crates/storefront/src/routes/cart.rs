//! Cart route handlers.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use vitrine_core::CartId;

use crate::error::{AppError, Result, add_breadcrumb, set_sentry_user};
use crate::middleware::RequireAuth;
use crate::services::CartResolution;
use crate::state::AppState;

/// Response body of `POST /api/cart/active`.
#[derive(Debug, Serialize)]
pub struct ActiveCartResponse {
    pub cart_id: CartId,
}

/// Return the signed-in user's active cart, creating it on first use.
///
/// Responds `503` with `Retry-After` when the failure is transient and `500`
/// otherwise.
#[instrument(skip(state, user), fields(profile_id = %user.id))]
pub async fn active(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<ActiveCartResponse>> {
    set_sentry_user(&user.id, user.email.as_deref());

    match state.carts().resolve(&user.id).await {
        CartResolution::Resolved(cart_id) => {
            let id = cart_id.to_string();
            add_breadcrumb(
                "cart",
                "Resolved active cart",
                Some(&[("cart_id", id.as_str())][..]),
            );
            Ok(Json(ActiveCartResponse { cart_id }))
        }
        CartResolution::RetryLater(err) | CartResolution::Failed(err) => {
            Err(AppError::CartUnavailable(err))
        }
    }
}

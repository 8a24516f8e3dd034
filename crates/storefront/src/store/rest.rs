//! Hosted REST adapter for the cart store.
//!
//! Talks to the hosted platform's PostgREST endpoint:
//!
//! ```text
//! GET  /rest/v1/profiles?select=id&id=eq.{id}&limit=1
//! GET  /rest/v1/carts?select=...&profile_id=eq.{id}&status=eq.active&order=created_at.desc,id.desc&limit=2
//! POST /rest/v1/carts                     (Prefer: return=representation)
//! ```
//!
//! Error bodies carry the Postgres SQLSTATE in `code`; a lost race surfaces as
//! `409 Conflict` with code `23505`. PostgREST answers `409` for a foreign-key
//! violation (`23503`) too, so a reported code decides and the status is only
//! consulted when the body has none.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use url::Url;

use vitrine_core::{CartId, CartStatus, ProfileId};

use super::{CartStore, StoreError, is_conflict};
use crate::config::RestStoreConfig;
use crate::models::Cart;

/// Columns requested for cart rows.
const CART_COLUMNS: &str = "id,profile_id,status,created_at";

/// Cart store backed by the hosted platform's REST interface.
#[derive(Clone)]
pub struct RestCartStore {
    client: reqwest::Client,
    base_url: Url,
}

impl RestCartStore {
    /// Create a new REST store client.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Rejected` if the API key is not a valid header
    /// value, or `StoreError::Unavailable` if the HTTP client fails to build.
    pub fn new(config: &RestStoreConfig) -> Result<Self, StoreError> {
        let api_key = config.api_key.expose_secret();
        let mut headers = HeaderMap::new();

        headers.insert(
            "apikey",
            HeaderValue::from_str(api_key)
                .map_err(|e| StoreError::Rejected(format!("Invalid API key format: {e}")))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| StoreError::Rejected(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Build the URL of a table endpoint with query parameters.
    fn table_url(&self, table: &str, params: &[(&str, &str)]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::Rejected(format!("invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["rest", "v1", table]);
        url.query_pairs_mut().extend_pairs(params);
        Ok(url)
    }
}

#[async_trait]
impl CartStore for RestCartStore {
    async fn profile_exists(&self, profile_id: &ProfileId) -> Result<bool, StoreError> {
        let id_filter = format!("eq.{profile_id}");
        let url = self.table_url(
            "profiles",
            &[("select", "id"), ("id", &id_filter), ("limit", "1")],
        )?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport_error)?;
        let rows: Vec<IgnoredAny> = read_rows(response).await?;

        Ok(!rows.is_empty())
    }

    async fn active_carts(&self, profile_id: &ProfileId) -> Result<Vec<Cart>, StoreError> {
        let profile_filter = format!("eq.{profile_id}");
        let status_filter = format!("eq.{}", CartStatus::Active);
        let url = self.table_url(
            "carts",
            &[
                ("select", CART_COLUMNS),
                ("profile_id", &profile_filter),
                ("status", &status_filter),
                ("order", "created_at.desc,id.desc"),
                ("limit", "2"),
            ],
        )?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport_error)?;
        let rows: Vec<CartRow> = read_rows(response).await?;

        rows.into_iter().map(Cart::try_from).collect()
    }

    async fn insert_cart(
        &self,
        profile_id: &ProfileId,
        status: CartStatus,
    ) -> Result<Cart, StoreError> {
        let url = self.table_url("carts", &[("select", CART_COLUMNS)])?;
        let body = serde_json::json!({
            "profile_id": profile_id,
            "status": status,
        });

        let response = self
            .client
            .post(url)
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        let rows: Vec<CartRow> = read_rows(response).await?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Malformed("insert returned no rows".to_owned()))?;

        Cart::try_from(row)
    }
}

/// Map a transport-level failure.
fn transport_error(err: reqwest::Error) -> StoreError {
    if err.is_decode() {
        StoreError::Malformed(err.to_string())
    } else {
        StoreError::Unavailable(err.to_string())
    }
}

/// Read a JSON array of rows, classifying non-success responses.
async fn read_rows<T: DeserializeOwned>(response: reqwest::Response) -> Result<Vec<T>, StoreError> {
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(error_from_response(status.as_u16(), &body));
    }

    response
        .json::<Vec<T>>()
        .await
        .map_err(|e| StoreError::Malformed(e.to_string()))
}

/// Error body returned by PostgREST.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Classify a non-success response from the REST interface.
fn error_from_response(status: u16, body: &str) -> StoreError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    let code = parsed.as_ref().and_then(|b| b.code.clone());

    let conflict = match code.as_deref() {
        Some(code) => is_conflict(Some(code), None),
        None => is_conflict(None, Some(status)),
    };
    if conflict {
        return StoreError::Conflict {
            code,
            status: Some(status),
        };
    }

    let message = parsed
        .and_then(|b| b.message)
        .unwrap_or_else(|| body.to_owned());

    match status {
        408 | 429 | 500..=599 => StoreError::Unavailable(format!("{status}: {message}")),
        _ => StoreError::Rejected(format!("{status}: {message}")),
    }
}

#[derive(Debug, Deserialize)]
struct CartRow {
    id: CartId,
    profile_id: String,
    status: CartStatus,
    created_at: DateTime<Utc>,
}

impl TryFrom<CartRow> for Cart {
    type Error = StoreError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        let profile_id = ProfileId::parse(&row.profile_id)
            .map_err(|e| StoreError::Malformed(format!("invalid profile id: {e}")))?;

        Ok(Self {
            id: row.id,
            profile_id,
            status: row.status,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use axum::extract::Query;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use secrecy::SecretString;
    use serde_json::json;

    use super::*;
    use crate::services::{CartError, CartResolution, CartResolver, ProfileWait};

    const TEST_KEY: &str = "k3Y-9fQ2x7Lm4Rt8Zp1Wv6Nb";
    const CART_UUID: &str = "5b0c7d9e-3f1a-4c2b-9d8e-7a6b5c4d3e2f";

    async fn spawn_fake_platform(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    fn store_for(base_url: Url) -> RestCartStore {
        RestCartStore::new(&RestStoreConfig {
            base_url,
            api_key: SecretString::from(TEST_KEY),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn authorized(headers: &AxumHeaders) -> bool {
        headers.get("apikey").and_then(|v| v.to_str().ok()) == Some(TEST_KEY)
            && headers.get("authorization").and_then(|v| v.to_str().ok())
                == Some(&format!("Bearer {TEST_KEY}")[..])
    }

    fn cart_json(id: &str, profile_id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "profile_id": profile_id,
            "status": "active",
            "created_at": "2026-01-05T10:00:00.123456+00:00",
        })
    }

    #[test]
    fn test_error_from_response_conflict_by_status() {
        let err = error_from_response(409, r#"{"message":"duplicate"}"#);
        assert_eq!(
            err,
            StoreError::Conflict {
                code: None,
                status: Some(409)
            }
        );
    }

    #[test]
    fn test_error_from_response_conflict_by_code() {
        let err = error_from_response(
            400,
            r#"{"code":"23505","message":"duplicate key value violates unique constraint"}"#,
        );
        assert!(err.is_conflict());
    }

    #[test]
    fn test_error_from_response_foreign_key_conflict_status_is_rejected() {
        let err = error_from_response(
            409,
            r#"{"code":"23503","message":"insert or update violates foreign key constraint"}"#,
        );
        assert!(matches!(err, StoreError::Rejected(msg) if msg.contains("foreign key")));
    }

    #[test]
    fn test_error_from_response_conflict_status_without_body() {
        assert!(error_from_response(409, "").is_conflict());
    }

    #[test]
    fn test_error_from_response_server_errors_are_transient() {
        assert!(error_from_response(503, "upstream down").is_transient());
        assert!(error_from_response(429, "").is_transient());
        assert!(!error_from_response(401, r#"{"message":"JWT expired"}"#).is_transient());
    }

    #[test]
    fn test_table_url_encodes_filters() {
        let store = store_for(Url::parse("https://example.test/").unwrap());
        let url = store
            .table_url("carts", &[("profile_id", "eq.a b&c"), ("limit", "2")])
            .unwrap();
        assert_eq!(url.path(), "/rest/v1/carts");
        assert_eq!(url.query(), Some("profile_id=eq.a+b%26c&limit=2"));
    }

    #[tokio::test]
    async fn test_profile_exists_against_fake_platform() {
        let router = Router::new().route(
            "/rest/v1/profiles",
            get(
                |headers: AxumHeaders, Query(q): Query<HashMap<String, String>>| async move {
                    if !authorized(&headers) {
                        return StatusCode::UNAUTHORIZED.into_response();
                    }
                    if q.get("id").map(String::as_str) == Some("eq.user-1") {
                        Json(json!([{ "id": "user-1" }])).into_response()
                    } else {
                        Json(json!([])).into_response()
                    }
                },
            ),
        );
        let store = store_for(spawn_fake_platform(router).await);

        assert!(
            store
                .profile_exists(&ProfileId::parse("user-1").unwrap())
                .await
                .unwrap()
        );
        assert!(
            !store
                .profile_exists(&ProfileId::parse("user-2").unwrap())
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_active_carts_parses_rows() {
        let router = Router::new().route(
            "/rest/v1/carts",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                assert_eq!(q.get("status").map(String::as_str), Some("eq.active"));
                Json(json!([cart_json(CART_UUID, "user-1")]))
            }),
        );
        let store = store_for(spawn_fake_platform(router).await);

        let carts = store
            .active_carts(&ProfileId::parse("user-1").unwrap())
            .await
            .unwrap();
        assert_eq!(carts.len(), 1);
        assert_eq!(carts[0].id, CART_UUID.parse::<CartId>().unwrap());
        assert!(carts[0].is_active());
    }

    #[tokio::test]
    async fn test_insert_cart_returns_representation() {
        let router = Router::new().route(
            "/rest/v1/carts",
            axum::routing::post(
                |headers: AxumHeaders, Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(
                        headers.get("prefer").and_then(|v| v.to_str().ok()),
                        Some("return=representation")
                    );
                    assert_eq!(body["status"], "active");
                    let profile = body["profile_id"].as_str().unwrap().to_owned();
                    (StatusCode::CREATED, Json(json!([cart_json(CART_UUID, &profile)])))
                },
            ),
        );
        let store = store_for(spawn_fake_platform(router).await);

        let cart = store
            .insert_cart(&ProfileId::parse("user-9").unwrap(), CartStatus::Active)
            .await
            .unwrap();
        assert_eq!(cart.id.to_string(), CART_UUID);
        assert_eq!(cart.profile_id.as_str(), "user-9");
    }

    #[tokio::test]
    async fn test_insert_cart_conflict() {
        let router = Router::new().route(
            "/rest/v1/carts",
            axum::routing::post(|| async {
                (
                    StatusCode::CONFLICT,
                    Json(json!({
                        "code": "23505",
                        "message": "duplicate key value violates unique constraint",
                    })),
                )
            }),
        );
        let store = store_for(spawn_fake_platform(router).await);

        let err = store
            .insert_cart(&ProfileId::parse("user-1").unwrap(), CartStatus::Active)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::Conflict {
                code: Some("23505".to_owned()),
                status: Some(409),
            }
        );
    }

    #[tokio::test]
    async fn test_numeric_cart_id_is_malformed() {
        let router = Router::new().route(
            "/rest/v1/carts",
            get(|| async {
                let mut row = cart_json(CART_UUID, "user-1");
                row["id"] = json!(12);
                Json(json!([row]))
            }),
        );
        let store = store_for(spawn_fake_platform(router).await);

        let err = store
            .active_carts(&ProfileId::parse("user-1").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_missing_profile_fails_permanently_through_resolver() {
        let router = Router::new()
            .route("/rest/v1/profiles", get(|| async { Json(json!([])) }))
            .route(
                "/rest/v1/carts",
                get(|| async { Json(json!([])) }).post(|| async {
                    (
                        StatusCode::CONFLICT,
                        Json(json!({
                            "code": "23503",
                            "message": "insert or update on table \"carts\" violates foreign key constraint",
                        })),
                    )
                }),
            );
        let store = store_for(spawn_fake_platform(router).await);
        let resolver = CartResolver::new(
            std::sync::Arc::new(store),
            ProfileWait {
                max_attempts: 1,
                interval: Duration::ZERO,
            },
        );

        let resolution = resolver
            .resolve(&ProfileId::parse("never-provisioned").unwrap())
            .await;
        assert!(matches!(
            resolution,
            CartResolution::Failed(CartError::Store(StoreError::Rejected(_)))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_platform_is_unavailable() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let store = store_for(Url::parse(&format!("http://{addr}")).unwrap());
        let err = store
            .profile_exists(&ProfileId::parse("user-1").unwrap())
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }
}

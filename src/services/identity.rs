//! Identity provider client.
//!
//! The provider owns user accounts and sessions; this service only exchanges
//! a bearer credential for the user it belongs to.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// The credential was once valid but its session has lapsed.
    #[error("credential expired")]
    Expired,

    #[error("credential rejected")]
    Invalid,

    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<AuthUser, IdentityError>;

    /// Exchanges a refresh token for a new session and returns its user.
    /// Called at most once per request, and only after
    /// [`IdentityProvider::verify`] reported [`IdentityError::Expired`].
    async fn refresh(&self, refresh_token: &str) -> Result<AuthUser, IdentityError>;
}

/// Session returned by the provider's refresh-token grant.
#[derive(Debug, Deserialize)]
struct RefreshedSession {
    user: AuthUser,
}

/// GoTrue-compatible provider reached over HTTP: `GET {base}/auth/v1/user`
/// to verify, `POST {base}/auth/v1/token?grant_type=refresh_token` to refresh.
#[derive(Clone)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    user_url: String,
    token_url: String,
    api_key: String,
}

impl HttpIdentityProvider {
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IdentityError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        let base_url = base_url.trim_end_matches('/');

        Ok(Self {
            client,
            user_url: format!("{base_url}/auth/v1/user"),
            token_url: format!("{base_url}/auth/v1/token"),
            api_key: api_key.into(),
        })
    }

    async fn fetch_user(&self, credential: &str) -> Result<AuthUser, IdentityError> {
        let response = self
            .client
            .get(&self.user_url)
            .bearer_auth(credential)
            .header("apikey", &self.api_key)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<AuthUser>()
                .await
                .map_err(|e| IdentityError::Unavailable(format!("unexpected user payload: {e}")));
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_rejection(&body));
        }

        Err(IdentityError::Unavailable(format!(
            "identity provider returned {status}"
        )))
    }

    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<AuthUser, IdentityError> {
        let response = self
            .client
            .post(&self.token_url)
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let session = response
                .json::<RefreshedSession>()
                .await
                .map_err(|e| IdentityError::Unavailable(format!("unexpected session payload: {e}")))?;
            return Ok(session.user);
        }

        // GoTrue answers a revoked or reused refresh token with 400 invalid_grant
        if status == StatusCode::BAD_REQUEST
            || status == StatusCode::UNAUTHORIZED
            || status == StatusCode::FORBIDDEN
        {
            return Err(IdentityError::Invalid);
        }

        Err(IdentityError::Unavailable(format!(
            "identity provider returned {status}"
        )))
    }
}

/// GoTrue reports lapsed sessions as a 401 whose message mentions expiry.
fn classify_rejection(body: &str) -> IdentityError {
    if body.to_ascii_lowercase().contains("expired") {
        IdentityError::Expired
    } else {
        IdentityError::Invalid
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn verify(&self, credential: &str) -> Result<AuthUser, IdentityError> {
        self.fetch_user(credential).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthUser, IdentityError> {
        tracing::debug!("Exchanging refresh token after expired session");
        self.exchange_refresh_token(refresh_token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_rejection() {
        assert_eq!(
            classify_rejection(r#"{"msg":"invalid JWT: unable to parse or verify signature, token is expired by 2m"}"#),
            IdentityError::Expired
        );
        assert_eq!(
            classify_rejection(r#"{"msg":"invalid JWT: signature is invalid"}"#),
            IdentityError::Invalid
        );
        assert_eq!(classify_rejection(""), IdentityError::Invalid);
    }

    #[test]
    fn test_user_url_is_normalized() {
        let provider =
            HttpIdentityProvider::new("https://auth.example.com/", "anon", Duration::from_secs(5)).unwrap();
        assert_eq!(provider.user_url, "https://auth.example.com/auth/v1/user");
        assert_eq!(provider.token_url, "https://auth.example.com/auth/v1/token");
    }

    #[test]
    fn test_user_payload_ignores_extra_fields() {
        let user: AuthUser = serde_json::from_str(
            r#"{"id":"5f0c7a44-4c1e-4b8e-9a55-0d3f1a2b3c4d","email":"staff@example.com","aud":"authenticated"}"#,
        )
        .unwrap();
        assert_eq!(user.email.as_deref(), Some("staff@example.com"));
    }

    mod stub {
        use axum::extract::{Query, State};
        use axum::http::{header, HeaderMap, StatusCode};
        use axum::response::{IntoResponse, Response};
        use axum::routing::{get, post};
        use axum::{Json, Router};
        use serde_json::{json, Value};
        use std::collections::HashMap;
        use std::sync::{Arc, Mutex};
        use tokio::net::TcpListener;

        pub const USER_ID: &str = "5f0c7a44-4c1e-4b8e-9a55-0d3f1a2b3c4d";

        /// Every request the stub saw, as "METHOD path credential".
        pub type CallLog = Arc<Mutex<Vec<String>>>;

        async fn user(State(calls): State<CallLog>, headers: HeaderMap) -> Response {
            let auth = headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            calls.lock().unwrap().push(format!("GET /auth/v1/user {auth}"));

            if auth == "Bearer fresh-jwt" {
                Json(json!({ "id": USER_ID, "email": "staff@example.com" })).into_response()
            } else {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "msg": "invalid JWT: unable to parse or verify signature, token is expired by 5m" })),
                )
                    .into_response()
            }
        }

        async fn token(
            State(calls): State<CallLog>,
            Query(query): Query<HashMap<String, String>>,
            Json(body): Json<Value>,
        ) -> Response {
            let refresh = body["refresh_token"].as_str().unwrap_or_default().to_string();
            let grant = query.get("grant_type").cloned().unwrap_or_default();
            calls
                .lock()
                .unwrap()
                .push(format!("POST /auth/v1/token {grant} {refresh}"));

            if grant == "refresh_token" && refresh == "good-refresh" {
                Json(json!({
                    "access_token": "fresh-jwt",
                    "refresh_token": "next-refresh",
                    "user": { "id": USER_ID, "email": "staff@example.com" },
                }))
                .into_response()
            } else {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "invalid_grant", "error_description": "Invalid Refresh Token" })),
                )
                    .into_response()
            }
        }

        /// Serves a minimal GoTrue on an ephemeral port and returns its base URL.
        pub async fn spawn() -> (String, CallLog) {
            let calls = CallLog::default();
            let app = Router::new()
                .route("/auth/v1/user", get(user))
                .route("/auth/v1/token", post(token))
                .with_state(calls.clone());

            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            (format!("http://{addr}"), calls)
        }
    }

    async fn provider_with_stub() -> (HttpIdentityProvider, stub::CallLog) {
        let (base_url, calls) = stub::spawn().await;
        let provider = HttpIdentityProvider::new(&base_url, "anon", Duration::from_secs(5)).unwrap();
        (provider, calls)
    }

    #[tokio::test]
    async fn test_expired_jwt_is_reported_as_expired() {
        let (provider, calls) = provider_with_stub().await;

        assert_eq!(provider.verify("expired-jwt").await, Err(IdentityError::Expired));
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["GET /auth/v1/user Bearer expired-jwt".to_string()]
        );
    }

    #[tokio::test]
    async fn test_refresh_uses_refresh_token_grant() {
        let (provider, calls) = provider_with_stub().await;

        let user = provider.refresh("good-refresh").await.unwrap();

        assert_eq!(user.id.to_string(), stub::USER_ID);
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["POST /auth/v1/token refresh_token good-refresh".to_string()]
        );
    }

    #[tokio::test]
    async fn test_rejected_refresh_token_is_invalid() {
        let (provider, _calls) = provider_with_stub().await;

        assert_eq!(provider.refresh("revoked").await, Err(IdentityError::Invalid));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_unavailable() {
        let provider =
            HttpIdentityProvider::new("http://127.0.0.1:1", "anon", Duration::from_secs(2)).unwrap();

        assert!(matches!(
            provider.verify("any").await,
            Err(IdentityError::Unavailable(_))
        ));
    }
}

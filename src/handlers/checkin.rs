use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use uuid::Uuid;

use crate::models::VerifyQrRequest;
use crate::services::stats::event_stats;
use crate::services::verify::{self, VerifyQrInput};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{outcome, success};

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim().to_string())
}

/// Refresh token forwarded by scanner clients alongside the bearer credential.
pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";

fn refresh_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REFRESH_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub async fn verify_qr(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<VerifyQrRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!(rejection = %rejection.body_text(), "Rejected verify-qr body");
            return AppError::InvalidRequest("Malformed request body".to_string()).into_response();
        }
    };

    let input = VerifyQrInput {
        bearer: bearer_token(&headers),
        refresh_token: refresh_token(&headers),
        request,
        user_agent: user_agent(&headers),
    };

    // Nothing is compensated on timeout: the check-in insert either committed
    // or it did not.
    match tokio::time::timeout(state.request_timeout, verify::verify_qr(&state, input)).await {
        Ok(Ok(response)) => outcome(response),
        Ok(Err(e)) => e.into_response(),
        Err(_) => AppError::InternalServerError("verification timed out".to_string()).into_response(),
    }
}

pub async fn verify_qr_preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn checkin_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
) -> Result<Response, AppError> {
    let event_id = Uuid::parse_str(&event_id)
        .map_err(|_| AppError::InvalidRequest("event_id must be a UUID".to_string()))?;

    state
        .auth
        .resolve(
            bearer_token(&headers).as_deref(),
            refresh_token(&headers).as_deref(),
            event_id,
        )
        .await?;
    let stats = event_stats(state.tickets.as_ref(), event_id).await?;

    Ok(success(stats, "Check-in stats retrieved").into_response())
}

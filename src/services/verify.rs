//! The `POST /verify-qr` pipeline: token, identity, ticket, check-in, stats.

use tracing::info;
use uuid::Uuid;

use crate::models::{VerifyQrRequest, VerifyQrResponse};
use crate::services::admission::admit_ticket;
use crate::services::checkin::check_in;
use crate::services::stats::{checkin_outcome, date_outcome, event_stats};
use crate::state::AppState;
use crate::utils::error::AppError;

/// Explicit input of one verification, independent of the HTTP layer.
#[derive(Debug, Clone, Default)]
pub struct VerifyQrInput {
    pub bearer: Option<String>,
    /// Exchanged for a new session if the bearer credential has expired.
    pub refresh_token: Option<String>,
    pub request: VerifyQrRequest,
    /// Used as device info when the body carries none.
    pub user_agent: Option<String>,
}

struct ValidatedRequest {
    bearer: Option<String>,
    refresh_token: Option<String>,
    qr_payload: String,
    event_id: Uuid,
    device_info: Option<String>,
}

fn validate(input: VerifyQrInput) -> Result<ValidatedRequest, AppError> {
    let VerifyQrInput {
        bearer,
        refresh_token,
        request,
        user_agent,
    } = input;

    let qr_payload = request
        .qr_payload
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("qr_payload is required".to_string()))?;

    let event_id = request
        .event_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("event_id is required".to_string()))?;
    let event_id = Uuid::parse_str(event_id)
        .map_err(|_| AppError::InvalidRequest("event_id must be a UUID".to_string()))?;

    let device_info = request
        .device_info
        .filter(|d| !d.trim().is_empty())
        .or(user_agent);

    Ok(ValidatedRequest {
        bearer,
        refresh_token,
        qr_payload,
        event_id,
        device_info,
    })
}

pub async fn verify_qr(state: &AppState, input: VerifyQrInput) -> Result<VerifyQrResponse, AppError> {
    let request = validate(input)?;

    let ticket_code = state.codec.verify(&request.qr_payload)?;

    let staff = state
        .auth
        .resolve(
            request.bearer.as_deref(),
            request.refresh_token.as_deref(),
            request.event_id,
        )
        .await?;

    let today = state.clock.today();
    let admitted = admit_ticket(state.tickets.as_ref(), &ticket_code, request.event_id, today).await?;

    if let Some(outcome) = date_outcome(&admitted) {
        info!(
            event_id = %request.event_id,
            ticket_id = %admitted.ticket.id,
            staff_id = %staff.id(),
            status = outcome.as_str(),
            %today,
            "Scan outside admission day"
        );
        return Ok(outcome.into());
    }

    let result = check_in(
        state.checkins.as_ref(),
        &admitted.ticket,
        staff.id(),
        request.device_info,
    )
    .await?;
    let stats = event_stats(state.tickets.as_ref(), request.event_id).await?;

    let outcome = checkin_outcome(&admitted, result, stats);
    info!(
        event_id = %request.event_id,
        ticket_id = %admitted.ticket.id,
        staff_id = %staff.id(),
        status = outcome.as_str(),
        "Scan processed"
    );

    Ok(outcome.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(qr: Option<&str>, event: Option<&str>) -> VerifyQrInput {
        VerifyQrInput {
            bearer: Some("token".to_string()),
            refresh_token: None,
            request: VerifyQrRequest {
                qr_payload: qr.map(str::to_string),
                event_id: event.map(str::to_string),
                device_info: None,
            },
            user_agent: Some("ScannerApp/2.1".to_string()),
        }
    }

    #[test]
    fn test_missing_fields_are_invalid_requests() {
        let event = Uuid::new_v4().to_string();
        for case in [
            input(None, Some(&event)),
            input(Some("  "), Some(&event)),
            input(Some("v1.A.0000000000000000"), None),
            input(Some("v1.A.0000000000000000"), Some("not-a-uuid")),
        ] {
            let err = validate(case).err().unwrap();
            assert_eq!(err.code(), "invalid_request");
        }
    }

    #[test]
    fn test_device_info_falls_back_to_user_agent() {
        let event = Uuid::new_v4().to_string();
        let validated = validate(input(Some("payload"), Some(&event))).ok().unwrap();
        assert_eq!(validated.device_info.as_deref(), Some("ScannerApp/2.1"));

        let mut explicit = input(Some("payload"), Some(&event));
        explicit.request.device_info = Some("gate-3".to_string());
        let validated = validate(explicit).ok().unwrap();
        assert_eq!(validated.device_info.as_deref(), Some("gate-3"));
    }
}

//! Authorization HTTP handler.
//!
//! `POST /api/v1/authorizations` is the single operation exposed to the
//! terminal-facing network. It always answers HTTP 200 with one of three
//! response codes:
//!
//! - `"00"` approved
//! - `"51"` insufficient balance
//! - `"07"` unexpected error
//!
//! Every internal failure - validation, unknown account, lock timeout,
//! duplicate idempotency key, database trouble - collapses to `"07"`
//! here, after the concrete kind is logged. Terminals never see internal
//! detail.

use axum::{Json, extract::State, http::HeaderMap};
use uuid::Uuid;

use crate::{
    services::authorizer::{self, AuthorizationOutcome, AuthorizationRequest, AuthorizationResponse},
    state::AppState,
};

/// Header carrying the caller's idempotency token.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Authorize a point-of-sale debit.
///
/// # Request
///
/// ```json
/// {
///   "account": "1",
///   "amount_cents": 10000,
///   "mcc": "5412",
///   "merchant": "PADARIA DO ZE               SAO PAULO BR"
/// }
/// ```
///
/// # Response (always 200)
///
/// ```json
/// { "code": "00" }
/// ```
pub async fn authorize(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AuthorizationRequest>,
) -> Json<AuthorizationResponse> {
    let Some(idempotency_key) = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
    else {
        tracing::warn!("authorization rejected: missing or malformed Idempotency-Key header");
        return Json(AuthorizationOutcome::UnexpectedError.into());
    };

    let outcome = match authorizer::authorize(
        state.balances.as_ref(),
        state.merchants.as_ref(),
        idempotency_key,
        &request,
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(err) => {
            // The concrete kind stays in the logs; the wire gets "07".
            tracing::warn!(
                error = %err,
                account = %request.account,
                "authorization failed"
            );
            AuthorizationOutcome::UnexpectedError
        }
    };

    Json(outcome.into())
}

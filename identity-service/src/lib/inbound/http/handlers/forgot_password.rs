use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::account::models::EmailAddress;
use crate::inbound::http::router::AppState;

const RESET_REQUESTED: &str = "If the email exists, a password reset link has been sent";

pub async fn forgot_password(
    State(state): State<AppState>,
    payload: Result<Json<ForgotPasswordRequestBody>, JsonRejection>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    let Json(body) = payload?;

    let email = EmailAddress::new(body.email)
        .map_err(|e| ApiError::BadRequest(format!("Invalid email: {}", e)))?;

    state
        .account_service
        .request_password_reset(&email)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData::new(RESET_REQUESTED),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ForgotPasswordRequestBody {
    email: String,
}

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::account::models::Password;
use crate::account::models::ResetPasswordCommand;
use crate::inbound::http::router::AppState;

pub async fn reset_password(
    State(state): State<AppState>,
    payload: Result<Json<ResetPasswordRequestBody>, JsonRejection>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    let Json(body) = payload?;

    state
        .account_service
        .reset_password(body.try_into_command()?)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData::new("Password reset successfully"),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequestBody {
    token: String,
    password: String,
    confirm_password: String,
}

impl ResetPasswordRequestBody {
    fn try_into_command(self) -> Result<ResetPasswordCommand, ApiError> {
        if self.password != self.confirm_password {
            return Err(ApiError::BadRequest("Passwords do not match".to_string()));
        }
        let password = Password::new(self.password)
            .map_err(|e| ApiError::BadRequest(format!("Invalid password: {}", e)))?;

        Ok(ResetPasswordCommand {
            token: self.token,
            password,
        })
    }
}

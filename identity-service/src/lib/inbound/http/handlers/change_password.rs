use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::account::models::ChangePasswordCommand;
use crate::account::models::Identity;
use crate::account::models::Password;
use crate::inbound::http::router::AppState;

pub async fn change_password(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<ChangePasswordRequestBody>, JsonRejection>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    let Json(body) = payload?;

    state
        .account_service
        .change_password(&identity.id, body.try_into_command()?)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData::new("Password changed successfully"),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequestBody {
    current_password: String,
    new_password: String,
    confirm_new_password: String,
}

impl ChangePasswordRequestBody {
    fn try_into_command(self) -> Result<ChangePasswordCommand, ApiError> {
        if self.new_password != self.confirm_new_password {
            return Err(ApiError::BadRequest("Passwords do not match".to_string()));
        }
        let new_password = Password::new(self.new_password)
            .map_err(|e| ApiError::BadRequest(format!("Invalid password: {}", e)))?;

        Ok(ChangePasswordCommand {
            current_password: self.current_password,
            new_password,
        })
    }
}

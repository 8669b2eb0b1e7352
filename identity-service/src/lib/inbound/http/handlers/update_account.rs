use axum::extract::rejection::JsonRejection;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::update_profile::UpdateProfileRequestBody;
use super::AccountDetailsData;
use super::ApiError;
use super::ApiSuccess;
use crate::account::models::AccountId;
use crate::account::models::Role;
use crate::account::models::UpdateAccountCommand;
use crate::inbound::http::router::AppState;

pub async fn update_account(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    payload: Result<Json<UpdateAccountRequestBody>, JsonRejection>,
) -> Result<ApiSuccess<AccountDetailsData>, ApiError> {
    let Json(body) = payload?;

    let account_id = AccountId::from_string(&account_id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid account ID: {}", e)))?;

    state
        .account_service
        .update_account(&account_id, body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref account| ApiSuccess::new(StatusCode::OK, account.into()))
}

/// HTTP request body for an administrative account edit (raw JSON)
///
/// All fields are optional to support partial updates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequestBody {
    #[serde(flatten)]
    profile: UpdateProfileRequestBody,
    role: Option<String>,
    is_active: Option<bool>,
}

impl UpdateAccountRequestBody {
    fn try_into_command(self) -> Result<UpdateAccountCommand, ApiError> {
        let role = self
            .role
            .map(|role| role.parse::<Role>())
            .transpose()
            .map_err(|e| ApiError::BadRequest(format!("Invalid role: {}", e)))?;

        let command = UpdateAccountCommand {
            profile: self.profile.try_into_command()?,
            role,
            is_active: self.is_active,
        };
        if command.is_empty() {
            return Err(ApiError::BadRequest("No fields to update".to_string()));
        }

        Ok(command)
    }
}

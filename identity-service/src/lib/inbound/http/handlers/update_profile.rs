use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::AccountDetailsData;
use super::ApiError;
use super::ApiSuccess;
use crate::account::models::EmailAddress;
use crate::account::models::Identity;
use crate::account::models::PersonName;
use crate::account::models::UpdateProfileCommand;
use crate::account::models::Username;
use crate::inbound::http::router::AppState;

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<UpdateProfileRequestBody>, JsonRejection>,
) -> Result<ApiSuccess<AccountDetailsData>, ApiError> {
    let Json(body) = payload?;

    let command = body.try_into_command()?;
    if command.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    state
        .account_service
        .update_profile(&identity.id, command)
        .await
        .map_err(ApiError::from)
        .map(|ref account| ApiSuccess::new(StatusCode::OK, account.into()))
}

/// Profile fields shared by the self-service and administrative edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequestBody {
    username: Option<String>,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

impl UpdateProfileRequestBody {
    pub(super) fn try_into_command(self) -> Result<UpdateProfileCommand, ApiError> {
        let username = self
            .username
            .map(Username::new)
            .transpose()
            .map_err(|e| ApiError::BadRequest(format!("Invalid username: {}", e)))?;
        let email = self
            .email
            .map(EmailAddress::new)
            .transpose()
            .map_err(|e| ApiError::BadRequest(format!("Invalid email: {}", e)))?;
        let first_name = self
            .first_name
            .map(PersonName::new)
            .transpose()
            .map_err(|e| ApiError::BadRequest(format!("Invalid name: {}", e)))?;
        let last_name = self
            .last_name
            .map(PersonName::new)
            .transpose()
            .map_err(|e| ApiError::BadRequest(format!("Invalid name: {}", e)))?;

        Ok(UpdateProfileCommand {
            username,
            email,
            first_name,
            last_name,
        })
    }
}

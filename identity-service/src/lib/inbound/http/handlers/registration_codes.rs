//! Administrative CRUD for registration codes.

use axum::extract::rejection::JsonRejection;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::account::models::Identity;
use crate::inbound::http::router::AppState;
use crate::registration_code::errors::RegistrationCodeError;
use crate::registration_code::models::CodeType;
use crate::registration_code::models::CodeValue;
use crate::registration_code::models::CreateRegistrationCodeCommand;
use crate::registration_code::models::RegistrationCode;
use crate::registration_code::models::RegistrationCodeId;
use crate::registration_code::models::UpdateRegistrationCodeCommand;

pub async fn list_registration_codes(
    State(state): State<AppState>,
) -> Result<ApiSuccess<Vec<RegistrationCodeData>>, ApiError> {
    state
        .registration_codes
        .list_codes()
        .await
        .map_err(ApiError::from)
        .map(|codes| {
            ApiSuccess::new(
                StatusCode::OK,
                codes.iter().map(RegistrationCodeData::from).collect(),
            )
        })
}

pub async fn create_registration_code(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<CreateRegistrationCodeRequestBody>, JsonRejection>,
) -> Result<ApiSuccess<RegistrationCodeData>, ApiError> {
    let Json(body) = payload?;

    state
        .registration_codes
        .create_code(body.try_into_command()?, identity.id)
        .await
        .map_err(ApiError::from)
        .map(|ref code| ApiSuccess::new(StatusCode::CREATED, code.into()))
}

pub async fn get_registration_code(
    State(state): State<AppState>,
    Path(code_id): Path<String>,
) -> Result<ApiSuccess<RegistrationCodeData>, ApiError> {
    let code_id = RegistrationCodeId::from_string(&code_id).map_err(RegistrationCodeError::from)?;

    state
        .registration_codes
        .get_code(&code_id)
        .await
        .map_err(ApiError::from)
        .map(|ref code| ApiSuccess::new(StatusCode::OK, code.into()))
}

pub async fn update_registration_code(
    State(state): State<AppState>,
    Path(code_id): Path<String>,
    payload: Result<Json<UpdateRegistrationCodeRequestBody>, JsonRejection>,
) -> Result<ApiSuccess<RegistrationCodeData>, ApiError> {
    let Json(body) = payload?;

    let code_id = RegistrationCodeId::from_string(&code_id).map_err(RegistrationCodeError::from)?;

    state
        .registration_codes
        .update_code(&code_id, body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref code| ApiSuccess::new(StatusCode::OK, code.into()))
}

pub async fn delete_registration_code(
    State(state): State<AppState>,
    Path(code_id): Path<String>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    let code_id = RegistrationCodeId::from_string(&code_id).map_err(RegistrationCodeError::from)?;

    state
        .registration_codes
        .delete_code(&code_id)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData::new("Registration code deleted successfully"),
    ))
}

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn parse_code_type(code_type: Option<String>) -> Result<Option<CodeType>, RegistrationCodeError> {
    code_type
        .map(|value| value.parse::<CodeType>())
        .transpose()
        .map_err(RegistrationCodeError::from)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRegistrationCodeRequestBody {
    code: String,
    name: String,
    description: Option<String>,
    #[serde(rename = "type")]
    code_type: Option<String>,
    max_uses: Option<i32>,
    is_active: Option<bool>,
    expires_at: Option<DateTime<Utc>>,
}

impl CreateRegistrationCodeRequestBody {
    fn try_into_command(self) -> Result<CreateRegistrationCodeCommand, RegistrationCodeError> {
        CreateRegistrationCodeCommand::new(
            CodeValue::new(self.code)?,
            self.name,
            self.description,
            parse_code_type(self.code_type)?.unwrap_or_default(),
            self.max_uses,
            self.is_active.unwrap_or(true),
            self.expires_at,
        )
    }
}

/// Partial update. An explicit `null` clears `description`, `maxUses` or
/// `expiresAt`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRegistrationCodeRequestBody {
    name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    description: Option<Option<String>>,
    #[serde(rename = "type")]
    code_type: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    max_uses: Option<Option<i32>>,
    is_active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    expires_at: Option<Option<DateTime<Utc>>>,
}

impl UpdateRegistrationCodeRequestBody {
    fn try_into_command(self) -> Result<UpdateRegistrationCodeCommand, ApiError> {
        let command = UpdateRegistrationCodeCommand::new(
            self.name,
            self.description,
            parse_code_type(self.code_type)?,
            self.max_uses,
            self.is_active,
            self.expires_at,
        )?;

        let is_empty = command.name.is_none()
            && command.description.is_none()
            && command.code_type.is_none()
            && command.max_uses.is_none()
            && command.is_active.is_none()
            && command.expires_at.is_none();
        if is_empty {
            return Err(ApiError::BadRequest("No fields to update".to_string()));
        }

        Ok(command)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationCodeData {
    pub id: String,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub code_type: String,
    pub max_uses: Option<i32>,
    pub used_count: i32,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&RegistrationCode> for RegistrationCodeData {
    fn from(code: &RegistrationCode) -> Self {
        Self {
            id: code.id.to_string(),
            code: code.code.as_str().to_string(),
            name: code.name.clone(),
            description: code.description.clone(),
            code_type: code.code_type.as_str().to_string(),
            max_uses: code.max_uses,
            used_count: code.used_count,
            is_active: code.is_active,
            expires_at: code.expires_at,
            created_by: code.created_by.map(|id| id.to_string()),
            created_at: code.created_at,
            updated_at: code.updated_at,
        }
    }
}

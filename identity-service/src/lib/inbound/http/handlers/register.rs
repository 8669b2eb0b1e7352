use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use thiserror::Error;

use super::ApiError;
use super::ApiSuccess;
use super::AuthResponseData;
use crate::account::errors::EmailError;
use crate::account::errors::PasswordPolicyError;
use crate::account::errors::PersonNameError;
use crate::account::errors::UsernameError;
use crate::account::models::EmailAddress;
use crate::account::models::Password;
use crate::account::models::PersonName;
use crate::account::models::RegisterAccountCommand;
use crate::account::models::Username;
use crate::inbound::http::router::AppState;
use crate::registration_code::errors::CodeValueError;
use crate::registration_code::models::CodeValue;

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequestBody>, JsonRejection>,
) -> Result<ApiSuccess<AuthResponseData>, ApiError> {
    let Json(body) = payload?;

    state
        .account_service
        .register(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|session| ApiSuccess::new(StatusCode::CREATED, session.into()))
}

/// HTTP request body for self-registration (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequestBody {
    username: String,
    email: String,
    password: String,
    confirm_password: String,
    first_name: Option<String>,
    last_name: Option<String>,
    registration_code: String,
}

#[derive(Debug, Clone, Error)]
enum ParseRegisterRequestError {
    #[error("Invalid username: {0}")]
    Username(#[from] UsernameError),

    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Invalid password: {0}")]
    Password(#[from] PasswordPolicyError),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Invalid name: {0}")]
    Name(#[from] PersonNameError),

    #[error("Invalid registration code: {0}")]
    RegistrationCode(#[from] CodeValueError),
}

impl RegisterRequestBody {
    fn try_into_command(self) -> Result<RegisterAccountCommand, ParseRegisterRequestError> {
        let username = Username::new(self.username)?;
        let email = EmailAddress::new(self.email)?;
        if self.password != self.confirm_password {
            return Err(ParseRegisterRequestError::PasswordMismatch);
        }
        let password = Password::new(self.password)?;
        let first_name = self.first_name.map(PersonName::new).transpose()?;
        let last_name = self.last_name.map(PersonName::new).transpose()?;
        let registration_code = CodeValue::new(self.registration_code)?;

        Ok(RegisterAccountCommand {
            username,
            email,
            password,
            first_name,
            last_name,
            registration_code,
        })
    }
}

impl From<ParseRegisterRequestError> for ApiError {
    fn from(err: ParseRegisterRequestError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

use auth::TokenPair;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::account::errors::AccountError;
use crate::account::models::Account;
use crate::account::models::AuthSession;
use crate::account::models::Identity;
use crate::registration_code::errors::RegistrationCodeError;

pub mod change_password;
pub mod forgot_password;
pub mod get_account;
pub mod health;
pub mod list_accounts;
pub mod login;
pub mod logout;
pub mod me;
pub mod refresh;
pub mod register;
pub mod registration_codes;
pub mod reset_password;
pub mod session;
pub mod update_account;
pub mod update_profile;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::InternalServerError(e.to_string())
    }
}

/// Malformed JSON, a missing field or a wrong content type.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InternalServerError(detail) => {
                tracing::error!(error = %detail, "Unhandled backend error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        (status, Json(ApiResponseBody::new_error(status, message))).into_response()
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::RegistrationCode(inner) => ApiError::from(inner),
            AccountError::InvalidAccountId(_)
            | AccountError::InvalidUsername(_)
            | AccountError::InvalidEmail(_)
            | AccountError::InvalidName(_)
            | AccountError::InvalidPassword(_)
            | AccountError::InvalidRole(_)
            | AccountError::ResetTokenInvalidOrExpired
            | AccountError::IncorrectCurrentPassword => ApiError::BadRequest(err.to_string()),
            AccountError::Unauthenticated
            | AccountError::AccountNoLongerExists
            | AccountError::AccountInactive
            | AccountError::InvalidCredentials
            | AccountError::InvalidRefreshToken
            | AccountError::RefreshSubjectUnavailable => ApiError::Unauthorized(err.to_string()),
            AccountError::Forbidden { .. } => ApiError::Forbidden(err.to_string()),
            AccountError::NotFound(_) => ApiError::NotFound("User not found".to_string()),
            AccountError::UsernameAlreadyExists(_) => {
                ApiError::Conflict("Username already exists".to_string())
            }
            AccountError::EmailAlreadyExists(_) => {
                ApiError::Conflict("Email already exists".to_string())
            }
            AccountError::PasswordHashing(_)
            | AccountError::TokenIssuance(_)
            | AccountError::DatabaseError(_)
            | AccountError::Unknown(_) => ApiError::InternalServerError(err.to_string()),
        }
    }
}

impl From<RegistrationCodeError> for ApiError {
    fn from(err: RegistrationCodeError) -> Self {
        match err {
            RegistrationCodeError::InvalidId(_)
            | RegistrationCodeError::InvalidCode(_)
            | RegistrationCodeError::InvalidType(_)
            | RegistrationCodeError::InvalidName(_)
            | RegistrationCodeError::InvalidMaxUses(_)
            | RegistrationCodeError::NotFound
            | RegistrationCodeError::Inactive
            | RegistrationCodeError::Expired
            | RegistrationCodeError::LimitReached
            | RegistrationCodeError::MaxUsesBelowUsage { .. } => {
                ApiError::BadRequest(err.to_string())
            }
            RegistrationCodeError::NotFoundById(_) => {
                ApiError::NotFound("Registration code not found".to_string())
            }
            RegistrationCodeError::AlreadyExists(_) => {
                ApiError::Conflict("Registration code already exists".to_string())
            }
            RegistrationCodeError::AlreadyUsed => ApiError::Conflict(err.to_string()),
            RegistrationCodeError::DatabaseError(_) | RegistrationCodeError::Unknown(_) => {
                ApiError::InternalServerError(err.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
}

/// Body for endpoints that only report an outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageData {
    pub message: String,
}

impl MessageData {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Public account summary. Never includes the password hash or reset state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountData {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: String,
}

impl From<&Account> for AccountData {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.to_string(),
            username: account.username.as_str().to_string(),
            email: account.email.as_str().to_string(),
            first_name: account.first_name.as_ref().map(|n| n.as_str().to_string()),
            last_name: account.last_name.as_ref().map(|n| n.as_str().to_string()),
            role: account.role.as_str().to_string(),
        }
    }
}

/// Account view for administrators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetailsData {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub registration_code_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Account> for AccountDetailsData {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.to_string(),
            username: account.username.as_str().to_string(),
            email: account.email.as_str().to_string(),
            first_name: account.first_name.as_ref().map(|n| n.as_str().to_string()),
            last_name: account.last_name.as_ref().map(|n| n.as_str().to_string()),
            role: account.role.as_str().to_string(),
            is_active: account.is_active,
            last_login: account.last_login,
            registration_code_id: account.registration_code_id.map(|id| id.to_string()),
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Identity attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityData {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: String,
}

impl From<&Identity> for IdentityData {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.to_string(),
            username: identity.username.as_str().to_string(),
            email: identity.email.as_str().to_string(),
            role: identity.role.as_str().to_string(),
        }
    }
}

/// Account summary plus a freshly issued token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponseData {
    pub user: AccountData,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

impl AuthResponseData {
    fn new(account: &Account, tokens: TokenPair) -> Self {
        Self {
            user: account.into(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: "bearer",
        }
    }
}

impl From<AuthSession> for AuthResponseData {
    fn from(session: AuthSession) -> Self {
        Self::new(&session.account, session.tokens)
    }
}

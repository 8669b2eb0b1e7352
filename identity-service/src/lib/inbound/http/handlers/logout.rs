use axum::http::StatusCode;
use axum::Extension;

use super::ApiSuccess;
use super::MessageData;
use crate::account::models::Identity;

/// Tokens are stateless; the client discards them. Nothing is revoked here.
pub async fn logout(Extension(identity): Extension<Identity>) -> ApiSuccess<MessageData> {
    tracing::info!(account_id = %identity.id, "Account logged out");

    ApiSuccess::new(StatusCode::OK, MessageData::new("Logged out successfully"))
}

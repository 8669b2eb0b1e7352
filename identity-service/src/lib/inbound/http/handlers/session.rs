use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiSuccess;
use super::IdentityData;
use crate::account::models::Identity;

/// Reports whether the caller presented a usable access token. Never rejects.
pub async fn session(identity: Option<Extension<Identity>>) -> ApiSuccess<SessionResponseData> {
    let data = match identity {
        Some(Extension(identity)) => SessionResponseData {
            authenticated: true,
            user: Some((&identity).into()),
        },
        None => SessionResponseData {
            authenticated: false,
            user: None,
        },
    };

    ApiSuccess::new(StatusCode::OK, data)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionResponseData {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<IdentityData>,
}

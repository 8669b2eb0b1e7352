use axum::extract::State;
use axum::http::StatusCode;

use super::AccountDetailsData;
use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::router::AppState;

pub async fn list_accounts(
    State(state): State<AppState>,
) -> Result<ApiSuccess<Vec<AccountDetailsData>>, ApiError> {
    state
        .account_service
        .list_accounts()
        .await
        .map_err(ApiError::from)
        .map(|accounts| {
            ApiSuccess::new(
                StatusCode::OK,
                accounts.iter().map(AccountDetailsData::from).collect(),
            )
        })
}

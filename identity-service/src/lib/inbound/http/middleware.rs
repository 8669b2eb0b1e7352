use axum::extract::Request;
use axum::extract::State;
use axum::http;
use axum::middleware::Next;
use axum::response::Response;

use super::handlers::ApiError;
use crate::account::errors::AccountError;
use crate::account::models::Identity;
use crate::account::models::Role;
use crate::inbound::http::router::AppState;

/// Roles allowed through the administrative routes.
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// Require a valid access token for an active account.
///
/// On success the caller's [`Identity`] is inserted into the request extensions.
pub async fn protect(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&req)
        .map(str::to_owned)
        .ok_or(AccountError::Unauthenticated)?;

    let account = state
        .account_service
        .authenticate(&token)
        .await
        .map_err(|e| {
            tracing::warn!(uri = %req.uri(), reason = %e, "Request rejected by protect");
            e
        })?;

    req.extensions_mut().insert(account.identity());

    Ok(next.run(req).await)
}

/// Attach an [`Identity`] when the caller presents a usable token. Never rejects.
pub async fn optional_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    if let Some(token) = bearer_token(&req).map(str::to_owned) {
        match state.account_service.authenticate(&token).await {
            Ok(account) => {
                req.extensions_mut().insert(account.identity());
            }
            Err(e) => {
                tracing::debug!(reason = %e, "Optional authentication skipped");
            }
        }
    }

    next.run(req).await
}

/// Reject callers whose role is not in `allowed`. Must run after [`protect`].
pub async fn authorize(
    allowed: &'static [Role],
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = req
        .extensions()
        .get::<Identity>()
        .ok_or(AccountError::Unauthenticated)?;

    if !identity.has_any_role(allowed) {
        tracing::warn!(
            account_id = %identity.id,
            role = %identity.role,
            uri = %req.uri(),
            "Request rejected by role check"
        );
        return Err(AccountError::Forbidden {
            role: identity.role,
        }
        .into());
    }

    Ok(next.run(req).await)
}

/// Token from an `Authorization: Bearer <token>` header, if present.
fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

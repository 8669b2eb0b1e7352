use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::Request as ExtractRequest;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::middleware::Next;
use axum::routing::get;
use axum::routing::post;
use axum::routing::put;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::change_password::change_password;
use super::handlers::forgot_password::forgot_password;
use super::handlers::get_account::get_account;
use super::handlers::health::health;
use super::handlers::list_accounts::list_accounts;
use super::handlers::login::login;
use super::handlers::logout::logout;
use super::handlers::me::me;
use super::handlers::refresh::refresh;
use super::handlers::register::register;
use super::handlers::registration_codes::create_registration_code;
use super::handlers::registration_codes::delete_registration_code;
use super::handlers::registration_codes::get_registration_code;
use super::handlers::registration_codes::list_registration_codes;
use super::handlers::registration_codes::update_registration_code;
use super::handlers::reset_password::reset_password;
use super::handlers::session::session;
use super::handlers::update_account::update_account;
use super::handlers::update_profile::update_profile;
use super::middleware::authorize;
use super::middleware::optional_auth;
use super::middleware::protect;
use super::middleware::ADMIN_ONLY;
use crate::account::ports::AccountServicePort;
use crate::registration_code::ports::RegistrationCodeServicePort;

#[derive(Clone)]
pub struct AppState {
    pub account_service: Arc<dyn AccountServicePort>,
    pub registration_codes: Arc<dyn RegistrationCodeServicePort>,
}

pub fn create_router(
    account_service: Arc<dyn AccountServicePort>,
    registration_codes: Arc<dyn RegistrationCodeServicePort>,
) -> Router {
    let state = AppState {
        account_service,
        registration_codes,
    };

    let public_routes = Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password));

    let session_routes = Router::new()
        .route("/api/auth/session", get(session))
        .route_layer(middleware::from_fn_with_state(state.clone(), optional_auth));

    let protected_routes = Router::new()
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
        .route("/api/users/me/password", put(change_password))
        .route("/api/users/profile", put(update_profile))
        .route_layer(middleware::from_fn_with_state(state.clone(), protect));

    // Layers run outside-in: protect resolves the identity before authorize reads it
    let admin_routes = Router::new()
        .route("/api/users", get(list_accounts))
        .route("/api/users/:user_id", get(get_account).patch(update_account))
        .route(
            "/api/registration-codes",
            get(list_registration_codes).post(create_registration_code),
        )
        .route(
            "/api/registration-codes/:code_id",
            get(get_registration_code)
                .patch(update_registration_code)
                .delete(delete_registration_code),
        )
        .route_layer(middleware::from_fn(|req: ExtractRequest, next: Next| {
            authorize(ADMIN_ONLY, req, next)
        }))
        .route_layer(middleware::from_fn_with_state(state.clone(), protect));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub mod paths;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    handlers::{auth, health, users},
    server::AppState,
};

/// Create health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route(paths::health::HEALTH, get(health::health_check))
}

/// Create authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(paths::auth::REGISTER, post(auth::register))
        .route(paths::auth::LOGIN, post(auth::login))
        .route(paths::auth::REFRESH, post(auth::refresh))
        .route(paths::auth::LOGOUT, post(auth::logout))
}

/// Create per-user routes (self or admin only)
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route(paths::users::USER_BY_ID, get(users::get_user))
        .route(paths::users::PASSWORD, post(users::change_password))
        .route(paths::users::SESSIONS, get(users::list_sessions))
}

pub fn api_v1_routes() -> Router<AppState> {
    Router::new().merge(auth_routes()).merge(user_routes())
}

pub fn create_routes() -> Router<AppState> {
    Router::new()
        // Health check routes (no authentication required)
        .merge(health_routes())
        .nest(paths::API_V1, api_v1_routes())
}

/// Full application router with request tracing
pub fn create_app(state: AppState) -> Router {
    create_routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! HTTP surface of the user auth engine
//!
//! Routes under `/api/v1` for registration, login, refresh token rotation,
//! logout and the per-user profile, password and session endpoints. Every
//! response, successful or not, is an [`ApiResponse`] envelope.

pub mod config;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod shutdown;
pub mod store;
pub mod validation;

pub use config::AppConfig;
pub use envelope::ApiResponse;
pub use error::{ApiError, ApiResult};
pub use routes::create_app;
pub use server::AppState;

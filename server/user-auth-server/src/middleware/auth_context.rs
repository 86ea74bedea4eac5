//! Authentication context extraction
//!
//! Protected handlers take [`Authenticated`] as an argument. Extraction runs
//! the authentication gate over the request headers and rejects with the
//! gate's 401 before the handler body runs.

use async_trait::async_trait;
use auth_gateway::RequestContext;
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Utc;

use crate::{error::ApiError, server::AppState};

/// Verified caller of a protected route
#[derive(Debug, Clone)]
pub struct Authenticated(pub RequestContext);

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let context = state.gate.verify(&parts.headers, Utc::now())?;
        Ok(Self(context))
    }
}

use auth_gateway::AuthorizationPolicy;
use auth_identity::{SessionRecord, UserId, UserProfile};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use serde::Deserialize;

use crate::{
    envelope::{ok, ApiResponse, Reply},
    error::{ApiError, ApiResult},
    middleware::Authenticated,
    server::AppState,
    validation::{RequestValidation, RequiredFields},
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

pub struct PasswordChange {
    pub old_password: String,
    pub new_password: String,
}

impl RequestValidation for ChangePasswordRequest {
    type Valid = PasswordChange;

    fn validate(self) -> Result<PasswordChange, ApiError> {
        let mut fields = RequiredFields::new();
        let old_password = fields.take("old_password", self.old_password);
        let new_password = fields.take("new_password", self.new_password);
        fields.finish()?;
        Ok(PasswordChange {
            old_password,
            new_password,
        })
    }
}

/// Resolve the path id and check the caller may act on it.
fn target_user(
    context: &Authenticated,
    path: Result<Path<UserId>, PathRejection>,
) -> ApiResult<UserId> {
    let Path(user_id) = path?;
    AuthorizationPolicy::authorize(&context.0.identity, user_id)?;
    Ok(user_id)
}

pub async fn get_user(
    State(state): State<AppState>,
    caller: Authenticated,
    path: Result<Path<UserId>, PathRejection>,
) -> ApiResult<Reply<UserProfile>> {
    let user_id = target_user(&caller, path)?;

    let profile = state.coordinator.user_info(user_id).await?;
    Ok(ok(ApiResponse::success("User info retrieved", profile)))
}

pub async fn change_password(
    State(state): State<AppState>,
    caller: Authenticated,
    path: Result<Path<UserId>, PathRejection>,
    body: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> ApiResult<Reply<()>> {
    let user_id = target_user(&caller, path)?;
    let Json(request) = body?;
    let change = request.validate()?;

    let message = state
        .coordinator
        .change_password(user_id, &change.old_password, &change.new_password)
        .await?;
    Ok(ok(ApiResponse::message_only(message)))
}

pub async fn list_sessions(
    State(state): State<AppState>,
    caller: Authenticated,
    path: Result<Path<UserId>, PathRejection>,
) -> ApiResult<Reply<Vec<SessionRecord>>> {
    let user_id = target_user(&caller, path)?;

    let sessions = state.coordinator.list_sessions(user_id).await?;
    Ok(ok(ApiResponse::success("Active sessions retrieved", sessions)))
}

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::models::*;

/// User accounts and password checks.
///
/// `Ok(None)` means the store answered with no row at all.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn register_user(
        &self,
        registration: &Registration,
        default_role_id: i32,
    ) -> StoreResult<Option<StoreOutcome<UserId>>>;

    async fn authenticate_user(
        &self,
        credentials: &Credentials,
        client: &ClientMetadata,
    ) -> StoreResult<Option<StoreOutcome<Identity>>>;

    async fn user_profile(&self, user_id: UserId) -> StoreResult<Option<UserProfile>>;
}

/// Session rows and refresh token rotation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn open_session(&self, session: &NewSession) -> StoreResult<()>;

    /// Verify, invalidate and replace `refresh_token` in one step.
    async fn rotate_refresh_token(
        &self,
        refresh_token: &str,
        client: &ClientMetadata,
    ) -> StoreResult<Option<StoreOutcome<TokenPair>>>;

    /// Terminating an already terminated session still succeeds.
    async fn terminate_session(&self, access_token: &str) -> StoreResult<Option<StoreOutcome<()>>>;

    async fn list_sessions(&self, user_id: UserId) -> StoreResult<Vec<SessionRecord>>;

    async fn change_password(
        &self,
        user_id: UserId,
        old_password: &str,
        new_password: &str,
    ) -> StoreResult<Option<StoreOutcome<()>>>;
}

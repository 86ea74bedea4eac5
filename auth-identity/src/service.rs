use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{error::*, models::*, repository::*, token::TokenCodec};

/// Runs the login, refresh and logout protocol against the external stores.
///
/// Every operation is a single store round trip, so a cancelled request
/// never leaves a half-written session behind.
pub struct SessionCoordinator {
    codec: Arc<TokenCodec>,
    credentials: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionStore>,
    default_role_id: i32,
}

impl SessionCoordinator {
    pub fn new(
        codec: Arc<TokenCodec>,
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        default_role_id: i32,
    ) -> Self {
        Self {
            codec,
            credentials,
            sessions,
            default_role_id,
        }
    }

    pub fn codec(&self) -> &Arc<TokenCodec> {
        &self.codec
    }

    pub async fn register(&self, registration: &Registration) -> Result<UserId> {
        let outcome = self
            .credentials
            .register_user(registration, self.default_role_id)
            .await
            .map_err(|e| store_failure("register_user", e))?
            .ok_or(IdentityError::NoResult("Registration failed"))?;

        if !outcome.success {
            warn!(login = %registration.login, reason = %outcome.message, "Registration refused");
            return Err(IdentityError::BusinessRule(outcome.message));
        }
        let user_id = outcome
            .payload
            .ok_or(IdentityError::NoResult("Registration failed"))?;

        info!(user_id, "User registered");
        Ok(user_id)
    }

    pub async fn login(
        &self,
        credentials: &Credentials,
        client: &ClientMetadata,
    ) -> Result<LoginResult> {
        let outcome = self
            .credentials
            .authenticate_user(credentials, client)
            .await
            .map_err(|e| store_failure("authenticate_user", e))?
            .ok_or_else(|| IdentityError::AuthenticationFailed("Authentication failed".into()))?;

        if !outcome.success {
            warn!(login = %credentials.login, reason = %outcome.message, "Login refused");
            return Err(IdentityError::AuthenticationFailed(outcome.message));
        }
        let identity = outcome
            .payload
            .ok_or_else(|| IdentityError::AuthenticationFailed("Authentication failed".into()))?;

        // Both tokens or neither.
        let now = Utc::now();
        let tokens = match (
            self.codec.issue_access_token(&identity, now),
            self.codec.issue_refresh_token(identity.user_id, now),
        ) {
            (Ok(access_token), Ok(refresh_token)) => TokenPair {
                access_token,
                refresh_token,
            },
            (Err(e), _) | (_, Err(e)) => {
                error!(user_id = identity.user_id, error = %e, "Token issuance failed");
                return Err(e);
            }
        };

        self.sessions
            .open_session(&NewSession {
                user_id: identity.user_id,
                access_token: tokens.access_token.clone(),
                refresh_token: tokens.refresh_token.clone(),
                client: client.clone(),
            })
            .await
            .map_err(|e| store_failure("open_session", e))?;

        info!(user_id = identity.user_id, role = %identity.role, "Login successful");
        Ok(LoginResult { identity, tokens })
    }

    /// Redeem a refresh token. The store verifies, invalidates and replaces
    /// it in the same call.
    pub async fn refresh(&self, refresh_token: &str, client: &ClientMetadata) -> Result<TokenPair> {
        let outcome = self
            .sessions
            .rotate_refresh_token(refresh_token, client)
            .await
            .map_err(|e| store_failure("rotate_refresh_token", e))?
            .ok_or_else(|| IdentityError::AuthenticationFailed("Token refresh failed".into()))?;

        if !outcome.success {
            warn!(
                token = %logger_redacted::token_fingerprint(refresh_token),
                reason = %outcome.message,
                "Refresh refused"
            );
            return Err(IdentityError::AuthenticationFailed(outcome.message));
        }

        let tokens = outcome
            .payload
            .ok_or_else(|| IdentityError::AuthenticationFailed("Token refresh failed".into()))?;
        debug!(
            token = %logger_redacted::token_fingerprint(refresh_token),
            "Refresh token rotated"
        );
        Ok(tokens)
    }

    /// Terminate the session behind `access_token`. `identity` is the caller
    /// the gate already authenticated.
    pub async fn logout(&self, identity: &Identity, access_token: &str) -> Result<()> {
        self.sessions
            .terminate_session(access_token)
            .await
            .map_err(|e| store_failure("terminate_session", e))?
            .ok_or(IdentityError::NoResult("Logout failed"))?;

        info!(user_id = identity.user_id, "Logout successful");
        Ok(())
    }

    /// Returns the store's own confirmation message.
    pub async fn change_password(
        &self,
        user_id: UserId,
        old_password: &str,
        new_password: &str,
    ) -> Result<String> {
        let outcome = self
            .sessions
            .change_password(user_id, old_password, new_password)
            .await
            .map_err(|e| store_failure("change_password", e))?
            .ok_or(IdentityError::NoResult("Change password failed"))?;

        if outcome.success {
            info!(user_id, "Password changed");
            Ok(outcome.message)
        } else {
            warn!(user_id, reason = %outcome.message, "Password change refused");
            Err(IdentityError::BusinessRule(outcome.message))
        }
    }

    pub async fn list_sessions(&self, user_id: UserId) -> Result<Vec<SessionRecord>> {
        self.sessions
            .list_sessions(user_id)
            .await
            .map_err(|e| store_failure("list_sessions", e))
    }

    pub async fn user_info(&self, user_id: UserId) -> Result<UserProfile> {
        self.credentials
            .user_profile(user_id)
            .await
            .map_err(|e| store_failure("user_profile", e))?
            .ok_or_else(|| IdentityError::NotFound("User not found".into()))
    }
}

fn store_failure(operation: &'static str, err: StoreError) -> IdentityError {
    let error_id = Uuid::new_v4();
    error!(%error_id, operation, error = %err, "Store call failed");
    err.into()
}

//! Process-local credential and session store.
//!
//! Backs the `memory` store backend and the integration tests. Refresh
//! rotation runs entirely under one lock, which gives the single-use
//! guarantee the coordinator relies on.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{StoreError, StoreResult, VerificationError};
use crate::models::*;
use crate::repository::{CredentialStore, SessionStore};
use crate::token::TokenCodec;

pub const ADMIN_ROLE_ID: i32 = 1;
pub const GUEST_ROLE_ID: i32 = 2;
pub const USER_ROLE_ID: i32 = 3;

const INVALID_REFRESH_TOKEN: &str = "Invalid refresh token";

pub fn role_name(role_id: i32) -> &'static str {
    match role_id {
        ADMIN_ROLE_ID => "admin",
        USER_ROLE_ID => "user",
        _ => "guest",
    }
}

#[derive(Debug, Clone)]
struct UserRow {
    user_id: UserId,
    email: String,
    login: String,
    phone: String,
    password_hash: String,
    role_id: i32,
    is_confirmed: bool,
    is_profile_active: bool,
}

impl UserRow {
    fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id,
            email: self.email.clone(),
            login: self.login.clone(),
            role: Role::from_name(role_name(self.role_id)),
        }
    }
}

/// A live session. Terminated and expired sessions are removed, not kept.
#[derive(Debug, Clone)]
struct SessionRow {
    session_id: SessionId,
    user_id: UserId,
    /// Every access token issued for the session that has not expired yet,
    /// including ones replaced by a rotation.
    access_tokens: Vec<(String, DateTime<Utc>)>,
    refresh_token: String,
    refresh_expires_at: DateTime<Utc>,
    ip_address: String,
    user_agent: String,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

impl SessionRow {
    fn record(&self) -> SessionRecord {
        SessionRecord {
            session_id: self.session_id,
            ip_address: self.ip_address.clone(),
            user_agent: self.user_agent.clone(),
            created_at: self.created_at,
            last_activity: self.last_activity,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, UserRow>,
    sessions: BTreeMap<SessionId, SessionRow>,
    by_access_token: HashMap<String, SessionId>,
    by_refresh_token: HashMap<String, SessionId>,
    next_user_id: UserId,
    next_session_id: SessionId,
}

impl State {
    fn allocate_user_id(&mut self) -> UserId {
        self.next_user_id += 1;
        self.next_user_id
    }

    fn login_or_email_taken(&self, login: &str, email: &str) -> bool {
        self.users
            .values()
            .any(|u| u.login == login || u.email.eq_ignore_ascii_case(email))
    }

    fn insert_session(&mut self, row: SessionRow) {
        for (token, _) in &row.access_tokens {
            self.by_access_token.insert(token.clone(), row.session_id);
        }
        self.by_refresh_token
            .insert(row.refresh_token.clone(), row.session_id);
        self.sessions.insert(row.session_id, row);
    }

    fn remove_session(&mut self, session_id: SessionId) -> Option<SessionRow> {
        let row = self.sessions.remove(&session_id)?;
        for (token, _) in &row.access_tokens {
            self.by_access_token.remove(token);
        }
        self.by_refresh_token.remove(&row.refresh_token);
        Some(row)
    }

    /// Drop sessions whose refresh token can no longer be redeemed.
    fn prune_expired(&mut self, now: DateTime<Utc>) {
        let expired: Vec<SessionId> = self
            .sessions
            .values()
            .filter(|s| s.refresh_expires_at < now)
            .map(|s| s.session_id)
            .collect();
        for session_id in expired {
            self.remove_session(session_id);
        }
    }

    fn user_session_ids(&self, user_id: UserId) -> Vec<SessionId> {
        self.sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.session_id)
            .collect()
    }
}

pub struct InMemoryStore {
    codec: Arc<TokenCodec>,
    argon2: Argon2<'static>,
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self::with_argon2(codec, Argon2::default())
    }

    /// Use a specific argon2 instance, e.g. cheaper parameters in tests.
    pub fn with_argon2(codec: Arc<TokenCodec>, argon2: Argon2<'static>) -> Self {
        Self {
            codec,
            argon2,
            state: Mutex::new(State::default()),
        }
    }

    /// Insert a confirmed user with a fixed id and role.
    pub async fn seed_user(
        &self,
        user_id: UserId,
        registration: &Registration,
        role_id: i32,
    ) -> StoreResult<()> {
        let password_hash = self.hash_password(&registration.password)?;
        let mut state = self.state.lock().await;
        if state.users.contains_key(&user_id)
            || state.login_or_email_taken(&registration.login, &registration.email)
        {
            return Err(StoreError::Unavailable(format!(
                "seed conflict for user {user_id}"
            )));
        }
        state.users.insert(
            user_id,
            UserRow {
                user_id,
                email: registration.email.clone(),
                login: registration.login.clone(),
                phone: registration.phone.clone(),
                password_hash,
                role_id,
                is_confirmed: true,
                is_profile_active: true,
            },
        );
        state.next_user_id = state.next_user_id.max(user_id);
        Ok(())
    }

    fn hash_password(&self, password: &str) -> StoreResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| StoreError::Unavailable(format!("password hashing failed: {e}")))
    }

    fn access_expiry(&self, token: &str, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.codec.decode_access(token, now) {
            Ok(claims) => DateTime::from_timestamp(claims.expires_at, 0)
                .unwrap_or(now + self.codec.access_ttl()),
            Err(VerificationError::Expired) => DateTime::<Utc>::MIN_UTC,
            Err(_) => now + self.codec.access_ttl(),
        }
    }

    fn refresh_expiry(&self, token: &str, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.codec.decode_refresh(token, now) {
            Ok(claims) => DateTime::from_timestamp(claims.expires_at, 0)
                .unwrap_or(now + self.codec.refresh_ttl()),
            Err(VerificationError::Expired) => DateTime::<Utc>::MIN_UTC,
            Err(_) => now + self.codec.refresh_ttl(),
        }
    }

    fn verify_password(&self, password: &str, hash: &str) -> bool {
        PasswordHash::new(hash)
            .map(|parsed| {
                self.argon2
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn register_user(
        &self,
        registration: &Registration,
        default_role_id: i32,
    ) -> StoreResult<Option<StoreOutcome<UserId>>> {
        {
            let state = self.state.lock().await;
            if state.login_or_email_taken(&registration.login, &registration.email) {
                return Ok(Some(StoreOutcome::rejected(
                    "User with this email or login already exists",
                )));
            }
        }

        let password_hash = self.hash_password(&registration.password)?;

        let mut state = self.state.lock().await;
        // re-check, the lock was released while hashing
        if state.login_or_email_taken(&registration.login, &registration.email) {
            return Ok(Some(StoreOutcome::rejected(
                "User with this email or login already exists",
            )));
        }
        let user_id = state.allocate_user_id();
        state.users.insert(
            user_id,
            UserRow {
                user_id,
                email: registration.email.clone(),
                login: registration.login.clone(),
                phone: registration.phone.clone(),
                password_hash,
                role_id: default_role_id,
                is_confirmed: false,
                is_profile_active: true,
            },
        );
        Ok(Some(StoreOutcome::accepted("User registered", user_id)))
    }

    async fn authenticate_user(
        &self,
        credentials: &Credentials,
        _client: &ClientMetadata,
    ) -> StoreResult<Option<StoreOutcome<Identity>>> {
        let user = {
            let state = self.state.lock().await;
            state
                .users
                .values()
                .find(|u| u.login == credentials.login)
                .cloned()
        };

        let Some(user) = user else {
            return Ok(Some(StoreOutcome::rejected("Invalid login or password")));
        };
        if !self.verify_password(&credentials.password, &user.password_hash) {
            return Ok(Some(StoreOutcome::rejected("Invalid login or password")));
        }
        if !user.is_profile_active {
            return Ok(Some(StoreOutcome::rejected("Account is deactivated")));
        }

        Ok(Some(StoreOutcome::accepted(
            "Authentication successful",
            user.identity(),
        )))
    }

    async fn user_profile(&self, user_id: UserId) -> StoreResult<Option<UserProfile>> {
        let state = self.state.lock().await;
        Ok(state.users.get(&user_id).map(|u| UserProfile {
            user_id: u.user_id,
            email: u.email.clone(),
            login: u.login.clone(),
            phone: u.phone.clone(),
            is_confirmed: u.is_confirmed,
            is_profile_active: u.is_profile_active,
            role_name: role_name(u.role_id).to_string(),
        }))
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn open_session(&self, session: &NewSession) -> StoreResult<()> {
        let now = Utc::now();
        let access_expires_at = self.access_expiry(&session.access_token, now);
        let refresh_expires_at = self.refresh_expiry(&session.refresh_token, now);

        let mut state = self.state.lock().await;
        state.prune_expired(now);
        state.next_session_id += 1;
        let session_id = state.next_session_id;
        state.insert_session(SessionRow {
            session_id,
            user_id: session.user_id,
            access_tokens: vec![(session.access_token.clone(), access_expires_at)],
            refresh_token: session.refresh_token.clone(),
            refresh_expires_at,
            ip_address: session.client.ip_address.clone(),
            user_agent: session.client.user_agent.clone(),
            created_at: now,
            last_activity: now,
        });
        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        refresh_token: &str,
        client: &ClientMetadata,
    ) -> StoreResult<Option<StoreOutcome<TokenPair>>> {
        let now = Utc::now();
        let mut state = self.state.lock().await;

        let Ok(claims) = self.codec.decode_refresh(refresh_token, now) else {
            return Ok(Some(StoreOutcome::rejected(INVALID_REFRESH_TOKEN)));
        };
        let Some(identity) = state.users.get(&claims.user_id).map(UserRow::identity) else {
            return Ok(Some(StoreOutcome::rejected(INVALID_REFRESH_TOKEN)));
        };
        let Some(session_id) = state
            .by_refresh_token
            .get(refresh_token)
            .copied()
            .filter(|id| state.sessions.get(id).map(|s| s.user_id) == Some(claims.user_id))
        else {
            return Ok(Some(StoreOutcome::rejected(INVALID_REFRESH_TOKEN)));
        };

        let issue = self
            .codec
            .issue_access_token(&identity, now)
            .and_then(|access| {
                self.codec
                    .issue_refresh_token(identity.user_id, now)
                    .map(|refresh| (access, refresh))
            });
        let (access_token, new_refresh_token) =
            issue.map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let Some(mut session) = state.remove_session(session_id) else {
            return Ok(Some(StoreOutcome::rejected(INVALID_REFRESH_TOKEN)));
        };

        // older access tokens stay tied to the session until they expire
        session.access_tokens.retain(|(_, expires_at)| *expires_at >= now);
        session
            .access_tokens
            .push((access_token.clone(), now + self.codec.access_ttl()));
        session.refresh_token = new_refresh_token.clone();
        session.refresh_expires_at = now + self.codec.refresh_ttl();
        session.ip_address = client.ip_address.clone();
        session.user_agent = client.user_agent.clone();
        session.last_activity = now;
        state.insert_session(session);
        state.prune_expired(now);

        Ok(Some(StoreOutcome::accepted(
            "Tokens refreshed",
            TokenPair {
                access_token,
                refresh_token: new_refresh_token,
            },
        )))
    }

    async fn terminate_session(&self, access_token: &str) -> StoreResult<Option<StoreOutcome<()>>> {
        let mut state = self.state.lock().await;
        state.prune_expired(Utc::now());

        let closed = state
            .by_access_token
            .get(access_token)
            .copied()
            .and_then(|session_id| state.remove_session(session_id));
        let message = if closed.is_some() {
            "Session terminated"
        } else {
            "Session already terminated"
        };
        Ok(Some(StoreOutcome::accepted(message, ())))
    }

    async fn list_sessions(&self, user_id: UserId) -> StoreResult<Vec<SessionRecord>> {
        let mut state = self.state.lock().await;
        state.prune_expired(Utc::now());
        Ok(state
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .map(SessionRow::record)
            .collect())
    }

    async fn change_password(
        &self,
        user_id: UserId,
        old_password: &str,
        new_password: &str,
    ) -> StoreResult<Option<StoreOutcome<()>>> {
        let current_hash = {
            let state = self.state.lock().await;
            match state.users.get(&user_id) {
                Some(user) => user.password_hash.clone(),
                None => return Ok(Some(StoreOutcome::rejected("User not found"))),
            }
        };
        if !self.verify_password(old_password, &current_hash) {
            return Ok(Some(StoreOutcome::rejected("Invalid old password")));
        }
        let new_hash = self.hash_password(new_password)?;

        let mut state = self.state.lock().await;
        let Some(user) = state.users.get_mut(&user_id) else {
            return Ok(Some(StoreOutcome::rejected("User not found")));
        };
        user.password_hash = new_hash;
        // a new password ends every open session of the user
        for session_id in state.user_session_ids(user_id) {
            state.remove_session(session_id);
        }
        Ok(Some(StoreOutcome::accepted(
            "Password changed successfully",
            (),
        )))
    }
}

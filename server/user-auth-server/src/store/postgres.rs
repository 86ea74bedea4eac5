//! Postgres-backed credential and session store
//!
//! Every trait method is one stored-procedure call. Business rules (password
//! checks, refresh token rotation, session termination) run inside the
//! database; this adapter only maps rows.

use async_trait::async_trait;
use auth_identity::{
    ClientMetadata, CredentialStore, Credentials, Identity, NewSession, Registration, Role,
    SessionRecord, SessionStore, StoreError, StoreOutcome, StoreResult, TokenPair, UserId,
    UserProfile,
};
use logger_redacted::PiiRedactor;
use sqlx::{postgres::PgRow, PgPool, Row};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Driver errors can echo query parameters, so the detail is redacted
/// before it travels on.
fn unavailable(procedure: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |err| {
        let detail = PiiRedactor::default().redact(&err.to_string());
        StoreError::Unavailable(format!("{procedure}: {detail}"))
    }
}

fn column<'r, T>(row: &'r PgRow, name: &str, procedure: &'static str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name).map_err(unavailable(procedure))
}

/// Success flag and message shared by every procedure result.
fn outcome_header(row: &PgRow, procedure: &'static str) -> StoreResult<(bool, String)> {
    Ok((
        column(row, "success", procedure)?,
        column(row, "message", procedure)?,
    ))
}

fn incomplete(procedure: &'static str, field: &str) -> StoreError {
    StoreError::Unavailable(format!("{procedure}: successful row without {field}"))
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn register_user(
        &self,
        registration: &Registration,
        default_role_id: i32,
    ) -> StoreResult<Option<StoreOutcome<UserId>>> {
        const PROC: &str = "register_user";
        let row = sqlx::query("SELECT * FROM register_user($1, $2, $3, $4, $5)")
            .bind(&registration.email)
            .bind(&registration.login)
            .bind(&registration.password)
            .bind(&registration.phone)
            .bind(default_role_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable(PROC))?;

        let Some(row) = row else { return Ok(None) };
        let (success, message) = outcome_header(&row, PROC)?;
        if !success {
            return Ok(Some(StoreOutcome::rejected(message)));
        }
        let user_id: Option<UserId> = column(&row, "user_id", PROC)?;
        let user_id = user_id.ok_or_else(|| incomplete(PROC, "user_id"))?;
        Ok(Some(StoreOutcome::accepted(message, user_id)))
    }

    async fn authenticate_user(
        &self,
        credentials: &Credentials,
        client: &ClientMetadata,
    ) -> StoreResult<Option<StoreOutcome<Identity>>> {
        const PROC: &str = "authenticate_user";
        let row = sqlx::query("SELECT * FROM authenticate_user($1, $2, $3, $4)")
            .bind(&credentials.login)
            .bind(&credentials.password)
            .bind(&client.ip_address)
            .bind(&client.user_agent)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable(PROC))?;

        let Some(row) = row else { return Ok(None) };
        let (success, message) = outcome_header(&row, PROC)?;
        if !success {
            return Ok(Some(StoreOutcome::rejected(message)));
        }

        let user_id: Option<UserId> = column(&row, "user_id", PROC)?;
        let email: Option<String> = column(&row, "email", PROC)?;
        let login: Option<String> = column(&row, "login", PROC)?;
        let role_name: Option<String> = column(&row, "role_name", PROC)?;

        let identity = Identity {
            user_id: user_id.ok_or_else(|| incomplete(PROC, "user_id"))?,
            email: email.ok_or_else(|| incomplete(PROC, "email"))?,
            login: login.ok_or_else(|| incomplete(PROC, "login"))?,
            role: Role::from_name(role_name.as_deref().unwrap_or_default()),
        };
        Ok(Some(StoreOutcome::accepted(message, identity)))
    }

    async fn user_profile(&self, user_id: UserId) -> StoreResult<Option<UserProfile>> {
        const PROC: &str = "get_user_info";
        let row = sqlx::query("SELECT * FROM get_user_info($1)")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable(PROC))?;

        let Some(row) = row else { return Ok(None) };
        let phone: Option<String> = column(&row, "phone", PROC)?;
        Ok(Some(UserProfile {
            user_id: column(&row, "user_id", PROC)?,
            email: column(&row, "email", PROC)?,
            login: column(&row, "login", PROC)?,
            phone: phone.unwrap_or_default(),
            is_confirmed: column(&row, "is_confirmed", PROC)?,
            is_profile_active: column(&row, "is_profile_active", PROC)?,
            role_name: column(&row, "role_name", PROC)?,
        }))
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn open_session(&self, session: &NewSession) -> StoreResult<()> {
        sqlx::query("SELECT create_session($1, $2, $3, $4, $5)")
            .bind(session.user_id)
            .bind(&session.access_token)
            .bind(&session.refresh_token)
            .bind(&session.client.ip_address)
            .bind(&session.client.user_agent)
            .execute(&self.pool)
            .await
            .map_err(unavailable("create_session"))?;
        Ok(())
    }

    async fn rotate_refresh_token(
        &self,
        refresh_token: &str,
        client: &ClientMetadata,
    ) -> StoreResult<Option<StoreOutcome<TokenPair>>> {
        const PROC: &str = "refresh_session";
        let row = sqlx::query("SELECT * FROM refresh_session($1, $2, $3)")
            .bind(refresh_token)
            .bind(&client.ip_address)
            .bind(&client.user_agent)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable(PROC))?;

        let Some(row) = row else { return Ok(None) };
        let (success, message) = outcome_header(&row, PROC)?;
        if !success {
            return Ok(Some(StoreOutcome::rejected(message)));
        }
        let access_token: Option<String> = column(&row, "new_access_token", PROC)?;
        let refresh_token: Option<String> = column(&row, "new_refresh_token", PROC)?;
        Ok(Some(StoreOutcome::accepted(
            message,
            TokenPair {
                access_token: access_token.ok_or_else(|| incomplete(PROC, "new_access_token"))?,
                refresh_token: refresh_token
                    .ok_or_else(|| incomplete(PROC, "new_refresh_token"))?,
            },
        )))
    }

    async fn terminate_session(&self, access_token: &str) -> StoreResult<Option<StoreOutcome<()>>> {
        const PROC: &str = "logout_session";
        let row = sqlx::query("SELECT * FROM logout_session($1)")
            .bind(access_token)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable(PROC))?;

        let Some(row) = row else { return Ok(None) };
        let (success, message) = outcome_header(&row, PROC)?;
        Ok(Some(if success {
            StoreOutcome::accepted(message, ())
        } else {
            StoreOutcome::rejected(message)
        }))
    }

    async fn list_sessions(&self, user_id: UserId) -> StoreResult<Vec<SessionRecord>> {
        const PROC: &str = "get_user_sessions";
        let rows = sqlx::query(
            "SELECT session_id::bigint AS session_id, \
                    ip_address::text AS ip_address, \
                    COALESCE(user_agent, '') AS user_agent, \
                    created_at::timestamptz AS created_at, \
                    last_activity::timestamptz AS last_activity \
             FROM get_user_sessions($1)",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable(PROC))?;

        rows.iter()
            .map(|row| {
                Ok(SessionRecord {
                    session_id: column(row, "session_id", PROC)?,
                    ip_address: column(row, "ip_address", PROC)?,
                    user_agent: column(row, "user_agent", PROC)?,
                    created_at: column(row, "created_at", PROC)?,
                    last_activity: column(row, "last_activity", PROC)?,
                })
            })
            .collect()
    }

    async fn change_password(
        &self,
        user_id: UserId,
        old_password: &str,
        new_password: &str,
    ) -> StoreResult<Option<StoreOutcome<()>>> {
        const PROC: &str = "change_password";
        let row = sqlx::query("SELECT * FROM change_password($1, $2, $3)")
            .bind(user_id)
            .bind(old_password)
            .bind(new_password)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable(PROC))?;

        let Some(row) = row else { return Ok(None) };
        let (success, message) = outcome_header(&row, PROC)?;
        Ok(Some(if success {
            StoreOutcome::accepted(message, ())
        } else {
            StoreOutcome::rejected(message)
        }))
    }
}

use anyhow::{Context, Result};
use auth_gateway::AuthenticationGate;
use auth_identity::{
    CredentialStore, IdentityConfig, InMemoryStore, SessionCoordinator, SessionStore, TokenCodec,
};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

use crate::config::{AppConfig, StoreBackend};
use crate::store::PgStore;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<SessionCoordinator>,
    pub gate: AuthenticationGate,
    /// Read the client address from proxy headers
    pub trust_forwarded_headers: bool,
}

impl AppState {
    pub fn new(
        codec: Arc<TokenCodec>,
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        default_role_id: i32,
    ) -> Self {
        Self {
            coordinator: Arc::new(SessionCoordinator::new(
                codec.clone(),
                credentials,
                sessions,
                default_role_id,
            )),
            gate: AuthenticationGate::new(codec),
            trust_forwarded_headers: false,
        }
    }

    pub fn with_trusted_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_forwarded_headers = trust;
        self
    }

    /// State backed by a process-local store. The store is returned too so
    /// callers can seed users.
    pub fn in_memory(config: &IdentityConfig) -> Result<(Self, Arc<InMemoryStore>)> {
        let codec = Arc::new(TokenCodec::new(config)?);
        let store = Arc::new(InMemoryStore::new(codec.clone()));
        Ok((Self::with_store(codec, store.clone(), config), store))
    }

    /// Build state around an already constructed memory store.
    pub fn with_store(
        codec: Arc<TokenCodec>,
        store: Arc<InMemoryStore>,
        config: &IdentityConfig,
    ) -> Self {
        Self::new(codec, store.clone(), store, config.default_role_id)
    }

    pub async fn postgres(config: &AppConfig) -> Result<Self> {
        let url = config
            .store
            .database_url
            .as_ref()
            .context("store.database_url is not set")?;

        let pool = PgPoolOptions::new()
            .max_connections(config.store.max_connections)
            .connect(url.expose_secret())
            .await
            .context("failed to connect to the session database")?;

        let codec = Arc::new(TokenCodec::new(&config.auth)?);
        let store = Arc::new(PgStore::new(pool));
        Ok(Self::new(codec, store.clone(), store, config.auth.default_role_id))
    }

    /// Build state for whichever backend the configuration selects.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let state = match config.store.backend {
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory store; users and sessions are lost on restart");
                Self::in_memory(&config.auth)?.0
            }
            StoreBackend::Postgres => Self::postgres(config).await?,
        };
        Ok(state.with_trusted_proxy_headers(config.server.trust_forwarded_headers))
    }
}

//! Server configuration
//!
//! Values are layered: built-in defaults, then the optional config file,
//! then `USER_AUTH__<SECTION>__<KEY>` environment variables. CLI flags are
//! applied on top by the binary.

use anyhow::{Context, Result};
use auth_identity::IdentityConfig;
use config::{Config, Environment, File};
use logger_redacted::LoggerConfig;
use secrecy::SecretString;
use serde::Deserialize;

pub const ENV_PREFIX: &str = "USER_AUTH";
pub const DEFAULT_CONFIG_FILE: &str = "user-auth.toml";

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSection,
    pub auth: IdentityConfig,
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub logging: LoggerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`
    pub trust_forwarded_headers: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            trust_forwarded_headers: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub backend: StoreBackend,
    pub database_url: Option<SecretString>,
    pub max_connections: u32,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database_url: None,
            max_connections: 10,
        }
    }
}

impl AppConfig {
    /// Load from `path` (optional on disk) and the environment.
    pub fn load(path: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to read configuration from {path}"))?;

        let config: Self = config
            .try_deserialize()
            .context("invalid configuration (is USER_AUTH__AUTH__JWT_SECRET set?)")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.auth
            .validate()
            .context("invalid [auth] configuration")?;
        if self.store.backend == StoreBackend::Postgres && self.store.database_url.is_none() {
            anyhow::bail!("store.database_url is required for the postgres backend");
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

use secrecy::{ExposeSecret, Secret, SecretString};
use serde::Deserialize;

use crate::error::{IdentityError, Result};

pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 1800;
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 2_592_000;
pub const DEFAULT_ROLE_ID: i32 = 3;
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Deserialize)]
pub struct IdentityConfig {
    /// HS256 signing secret shared by every token in circulation
    pub jwt_secret: SecretString,
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_secs: i64,
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_secs: i64,
    /// Role assigned to newly registered users
    #[serde(default = "default_role_id")]
    pub default_role_id: i32,
}

fn default_access_ttl() -> i64 {
    DEFAULT_ACCESS_TOKEN_TTL_SECS
}

fn default_refresh_ttl() -> i64 {
    DEFAULT_REFRESH_TOKEN_TTL_SECS
}

fn default_role_id() -> i32 {
    DEFAULT_ROLE_ID
}

impl IdentityConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: Secret::new(jwt_secret.into()),
            access_token_ttl_secs: DEFAULT_ACCESS_TOKEN_TTL_SECS,
            refresh_token_ttl_secs: DEFAULT_REFRESH_TOKEN_TTL_SECS,
            default_role_id: DEFAULT_ROLE_ID,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let secret_len = self.jwt_secret.expose_secret().len();
        if secret_len == 0 {
            return Err(IdentityError::Configuration("jwt_secret is empty".into()));
        }
        if secret_len < MIN_SECRET_LEN {
            return Err(IdentityError::Configuration(format!(
                "jwt_secret must be at least {MIN_SECRET_LEN} bytes, got {secret_len}"
            )));
        }
        if self.access_token_ttl_secs <= 0 || self.refresh_token_ttl_secs <= 0 {
            return Err(IdentityError::Configuration(
                "token lifetimes must be positive".into(),
            ));
        }
        Ok(())
    }
}

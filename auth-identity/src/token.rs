//! Signed bearer tokens.
//!
//! Tokens are standard three-segment HS256 JWTs. Access tokens carry the
//! caller's [`Identity`]; refresh tokens carry only the user id and
//! `"type": "refresh"`. `user_id` travels as a decimal string.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

use crate::config::IdentityConfig;
use crate::error::{IdentityError, Result, VerificationError};
use crate::models::{Identity, Role, UserId};

const ACCESS_KIND: &str = "access";
const REFRESH_KIND: &str = "refresh";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    pub identity: Identity,
    pub issued_at: i64,
    pub expires_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshClaims {
    pub user_id: UserId,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// Verified claims, tagged by token kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claims {
    Access(AccessClaims),
    Refresh(RefreshClaims),
}

#[derive(Serialize)]
struct AccessPayload<'a> {
    user_id: String,
    email: &'a str,
    login: &'a str,
    role: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    jti: String,
    iat: i64,
    exp: i64,
}

#[derive(Serialize)]
struct RefreshPayload {
    user_id: String,
    #[serde(rename = "type")]
    kind: &'static str,
    jti: String,
    iat: i64,
    exp: i64,
}

/// Issues and verifies tokens with one process-wide symmetric key.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &Algorithm::HS256)
            .field("access_ttl_secs", &self.access_ttl.num_seconds())
            .field("refresh_ttl_secs", &self.refresh_ttl.num_seconds())
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(config: &IdentityConfig) -> Result<Self> {
        config.validate()?;
        let secret = config.jwt_secret.expose_secret().as_bytes();

        // Expiry is checked against the caller's clock, not the library's.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            access_ttl: Duration::seconds(config.access_token_ttl_secs),
            refresh_ttl: Duration::seconds(config.refresh_token_ttl_secs),
        })
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn issue_access_token(&self, identity: &Identity, now: DateTime<Utc>) -> Result<String> {
        let payload = AccessPayload {
            user_id: identity.user_id.to_string(),
            email: &identity.email,
            login: &identity.login,
            role: identity.role.as_str(),
            kind: ACCESS_KIND,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };
        let token = self.sign(&payload)?;
        tracing::debug!(user_id = identity.user_id, "Issued access token");
        Ok(token)
    }

    pub fn issue_refresh_token(&self, user_id: UserId, now: DateTime<Utc>) -> Result<String> {
        let payload = RefreshPayload {
            user_id: user_id.to_string(),
            kind: REFRESH_KIND,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + self.refresh_ttl).timestamp(),
        };
        let token = self.sign(&payload)?;
        tracing::debug!(user_id, "Issued refresh token");
        Ok(token)
    }

    fn sign<T: Serialize>(&self, payload: &T) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), payload, &self.encoding)
            .map_err(|e| IdentityError::TokenIssuance(e.to_string()))
    }

    /// Verify `raw` and return its claims.
    ///
    /// Anything without exactly two `.` separators is rejected before the
    /// signature is looked at. A token is still valid at the exact second of
    /// its `exp`.
    pub fn decode_and_verify(
        &self,
        raw: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<Claims, VerificationError> {
        let dots = raw.matches('.').count();
        if dots != 2 {
            tracing::debug!(dots, "Token rejected before verification");
            return Err(VerificationError::MalformedToken);
        }

        let data = decode::<Map<String, Value>>(raw, &self.decoding, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    VerificationError::BadSignature
                }
                ErrorKind::ExpiredSignature => VerificationError::Expired,
                _ => VerificationError::MalformedToken,
            },
        )?;
        let claims = data.claims;

        let expires_at = timestamp_claim(&claims, "exp")?;
        if now.timestamp() > expires_at {
            return Err(VerificationError::Expired);
        }
        let issued_at = timestamp_claim(&claims, "iat")?;
        let user_id = user_id_claim(&claims)?;

        match claims.get("type").and_then(Value::as_str) {
            Some(REFRESH_KIND) => Ok(Claims::Refresh(RefreshClaims {
                user_id,
                issued_at,
                expires_at,
            })),
            // tokens minted without a kind are access tokens
            Some(ACCESS_KIND) | None => Ok(Claims::Access(AccessClaims {
                identity: Identity {
                    user_id,
                    email: string_claim(&claims, "email")?,
                    login: string_claim(&claims, "login")?,
                    role: Role::from_name(&string_claim(&claims, "role")?),
                },
                issued_at,
                expires_at,
            })),
            Some(_) => Err(VerificationError::MalformedToken),
        }
    }

    /// Verify an access token. A refresh token lacks the identity claims and
    /// fails here.
    pub fn decode_access(
        &self,
        raw: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<AccessClaims, VerificationError> {
        match self.decode_and_verify(raw, now)? {
            Claims::Access(claims) => Ok(claims),
            Claims::Refresh(_) => Err(VerificationError::MissingClaim("email")),
        }
    }

    pub fn decode_refresh(
        &self,
        raw: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<RefreshClaims, VerificationError> {
        match self.decode_and_verify(raw, now)? {
            Claims::Refresh(claims) => Ok(claims),
            Claims::Access(_) => Err(VerificationError::MissingClaim("type")),
        }
    }
}

fn timestamp_claim(
    claims: &Map<String, Value>,
    name: &'static str,
) -> std::result::Result<i64, VerificationError> {
    let value = claims.get(name).ok_or(VerificationError::MissingClaim(name))?;
    value
        .as_i64()
        .or_else(|| value.as_u64().and_then(|v| i64::try_from(v).ok()))
        .ok_or(VerificationError::MalformedToken)
}

fn string_claim(
    claims: &Map<String, Value>,
    name: &'static str,
) -> std::result::Result<String, VerificationError> {
    match claims.get(name) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(VerificationError::MalformedToken),
        None => Err(VerificationError::MissingClaim(name)),
    }
}

fn user_id_claim(claims: &Map<String, Value>) -> std::result::Result<UserId, VerificationError> {
    match claims.get("user_id") {
        Some(Value::String(s)) => s
            .trim()
            .parse::<UserId>()
            .map_err(|_| VerificationError::MalformedToken),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|v| UserId::try_from(v).ok())
            .ok_or(VerificationError::MalformedToken),
        Some(_) => Err(VerificationError::MalformedToken),
        None => Err(VerificationError::MissingClaim("user_id")),
    }
}

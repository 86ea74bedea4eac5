use auth_identity::{Identity, TokenCodec};
use chrono::{DateTime, Utc};
use http::{header::AUTHORIZATION, HeaderMap};
use std::sync::Arc;

use crate::error::GatewayError;

pub const BEARER_PREFIX: &str = "Bearer ";

/// Pull the bearer token out of the `Authorization` header.
///
/// Only the exact `"Bearer "` prefix is accepted. Any other scheme counts as
/// no token at all.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        tracing::debug!("Authorization header absent");
        return None;
    };
    let Ok(value) = value.to_str() else {
        tracing::warn!(header_len = value.len(), "Authorization header is not visible ASCII");
        return None;
    };

    match value.strip_prefix(BEARER_PREFIX) {
        Some(token) if !token.is_empty() => {
            tracing::debug!(
                header_len = value.len(),
                token_len = token.len(),
                "Bearer token extracted"
            );
            Some(token)
        }
        _ => {
            let scheme = value.split_whitespace().next().unwrap_or_default();
            tracing::warn!(
                header_len = value.len(),
                scheme,
                "Authorization header is not a Bearer token"
            );
            None
        }
    }
}

/// Outcome of authenticating one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthDecision {
    pub authenticated: bool,
    pub identity: Option<Identity>,
    pub failure_reason: Option<&'static str>,
}

impl AuthDecision {
    fn granted(identity: Identity) -> Self {
        Self {
            authenticated: true,
            identity: Some(identity),
            failure_reason: None,
        }
    }

    fn denied(error: GatewayError) -> Self {
        Self {
            authenticated: false,
            identity: None,
            failure_reason: Some(error.message()),
        }
    }
}

/// Immutable per-request authentication state handed to protected handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub token: String,
    pub identity: Identity,
}

#[derive(Debug, Clone)]
pub struct AuthenticationGate {
    codec: Arc<TokenCodec>,
}

impl AuthenticationGate {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }

    pub fn authenticate(&self, headers: &HeaderMap, now: DateTime<Utc>) -> AuthDecision {
        match self.verify(headers, now) {
            Ok(context) => AuthDecision::granted(context.identity),
            Err(error) => AuthDecision::denied(error),
        }
    }

    /// Same check as [`authenticate`](Self::authenticate), keeping the raw
    /// token for operations that forward it (logout).
    pub fn verify(
        &self,
        headers: &HeaderMap,
        now: DateTime<Utc>,
    ) -> Result<RequestContext, GatewayError> {
        let token = extract_token(headers).ok_or(GatewayError::MissingAuthorization)?;

        match self.codec.decode_access(token, now) {
            Ok(claims) => {
                tracing::debug!(
                    user_id = claims.identity.user_id,
                    role = %claims.identity.role,
                    "Request authenticated"
                );
                Ok(RequestContext {
                    token: token.to_string(),
                    identity: claims.identity,
                })
            }
            Err(error) => {
                tracing::warn!(%error, "Token verification failed");
                Err(GatewayError::InvalidToken)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use auth_identity::{IdentityConfig, Role};
    use chrono::Duration;
    use http::HeaderValue;

    fn gate() -> AuthenticationGate {
        let config = IdentityConfig::new("gate-test-secret-0123456789abcdefgh");
        let codec = TokenCodec::new(&config).unwrap();
        AuthenticationGate::new(Arc::new(codec))
    }

    fn identity() -> Identity {
        Identity {
            user_id: 3,
            email: "bob@example.com".to_string(),
            login: "bob".to_string(),
            role: Role::User,
        }
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(extract_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
    }

    #[test]
    fn other_schemes_yield_nothing() {
        assert_eq!(extract_token(&headers("Basic xyz")), None);
        assert_eq!(extract_token(&headers("bearer abc")), None);
        assert_eq!(extract_token(&headers("Bearer")), None);
        assert_eq!(extract_token(&headers("Bearer ")), None);
        assert_eq!(extract_token(&HeaderMap::new()), None);
    }

    #[test]
    fn basic_scheme_is_missing_authorization() {
        let decision = gate().authenticate(&headers("Basic xyz"), Utc::now());
        assert!(!decision.authenticated);
        assert_eq!(decision.identity, None);
        assert_eq!(decision.failure_reason, Some("Missing Authorization header"));
    }

    #[test]
    fn valid_token_is_granted() {
        let gate = gate();
        let now = Utc::now();
        let token = gate.codec.issue_access_token(&identity(), now).unwrap();

        let decision = gate.authenticate(&headers(&format!("Bearer {token}")), now);
        assert!(decision.authenticated);
        assert_eq!(decision.identity, Some(identity()));
        assert_eq!(decision.failure_reason, None);
    }

    #[test]
    fn expired_token_is_invalid() {
        let gate = gate();
        let issued = Utc::now() - Duration::hours(1);
        let token = gate.codec.issue_access_token(&identity(), issued).unwrap();

        let decision = gate.authenticate(&headers(&format!("Bearer {token}")), Utc::now());
        assert!(!decision.authenticated);
        assert_eq!(decision.failure_reason, Some("Invalid or expired token"));
    }

    #[test]
    fn refresh_token_is_not_accepted_as_access() {
        let gate = gate();
        let now = Utc::now();
        let token = gate.codec.issue_refresh_token(3, now).unwrap();

        let err = gate.verify(&headers(&format!("Bearer {token}")), now).unwrap_err();
        assert_eq!(err, GatewayError::InvalidToken);
    }

    #[test]
    fn malformed_token_is_invalid_not_missing() {
        let decision = gate().authenticate(&headers("Bearer not-a-jwt"), Utc::now());
        assert_eq!(decision.failure_reason, Some("Invalid or expired token"));
    }

    #[test]
    fn verify_keeps_raw_token() {
        let gate = gate();
        let now = Utc::now();
        let token = gate.codec.issue_access_token(&identity(), now).unwrap();

        let context = gate.verify(&headers(&format!("Bearer {token}")), now).unwrap();
        assert_eq!(context.token, token);
        assert_eq!(context.identity.user_id, 3);
    }
}

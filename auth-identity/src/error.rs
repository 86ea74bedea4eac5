use error_common::{sanitization, ErrorCategory};
use thiserror::Error;

/// Why a raw token was rejected.
///
/// Only ever logged. Callers see a single "Invalid or expired token".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("malformed token")]
    MalformedToken,

    #[error("token signature does not verify")]
    BadSignature,

    #[error("token expired")]
    Expired,

    #[error("token is missing the `{0}` claim")]
    MissingClaim(&'static str),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

/// I/O level failure of a credential or session store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error(transparent)]
    Verification(#[from] VerificationError),

    /// Bad credentials or a refused refresh, carrying the store's message
    #[error("{0}")]
    AuthenticationFailed(String),

    /// The store refused the operation; its message is safe to show
    #[error("{0}")]
    BusinessRule(String),

    #[error("{0}")]
    NotFound(String),

    /// The store answered with no row at all
    #[error("{0}")]
    NoResult(&'static str),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("token issuance failed: {0}")]
    TokenIssuance(String),

    #[error("invalid identity configuration: {0}")]
    Configuration(String),
}

impl IdentityError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Verification(_) | Self::AuthenticationFailed(_) => ErrorCategory::Authentication,
            Self::BusinessRule(_) => ErrorCategory::BusinessRule,
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::StoreUnavailable(_) => ErrorCategory::StoreUnavailable,
            Self::NoResult(_) | Self::TokenIssuance(_) | Self::Configuration(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// Message that may be returned to the caller.
    pub fn public_message(&self) -> String {
        match self {
            Self::Verification(_) => sanitization::INVALID_TOKEN.to_string(),
            Self::StoreUnavailable(_) => sanitization::DATABASE_ERROR.to_string(),
            Self::TokenIssuance(_) => sanitization::TOKEN_GENERATION_FAILED.to_string(),
            Self::Configuration(_) => sanitization::INTERNAL_ERROR.to_string(),
            Self::AuthenticationFailed(message)
            | Self::BusinessRule(message)
            | Self::NotFound(message) => message.clone(),
            Self::NoResult(message) => (*message).to_string(),
        }
    }
}

impl From<StoreError> for IdentityError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(detail) => Self::StoreUnavailable(detail),
        }
    }
}

pub type Result<T> = std::result::Result<T, IdentityError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn verification_errors_never_leak_detail() {
        for err in [
            VerificationError::MalformedToken,
            VerificationError::BadSignature,
            VerificationError::Expired,
            VerificationError::MissingClaim("user_id"),
        ] {
            let err = IdentityError::from(err);
            assert_eq!(err.public_message(), "Invalid or expired token");
            assert_eq!(err.category().status_code(), 401);
        }
    }

    #[test]
    fn store_failure_is_reported_generically() {
        let err = IdentityError::from(StoreError::Unavailable("connection refused".into()));
        assert_eq!(err.public_message(), "Database error");
        assert_eq!(err.category().status_code(), 500);
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn business_rule_is_surfaced_verbatim() {
        let err = IdentityError::BusinessRule("Login already taken".into());
        assert_eq!(err.public_message(), "Login already taken");
        assert_eq!(err.category().status_code(), 400);
    }

    #[test]
    fn empty_store_answer_keeps_operation_message() {
        let err = IdentityError::NoResult("Logout failed");
        assert_eq!(err.public_message(), "Logout failed");
        assert_eq!(err.category().status_code(), 500);
    }
}

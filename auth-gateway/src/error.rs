use error_common::{sanitization, ErrorCategory};
use thiserror::Error;

/// Gate and policy rejections. The display text is what the caller sees.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayError {
    #[error("{}", sanitization::MISSING_AUTHORIZATION)]
    MissingAuthorization,

    #[error("{}", sanitization::INVALID_TOKEN)]
    InvalidToken,

    #[error("{}", sanitization::ACCESS_DENIED)]
    AccessDenied,
}

impl GatewayError {
    pub fn category(self) -> ErrorCategory {
        match self {
            Self::MissingAuthorization | Self::InvalidToken => ErrorCategory::Authentication,
            Self::AccessDenied => ErrorCategory::Authorization,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::MissingAuthorization => sanitization::MISSING_AUTHORIZATION,
            Self::InvalidToken => sanitization::INVALID_TOKEN,
            Self::AccessDenied => sanitization::ACCESS_DENIED,
        }
    }
}

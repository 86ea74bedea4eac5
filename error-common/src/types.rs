use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codes;

/// Broad classification every error in the engine maps onto.
///
/// The category decides the HTTP status and whether the underlying detail may
/// be shown to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Missing or malformed request fields
    Validation,
    /// Missing credentials, bad credentials, rejected tokens
    Authentication,
    /// Authenticated but not allowed to touch the resource
    Authorization,
    /// Requested resource does not exist
    NotFound,
    /// The store refused the operation with its own message
    BusinessRule,
    /// The store could not be reached or failed mid-call
    StoreUnavailable,
    /// Anything else
    Internal,
}

impl ErrorCategory {
    /// HTTP status code for the category
    pub fn status_code(self) -> u16 {
        match self {
            Self::Validation | Self::BusinessRule => 400,
            Self::Authentication => 401,
            Self::Authorization => 403,
            Self::NotFound => 404,
            Self::StoreUnavailable | Self::Internal => 500,
        }
    }

    /// Stable error code reported in logs
    pub fn code(self) -> &'static str {
        match self {
            Self::Validation => codes::validation::INVALID_INPUT,
            Self::Authentication => codes::authentication::AUTHENTICATION_FAILED,
            Self::Authorization => codes::authorization::ACCESS_DENIED,
            Self::NotFound => codes::store::NOT_FOUND,
            Self::BusinessRule => codes::store::BUSINESS_RULE,
            Self::StoreUnavailable => codes::store::UNAVAILABLE,
            Self::Internal => codes::internal::UNEXPECTED,
        }
    }

    /// Whether the detailed message of an error in this category may be
    /// returned to the client verbatim.
    pub fn exposes_detail(self) -> bool {
        !matches!(self, Self::StoreUnavailable | Self::Internal)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validation => "validation_error",
            Self::Authentication => "authentication_error",
            Self::Authorization => "authorization_error",
            Self::NotFound => "not_found",
            Self::BusinessRule => "business_rule_failure",
            Self::StoreUnavailable => "store_unavailable",
            Self::Internal => "internal_error",
        };
        f.write_str(name)
    }
}

use auth_gateway::GatewayError;
use auth_identity::IdentityError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use error_common::{sanitization, ErrorCategory};
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use crate::envelope::ApiResponse;

pub type ApiResult<T> = Result<T, ApiError>;

/// Main API error enum
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    Validation { message: String },

    #[error("{message}")]
    Authentication { message: String },

    #[error("{message}")]
    Authorization { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    BusinessRule { message: String },

    #[error("store unavailable: {detail}")]
    StoreUnavailable { detail: String },

    #[error("{message}: {detail}")]
    Internal { message: String, detail: String },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub fn missing_fields(fields: &[&str]) -> Self {
        Self::validation(sanitization::missing_fields_message(fields))
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ApiError::Validation { .. } => ErrorCategory::Validation,
            ApiError::Authentication { .. } => ErrorCategory::Authentication,
            ApiError::Authorization { .. } => ErrorCategory::Authorization,
            ApiError::NotFound { .. } => ErrorCategory::NotFound,
            ApiError::BusinessRule { .. } => ErrorCategory::BusinessRule,
            ApiError::StoreUnavailable { .. } => ErrorCategory::StoreUnavailable,
            ApiError::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.category().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Message placed in the response envelope
    pub fn public_message(&self) -> String {
        match self {
            ApiError::StoreUnavailable { .. } => sanitization::DATABASE_ERROR.to_string(),
            ApiError::Internal { message, .. } => message.clone(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let category = self.category();

        if !category.exposes_detail() {
            let error_id = Uuid::new_v4();
            error!(
                %error_id,
                error_code = category.code(),
                status_code = status_code.as_u16(),
                error = %self,
                "API error occurred"
            );
        } else {
            warn!(
                error_type = %category,
                status_code = status_code.as_u16(),
                message = %self,
                "Request rejected"
            );
        }

        let body = ApiResponse::<()>::failure(self.public_message());
        (status_code, Json(body)).into_response()
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        let message = err.public_message();
        match err.category() {
            ErrorCategory::Validation => ApiError::Validation { message },
            ErrorCategory::Authentication => ApiError::Authentication { message },
            ErrorCategory::Authorization => ApiError::Authorization { message },
            ErrorCategory::NotFound => ApiError::NotFound { message },
            ErrorCategory::BusinessRule => ApiError::BusinessRule { message },
            ErrorCategory::StoreUnavailable => ApiError::StoreUnavailable {
                detail: err.to_string(),
            },
            ErrorCategory::Internal => ApiError::Internal {
                message,
                detail: err.to_string(),
            },
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        let message = err.message().to_string();
        match err {
            GatewayError::MissingAuthorization | GatewayError::InvalidToken => {
                ApiError::Authentication { message }
            }
            GatewayError::AccessDenied => ApiError::Authorization { message },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "Request body rejected");
        ApiError::validation(sanitization::INVALID_JSON)
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "Path parameter rejected");
        ApiError::validation("Invalid user id")
    }
}

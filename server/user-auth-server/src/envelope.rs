use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};

/// Uniform payload of every response: `{success, message, data}`.
///
/// `data` is `null` on failures and on successes without a payload.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

pub type Reply<T> = (StatusCode, Json<ApiResponse<T>>);

pub fn ok<T>(envelope: ApiResponse<T>) -> Reply<T> {
    (StatusCode::OK, Json(envelope))
}

pub fn created<T>(envelope: ApiResponse<T>) -> Reply<T> {
    (StatusCode::CREATED, Json(envelope))
}

//! Common error handling utilities for the user auth engine
//!
//! This module provides the error taxonomy shared by every crate in the
//! workspace. Each crate keeps its own `thiserror` enum and maps it onto an
//! [`ErrorCategory`], which fixes the HTTP status and whether the detail may be
//! surfaced to the caller.
//!
//! # Error Categories
//!
//! - **Validation**: missing or invalid request fields (400)
//! - **Authentication**: missing header, bad credentials, rejected tokens (401)
//! - **Authorization**: caller is neither the owner nor an admin (403)
//! - **NotFound**: unknown resource (404)
//! - **BusinessRule**: the store's own refusal, surfaced verbatim (400)
//! - **StoreUnavailable**: store I/O failure, reported as "Database error" (500)
//!
//! # Example
//!
//! ```rust
//! use error_common::{ErrorCategory, sanitization};
//!
//! let category = ErrorCategory::StoreUnavailable;
//! let message = if category.exposes_detail() {
//!     "connection refused".to_string()
//! } else {
//!     sanitization::DATABASE_ERROR.to_string()
//! };
//! assert_eq!(category.status_code(), 500);
//! assert_eq!(message, "Database error");
//! ```

pub mod codes;
pub mod sanitization;
pub mod types;

pub use types::*;

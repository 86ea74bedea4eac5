//! Request validation utilities for consistent validation across handlers
//!
//! Request bodies deserialize into structs of optional fields. Validating one
//! turns it into the domain type the coordinator takes, or into a single
//! `ApiError` naming every field that was absent or empty.

use crate::error::ApiError;

/// Trait for validating request payloads
pub trait RequestValidation {
    /// What the payload becomes once every required field is present
    type Valid;

    fn validate(self) -> Result<Self::Valid, ApiError>;
}

/// Collects required string fields, remembering which ones are missing.
#[derive(Debug, Default)]
pub struct RequiredFields {
    missing: Vec<&'static str>,
}

impl RequiredFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a field's value. Absent and empty values are both recorded as
    /// missing.
    pub fn take(&mut self, name: &'static str, value: Option<String>) -> String {
        match value {
            Some(value) if !value.is_empty() => value,
            _ => {
                self.missing.push(name);
                String::new()
            }
        }
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ApiError::missing_fields(&self.missing))
        }
    }
}

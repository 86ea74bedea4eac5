// Client-facing messages
// Errors whose detail must not leak collapse onto one of these constants.

pub const MISSING_AUTHORIZATION: &str = "Missing Authorization header";
pub const INVALID_TOKEN: &str = "Invalid or expired token";
pub const ACCESS_DENIED: &str = "Access denied";
pub const DATABASE_ERROR: &str = "Database error";
pub const TOKEN_GENERATION_FAILED: &str = "Failed to generate tokens";
pub const INVALID_JSON: &str = "Invalid JSON";
pub const INTERNAL_ERROR: &str = "Internal server error";

/// Build the validation message listing every missing field, in the order given.
pub fn missing_fields_message(fields: &[&str]) -> String {
    format!("Missing required fields: {}", fields.join(", "))
}

// Error codes implementation
// This module contains standardized error codes for the user auth engine

pub mod validation {
    pub const INVALID_INPUT: &str = "VALIDATION_1001";
}

pub mod authentication {
    pub const AUTHENTICATION_FAILED: &str = "AUTH_2001";
}

pub mod authorization {
    pub const ACCESS_DENIED: &str = "AUTHZ_3001";
}

pub mod store {
    pub const UNAVAILABLE: &str = "STORE_4001";
    pub const BUSINESS_RULE: &str = "STORE_4002";
    pub const NOT_FOUND: &str = "STORE_4003";
}

pub mod internal {
    pub const UNEXPECTED: &str = "INTERNAL_5001";
}

//! Route path constants

pub const API_V1: &str = "/api/v1";

pub mod health {
    pub const HEALTH: &str = "/health";
}

pub mod auth {
    pub const REGISTER: &str = "/auth/register";
    pub const LOGIN: &str = "/auth/login";
    pub const REFRESH: &str = "/auth/refresh";
    pub const LOGOUT: &str = "/auth/logout";
}

pub mod users {
    pub const USER_BY_ID: &str = "/users/:id";
    pub const PASSWORD: &str = "/users/:id/password";
    pub const SESSIONS: &str = "/users/:id/sessions";
}

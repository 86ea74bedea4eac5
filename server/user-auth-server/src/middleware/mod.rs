//! Request extractors shared by the handlers

pub mod auth_context;
pub mod client_info;

pub use auth_context::Authenticated;
pub use client_info::ClientInfo;

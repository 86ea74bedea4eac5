//! Identity and session core for the user auth engine
//!
//! This crate provides:
//! - The identity model (`Identity`, the closed `Role` set, session records)
//! - `TokenCodec`, which issues and verifies HS256 access and refresh tokens
//! - The `CredentialStore` and `SessionStore` ports the core talks to
//! - `SessionCoordinator`, the login / refresh / logout protocol
//! - `InMemoryStore`, a process-local implementation of both ports
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use auth_identity::{
//!     ClientMetadata, Credentials, IdentityConfig, InMemoryStore, Registration,
//!     SessionCoordinator, TokenCodec,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = IdentityConfig::new("an-hs256-secret-of-at-least-32-bytes!");
//! let codec = Arc::new(TokenCodec::new(&config)?);
//! let store = Arc::new(InMemoryStore::new(codec.clone()));
//! let coordinator = SessionCoordinator::new(codec, store.clone(), store, config.default_role_id);
//!
//! coordinator
//!     .register(&Registration {
//!         email: "alice@example.com".into(),
//!         login: "alice".into(),
//!         password: "correct".into(),
//!         phone: String::new(),
//!     })
//!     .await?;
//!
//! let client = ClientMetadata::new("127.0.0.1", "doc-test");
//! let login = coordinator
//!     .login(&Credentials { login: "alice".into(), password: "correct".into() }, &client)
//!     .await?;
//! let rotated = coordinator.refresh(&login.tokens.refresh_token, &client).await?;
//! assert_ne!(rotated.refresh_token, login.tokens.refresh_token);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod memory;
pub mod models;
pub mod repository;
pub mod service;
pub mod token;

pub use config::*;
pub use error::*;
pub use memory::InMemoryStore;
pub use models::*;
pub use repository::{CredentialStore, SessionStore};
pub use service::*;
pub use token::*;

//! Authentication and authorization gateway for the user auth engine
//!
//! - [`AuthenticationGate`] turns an inbound request's `Authorization` header
//!   into an [`AuthDecision`] or a [`RequestContext`]
//! - [`AuthorizationPolicy`] decides whether an identity may act on a user's
//!   resources (self or admin)
//!
//! Neither performs I/O. The only shared state is the token codec's signing
//! key.

pub mod error;
pub mod gate;
pub mod policy;

pub use error::*;
pub use gate::*;
pub use policy::*;

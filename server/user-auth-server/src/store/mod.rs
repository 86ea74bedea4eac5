//! Store adapters that live outside the core

pub mod postgres;

pub use postgres::PgStore;

//! RiceTrace DB — SurrealDB connection management and store
//! implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Error types ([`DbError`])
//! - [`SurrealBatchStore`] and [`SurrealRoleStore`], the SurrealDB
//!   implementations of the `ricetrace-core` store traits

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use repository::{SurrealBatchStore, SurrealRoleStore};
pub use schema::{run_migrations, schema_v1};

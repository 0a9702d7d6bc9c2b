//! Shared database configuration and migration infrastructure.
//! Used by the storage backends and the migration CLI.

pub mod config;
pub mod error;
pub mod infra;

pub use config::db;
pub use error::DbInfraError;
pub use infra::db::core::{connect, orchestrate_migration, orchestrate_migration_internal};

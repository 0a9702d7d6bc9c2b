//! Backend test support utilities
//!
//! Shared by the integration tests of the backends and the migration CLI:
//! logging initialization, throwaway SQLite databases and unique test data.

pub mod db;
pub mod logging;
pub mod unique_helpers;

pub use db::{fresh_sqlite_db, sqlite_columns, sqlite_indexes};

pub mod core;

pub use core::{
    connect, orchestrate_migration, orchestrate_migration_internal, redacted_conn_url, sanitize_db_url,
};

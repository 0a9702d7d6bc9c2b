//! Throwaway SQLite databases.

use migration::{Migrator, MigratorTrait};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement,
};

/// An in-memory database migrated to the latest schema.
///
/// The pool holds a single connection: every pooled connection to
/// `sqlite::memory:` would otherwise open its own empty database.
pub async fn fresh_sqlite_db() -> Result<DatabaseConnection, DbErr> {
    let conn = empty_sqlite_db().await?;
    Migrator::up(&conn, None).await?;
    Ok(conn)
}

/// An in-memory database with no tables at all.
pub async fn empty_sqlite_db() -> Result<DatabaseConnection, DbErr> {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    Database::connect(opts).await
}

/// Column names of `table`, in declaration order.
pub async fn sqlite_columns<C: ConnectionTrait>(conn: &C, table: &str) -> Result<Vec<String>, DbErr> {
    let rows = conn
        .query_all(Statement::from_string(
            conn.get_database_backend(),
            format!("PRAGMA table_info({table})"),
        ))
        .await?;
    rows.iter().map(|row| row.try_get::<String>("", "name")).collect()
}

/// Index names defined on `table`.
pub async fn sqlite_indexes<C: ConnectionTrait>(conn: &C, table: &str) -> Result<Vec<String>, DbErr> {
    let rows = conn
        .query_all(Statement::from_string(
            conn.get_database_backend(),
            format!("SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = '{table}'"),
        ))
        .await?;
    rows.iter().map(|row| row.try_get::<String>("", "name")).collect()
}

//! Schema version bookkeeping stored in the `db_dbsetting` table.
//!
//! The version lives under the `db|schemaversion` key. Migrations write it as
//! their last step; the django backend reads it when loading an environment.

use sea_orm::{ConnectionTrait, DbErr};
use sea_orm_migration::prelude::*;

use crate::idens::DbSetting;

pub const SCHEMA_VERSION_KEY: &str = "db|schemaversion";
const SCHEMA_VERSION_DESCRIPTION: &str = "Database schema version";

/// Read the recorded schema version, if any.
pub async fn get_schema_version<C>(conn: &C) -> Result<Option<String>, DbErr>
where
    C: ConnectionTrait,
{
    let stmt = Query::select()
        .column(DbSetting::Val)
        .from(DbSetting::Table)
        .and_where(Expr::col(DbSetting::Key).eq(SCHEMA_VERSION_KEY))
        .to_owned();

    let row = conn
        .query_one(conn.get_database_backend().build(&stmt))
        .await?;
    row.map(|r| r.try_get::<String>("", "val")).transpose()
}

/// Record `version` as the current schema version (insert or overwrite).
pub async fn set_schema_version<C>(conn: &C, version: &str) -> Result<(), DbErr>
where
    C: ConnectionTrait,
{
    let now = time::OffsetDateTime::now_utc();

    let mut stmt = Query::insert();
    stmt.into_table(DbSetting::Table).columns([
        DbSetting::Key,
        DbSetting::Val,
        DbSetting::Description,
        DbSetting::Time,
    ]);
    stmt.values([
        SCHEMA_VERSION_KEY.into(),
        version.into(),
        SCHEMA_VERSION_DESCRIPTION.into(),
        now.into(),
    ])
    .map_err(|e| DbErr::Custom(format!("failed to build schema version insert: {e}")))?;
    stmt.on_conflict(
        OnConflict::column(DbSetting::Key)
            .update_columns([DbSetting::Val, DbSetting::Time])
            .to_owned(),
    );

    conn.execute(conn.get_database_backend().build(&stmt))
        .await?;
    tracing::debug!(version, "schema version recorded");
    Ok(())
}

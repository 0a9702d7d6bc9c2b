//! Global key/value settings stored in `db_dbsetting`.

use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, Set};

use crate::entities::db_setting;
use crate::error::BackendError;

/// Email of the user the daemon runs as.
pub const DAEMON_USER_KEY: &str = "daemon|user";

pub async fn get_setting<C: ConnectionTrait>(
    conn: &C,
    key: &str,
) -> Result<Option<String>, BackendError> {
    let row = db_setting::Entity::find()
        .filter(db_setting::Column::Key.eq(key))
        .one(conn)
        .await?;
    Ok(row.map(|r| r.val))
}

/// Insert or overwrite the value stored under `key`.
pub async fn set_setting<C: ConnectionTrait>(
    conn: &C,
    key: &str,
    val: &str,
    description: &str,
) -> Result<(), BackendError> {
    let now = time::OffsetDateTime::now_utc();
    let existing = db_setting::Entity::find()
        .filter(db_setting::Column::Key.eq(key))
        .one(conn)
        .await?;

    match existing {
        Some(row) => {
            let mut active: db_setting::ActiveModel = row.into();
            active.val = Set(val.to_string());
            active.description = Set(description.to_string());
            active.time = Set(now);
            active.update(conn).await?;
        }
        None => {
            db_setting::ActiveModel {
                id: NotSet,
                key: Set(key.to_string()),
                val: Set(val.to_string()),
                description: Set(description.to_string()),
                time: Set(now),
            }
            .insert(conn)
            .await?;
        }
    }
    Ok(())
}

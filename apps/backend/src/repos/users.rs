//! User model and lookups (generic over ConnectionTrait).

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::entities::db_user;
use crate::error::BackendError;

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub institution: String,
    pub is_active: bool,
    pub date_joined: time::OffsetDateTime,
}

pub async fn find_user_by_email<C: ConnectionTrait>(
    conn: &C,
    email: &str,
) -> Result<Option<User>, BackendError> {
    let user = db_user::Entity::find()
        .filter(db_user::Column::Email.eq(email))
        .one(conn)
        .await?;
    Ok(user.map(User::from))
}

impl From<db_user::Model> for User {
    fn from(model: db_user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            institution: model.institution,
            is_active: model.is_active,
            date_joined: model.date_joined,
        }
    }
}

//! Computer model and lookups (generic over ConnectionTrait).

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde_json::Value;

use crate::entities::db_computer;
use crate::error::BackendError;
use crate::repos::parse_json;

#[derive(Debug, Clone, PartialEq)]
pub struct Computer {
    pub id: i32,
    pub uuid: String,
    pub label: String,
    pub hostname: String,
    pub description: String,
    pub enabled: bool,
    pub transport_type: String,
    pub scheduler_type: String,
    pub transport_params: Value,
    pub metadata: Value,
}

pub async fn find_computer_by_label<C: ConnectionTrait>(
    conn: &C,
    label: &str,
) -> Result<Option<Computer>, BackendError> {
    db_computer::Entity::find()
        .filter(db_computer::Column::Label.eq(label))
        .one(conn)
        .await?
        .map(Computer::try_from)
        .transpose()
}

impl TryFrom<db_computer::Model> for Computer {
    type Error = BackendError;

    fn try_from(model: db_computer::Model) -> Result<Self, Self::Error> {
        let transport_params = parse_json(&model.transport_params, "db_dbcomputer", model.id)?;
        let metadata = parse_json(&model.metadata, "db_dbcomputer", model.id)?;
        Ok(Self {
            id: model.id,
            uuid: model.uuid,
            label: model.label,
            hostname: model.hostname,
            description: model.description,
            enabled: model.enabled,
            transport_type: model.transport_type,
            scheduler_type: model.scheduler_type,
            transport_params,
            metadata,
        })
    }
}

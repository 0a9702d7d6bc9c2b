use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Computer row after the `name` -> `label` rename (schema 1.0.48).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "db_dbcomputer")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub uuid: String,
    #[sea_orm(unique)]
    pub label: String,
    pub hostname: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub enabled: bool,
    pub transport_type: String,
    pub scheduler_type: String,
    #[sea_orm(column_type = "Text")]
    pub transport_params: String,
    #[sea_orm(column_type = "Text")]
    pub metadata: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::db_authinfo::Entity")]
    AuthInfo,
}

impl Related<super::db_authinfo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthInfo.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

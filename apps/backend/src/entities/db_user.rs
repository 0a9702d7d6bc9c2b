use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "db_dbuser")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub institution: String,
    pub is_active: bool,
    pub date_joined: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::db_authinfo::Entity")]
    AuthInfo,
    #[sea_orm(has_many = "super::db_workflow::Entity")]
    Workflow,
}

impl Related<super::db_authinfo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthInfo.def()
    }
}

impl Related<super::db_workflow::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Workflow.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

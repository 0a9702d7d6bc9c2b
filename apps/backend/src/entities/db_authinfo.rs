use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "db_dbauthinfo")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub aiidauser_id: i32,
    pub dbcomputer_id: i32,
    #[sea_orm(column_type = "Text")]
    pub auth_params: String,
    #[sea_orm(column_type = "Text")]
    pub metadata: String,
    pub enabled: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::db_user::Entity",
        from = "Column::AiidauserId",
        to = "super::db_user::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::db_computer::Entity",
        from = "Column::DbcomputerId",
        to = "super::db_computer::Column::Id"
    )]
    Computer,
}

impl Related<super::db_user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::db_computer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Computer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

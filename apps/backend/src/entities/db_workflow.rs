use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum WorkflowState {
    #[sea_orm(string_value = "CREATED")]
    Created,
    #[sea_orm(string_value = "INITIALIZED")]
    Initialized,
    #[sea_orm(string_value = "RUNNING")]
    Running,
    #[sea_orm(string_value = "SLEEP")]
    Sleep,
    #[sea_orm(string_value = "FINISHED")]
    Finished,
    #[sea_orm(string_value = "ERROR")]
    Error,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "db_dbworkflow")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub uuid: String,
    pub ctime: OffsetDateTime,
    pub mtime: OffsetDateTime,
    pub user_id: i32,
    pub label: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub state: WorkflowState,
    #[sea_orm(column_type = "Text")]
    pub module: String,
    #[sea_orm(column_type = "Text")]
    pub module_class: String,
    #[sea_orm(column_type = "Text")]
    pub script_path: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::db_user::Entity",
        from = "Column::UserId",
        to = "super::db_user::Column::Id"
    )]
    User,
}

impl Related<super::db_user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

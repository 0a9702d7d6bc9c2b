//! Rename the `name` column of the computer table to `label`, together with
//! the two indexes PostgreSQL built on it.

use sea_orm_migration::prelude::*;

use crate::schema_ops::{Direction, MigrationPlan, SchemaOp};
use crate::Versioned;

#[derive(DeriveMigrationName)]
pub struct Migration;

impl Versioned for Migration {
    const REVISION: &'static str = "1.0.48";
    const DOWN_REVISION: Option<&'static str> = Some("1.0.47");

    fn plan() -> Option<MigrationPlan> {
        Some(plan())
    }
}

pub fn plan() -> MigrationPlan {
    MigrationPlan::new("1.0.48", "1.0.47")
        .op(SchemaOp::RenameColumn {
            table: "db_dbcomputer",
            from: "name",
            to: "label",
        })
        .op(SchemaOp::RenameIndex {
            from: "db_dbcomputer_name_key",
            to: "db_dbcomputer_label_bc480bab_uniq",
        })
        .op(SchemaOp::RenameIndex {
            from: "db_dbcomputer_name_f1800b1a_like",
            to: "db_dbcomputer_label_bc480bab_like",
        })
        .bump_version()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        plan().run(manager, Direction::Forward).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        plan().run(manager, Direction::Backward).await
    }
}

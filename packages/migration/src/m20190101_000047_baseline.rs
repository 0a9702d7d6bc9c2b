use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::{ColumnDef, ForeignKeyAction, Index, Table};

use crate::idens::{DbAuthInfo, DbComputer, DbLog, DbSetting, DbUser, DbWorkflow};
use crate::schema_version::set_schema_version;
use crate::Versioned;

#[derive(DeriveMigrationName)]
pub struct Migration;

impl Versioned for Migration {
    const REVISION: &'static str = "1.0.47";
    const DOWN_REVISION: Option<&'static str> = None;
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // db_dbuser
        manager
            .create_table(
                Table::create()
                    .table(DbUser::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DbUser::Id)
                            .integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(DbUser::Email).string().not_null())
                    .col(
                        ColumnDef::new(DbUser::FirstName)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(DbUser::LastName)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(DbUser::Institution)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(DbUser::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(DbUser::DateJoined)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("db_dbuser_email_key")
                    .table(DbUser::Table)
                    .col(DbUser::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // db_dbcomputer
        manager
            .create_table(
                Table::create()
                    .table(DbComputer::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DbComputer::Id)
                            .integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(DbComputer::Uuid).string().not_null())
                    .col(ColumnDef::new(DbComputer::Name).string().not_null())
                    .col(ColumnDef::new(DbComputer::Hostname).string().not_null())
                    .col(
                        ColumnDef::new(DbComputer::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(DbComputer::Enabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(DbComputer::TransportType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DbComputer::SchedulerType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DbComputer::TransportParams)
                            .text()
                            .not_null()
                            .default("{}"),
                    )
                    .col(
                        ColumnDef::new(DbComputer::Metadata)
                            .text()
                            .not_null()
                            .default("{}"),
                    )
                    .to_owned(),
            )
            .await?;

        // Both index names below are renamed by computer_name_to_label.
        manager
            .create_index(
                Index::create()
                    .name("db_dbcomputer_name_key")
                    .table(DbComputer::Table)
                    .col(DbComputer::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => {
                manager
                    .get_connection()
                    .execute_unprepared(
                        "CREATE INDEX db_dbcomputer_name_f1800b1a_like \
                         ON db_dbcomputer (name varchar_pattern_ops)",
                    )
                    .await?;
            }
            sea_orm::DatabaseBackend::Sqlite => {
                // pattern-ops indexes are a PostgreSQL feature
            }
            _ => {
                return Err(DbErr::Custom("Unsupported database backend".into()));
            }
        }

        // db_dbauthinfo
        manager
            .create_table(
                Table::create()
                    .table(DbAuthInfo::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DbAuthInfo::Id)
                            .integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(DbAuthInfo::AiidauserId).integer().not_null())
                    .col(
                        ColumnDef::new(DbAuthInfo::DbcomputerId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DbAuthInfo::AuthParams)
                            .text()
                            .not_null()
                            .default("{}"),
                    )
                    .col(
                        ColumnDef::new(DbAuthInfo::Metadata)
                            .text()
                            .not_null()
                            .default("{}"),
                    )
                    .col(
                        ColumnDef::new(DbAuthInfo::Enabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_db_dbauthinfo_aiidauser_id")
                            .from(DbAuthInfo::Table, DbAuthInfo::AiidauserId)
                            .to(DbUser::Table, DbUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_db_dbauthinfo_dbcomputer_id")
                            .from(DbAuthInfo::Table, DbAuthInfo::DbcomputerId)
                            .to(DbComputer::Table, DbComputer::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("db_dbauthinfo_aiidauser_id_dbcomputer_id_key")
                    .table(DbAuthInfo::Table)
                    .col(DbAuthInfo::AiidauserId)
                    .col(DbAuthInfo::DbcomputerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // db_dblog
        manager
            .create_table(
                Table::create()
                    .table(DbLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DbLog::Id)
                            .integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(
                        ColumnDef::new(DbLog::Time)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DbLog::Loggername).string().not_null())
                    .col(ColumnDef::new(DbLog::Levelname).string_len(50).not_null())
                    .col(ColumnDef::new(DbLog::Objname).string().not_null())
                    .col(ColumnDef::new(DbLog::Objpk).integer().null())
                    .col(
                        ColumnDef::new(DbLog::Message)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(DbLog::Metadata)
                            .text()
                            .not_null()
                            .default("{}"),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_db_dblog_objname_objpk")
                    .table(DbLog::Table)
                    .col(DbLog::Objname)
                    .col(DbLog::Objpk)
                    .to_owned(),
            )
            .await?;

        // db_dbworkflow
        manager
            .create_table(
                Table::create()
                    .table(DbWorkflow::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DbWorkflow::Id)
                            .integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(DbWorkflow::Uuid).string().not_null())
                    .col(
                        ColumnDef::new(DbWorkflow::Ctime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DbWorkflow::Mtime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DbWorkflow::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(DbWorkflow::Label)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(DbWorkflow::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(DbWorkflow::State)
                            .string()
                            .not_null()
                            .default("INITIALIZED"),
                    )
                    .col(ColumnDef::new(DbWorkflow::Module).text().not_null())
                    .col(ColumnDef::new(DbWorkflow::ModuleClass).text().not_null())
                    .col(ColumnDef::new(DbWorkflow::ScriptPath).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_db_dbworkflow_user_id")
                            .from(DbWorkflow::Table, DbWorkflow::UserId)
                            .to(DbUser::Table, DbUser::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // db_dbsetting
        manager
            .create_table(
                Table::create()
                    .table(DbSetting::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DbSetting::Id)
                            .integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(DbSetting::Key).string().not_null())
                    .col(ColumnDef::new(DbSetting::Val).text().not_null())
                    .col(
                        ColumnDef::new(DbSetting::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(DbSetting::Time)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("db_dbsetting_key_key")
                    .table(DbSetting::Table)
                    .col(DbSetting::Key)
                    .unique()
                    .to_owned(),
            )
            .await?;

        set_schema_version(manager.get_connection(), Self::REVISION).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // drop in reverse dependency order; indexes go with their tables
        manager
            .drop_table(Table::drop().table(DbSetting::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DbWorkflow::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DbLog::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DbAuthInfo::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DbComputer::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DbUser::Table).to_owned())
            .await?;

        Ok(())
    }
}

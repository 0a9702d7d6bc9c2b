//! Table and column identifiers shared by the migrations in this crate.

use sea_orm_migration::prelude::*;

#[derive(Iden)]
pub enum DbUser {
    #[iden = "db_dbuser"]
    Table,
    Id,
    Email,
    FirstName,
    LastName,
    Institution,
    IsActive,
    DateJoined,
}

/// Pre-`1.0.48` shape: the label column is still called `name` here.
#[derive(Iden)]
pub enum DbComputer {
    #[iden = "db_dbcomputer"]
    Table,
    Id,
    Uuid,
    Name,
    Hostname,
    Description,
    Enabled,
    TransportType,
    SchedulerType,
    TransportParams,
    Metadata,
}

#[derive(Iden)]
pub enum DbAuthInfo {
    #[iden = "db_dbauthinfo"]
    Table,
    Id,
    AiidauserId,
    DbcomputerId,
    AuthParams,
    Metadata,
    Enabled,
}

#[derive(Iden)]
pub enum DbLog {
    #[iden = "db_dblog"]
    Table,
    Id,
    Time,
    Loggername,
    Levelname,
    Objname,
    Objpk,
    Message,
    Metadata,
}

#[derive(Iden)]
pub enum DbWorkflow {
    #[iden = "db_dbworkflow"]
    Table,
    Id,
    Uuid,
    Ctime,
    Mtime,
    UserId,
    Label,
    Description,
    State,
    Module,
    ModuleClass,
    ScriptPath,
}

#[derive(Iden)]
pub enum DbSetting {
    #[iden = "db_dbsetting"]
    Table,
    Id,
    Key,
    Val,
    Description,
    Time,
}

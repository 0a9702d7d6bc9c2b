pub use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;
pub use sea_orm::{ConnectionTrait, DatabaseConnection};
use thiserror::Error;

mod idens;
mod m20190101_000047_baseline; // keep filename + module name in sync
mod m20190312_000048_computer_name_to_label;
pub mod schema_ops;
pub mod schema_version;

pub use schema_ops::{Direction, MigrationPlan, SchemaOp, SchemaSnapshot, SnapshotError};
pub use schema_version::{get_schema_version, set_schema_version, SCHEMA_VERSION_KEY};

/// Schema revision bookkeeping for a migration in the chain.
pub trait Versioned {
    const REVISION: &'static str;
    /// `None` only for the first node of the chain.
    const DOWN_REVISION: Option<&'static str>;

    fn plan() -> Option<MigrationPlan> {
        None
    }
}

/// Revision recorded by the newest migration this build knows about.
pub const LATEST_SCHEMA_VERSION: &str =
    <m20190312_000048_computer_name_to_label::Migration as Versioned>::REVISION;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20190101_000047_baseline::Migration),
            Box::new(m20190312_000048_computer_name_to_label::Migration),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct ChainLink {
    pub name: String,
    pub revision: &'static str,
    pub down_revision: Option<&'static str>,
    pub plan: Option<MigrationPlan>,
}

fn link<M: MigrationName + Versioned>(migration: &M) -> ChainLink {
    ChainLink {
        name: migration.name().to_string(),
        revision: M::REVISION,
        down_revision: M::DOWN_REVISION,
        plan: M::plan(),
    }
}

/// The revision chain, in the same order as `Migrator::migrations()`.
pub fn schema_chain() -> Vec<ChainLink> {
    vec![
        link(&m20190101_000047_baseline::Migration),
        link(&m20190312_000048_computer_name_to_label::Migration),
    ]
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("migration chain is empty")]
    Empty,
    #[error("first migration {name} must not name a predecessor (found {found})")]
    RootHasPredecessor { name: String, found: String },
    #[error("migration {name} follows {expected:?} but names {found:?} as its predecessor")]
    BrokenLink {
        name: String,
        expected: String,
        found: Option<String>,
    },
}

/// Check that every node names exactly the revision of the node before it.
pub fn validate_chain(links: &[ChainLink]) -> Result<(), ChainError> {
    let first = links.first().ok_or(ChainError::Empty)?;
    if let Some(found) = first.down_revision {
        return Err(ChainError::RootHasPredecessor {
            name: first.name.clone(),
            found: found.to_string(),
        });
    }

    for pair in links.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.down_revision != Some(prev.revision) {
            return Err(ChainError::BrokenLink {
                name: next.name.clone(),
                expected: prev.revision.to_string(),
                found: next.down_revision.map(str::to_string),
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationCommand {
    Up,
    Down,
    Fresh,
    Reset,
    Refresh,
    Status,
}

/// Migration function that bypasses profile parsing
/// Used by both CLI and tests
pub async fn migrate(
    db: &DatabaseConnection,
    command: MigrationCommand,
) -> Result<(), DbErr>
{
    validate_chain(&schema_chain()).map_err(|e| DbErr::Migration(e.to_string()))?;

    let db_info_before = get_db_diagnostics(db).await?;

    tracing::info!("▶ cmd={command:?}  engine={}", db_info_before.engine);
    tracing::info!("▶ connected to DB: {}", db_info_before.name);
    tracing::info!(
        "▶ BEFORE: runner has {} migration(s) defined, {} applied, schema version {}",
        db_info_before.defined_migrations_count,
        db_info_before.mig_count,
        db_info_before.schema_version.as_deref().unwrap_or("<none>")
    );

    let result = match command {
        MigrationCommand::Up => Migrator::up(db, None).await,
        MigrationCommand::Down => Migrator::down(db, Some(1)).await,
        MigrationCommand::Fresh => Migrator::fresh(db).await,
        MigrationCommand::Reset => Migrator::reset(db).await,
        MigrationCommand::Refresh => Migrator::refresh(db).await,
        MigrationCommand::Status => Migrator::status(db).await,
    };

    match result {
        Ok(()) => {
            if !matches!(command, MigrationCommand::Status) {
                let db_info_after = get_db_diagnostics(db).await?;
                tracing::info!(
                    "▶ AFTER: runner has {} migration(s) defined, {} applied, schema version {}",
                    db_info_after.defined_migrations_count,
                    db_info_after.mig_count,
                    db_info_after.schema_version.as_deref().unwrap_or("<none>")
                );
            }
            tracing::info!("✅ {command:?} OK for {}", db_info_before.engine);
            Ok(())
        }
        Err(e) => {
            tracing::error!("❌ {command:?} failed for {}: {e}", db_info_before.engine);
            Err(e)
        }
    }
}

#[derive(Debug)]
struct DbDiagnostics {
    engine: String,
    name: String,
    mig_count: usize,
    defined_migrations_count: usize,
    schema_version: Option<String>,
}

async fn get_db_diagnostics(
    db: &DatabaseConnection,
) -> Result<DbDiagnostics, sea_orm::DbErr> {
    let engine = format!("{:?}", db.get_database_backend());

    let name = match db.get_database_backend() {
        sea_orm::DatabaseBackend::Postgres => {
            let stmt = Statement::from_string(
                db.get_database_backend(),
                String::from("select current_database() as name"),
            );
            if let Some(row) = db.query_one(stmt).await? {
                row.try_get("", "name")?
            } else {
                "<unknown>".to_string()
            }
        }
        sea_orm::DatabaseBackend::Sqlite => {
            let stmt = Statement::from_string(
                db.get_database_backend(),
                String::from("SELECT file FROM pragma_database_list WHERE name = 'main'"),
            );
            match db.query_one(stmt).await? {
                Some(row) => match row.try_get::<String>("", "file") {
                    Ok(file) if file.is_empty() => ":memory:".to_string(),
                    Ok(file) => file,
                    Err(_) => "<unknown>".to_string(),
                },
                None => "<unknown>".to_string(),
            }
        }
        _ => "<unsupported>".to_string(),
    };

    let applied_migrations_count = count_applied_migrations(db).await.unwrap_or(0);
    let defined_migrations_count = Migrator::migrations().len();
    // The settings table is absent before the baseline runs.
    let schema_version = get_schema_version(db).await.unwrap_or(None);

    Ok(DbDiagnostics {
        engine,
        name,
        mig_count: applied_migrations_count,
        defined_migrations_count,
        schema_version,
    })
}

/// Count the number of migrations that have been applied to the database.
/// Returns 0 if the migration table doesn't exist yet.
pub async fn count_applied_migrations(db: &DatabaseConnection) -> Result<usize, DbErr>
{
    match Migrator::get_applied_migrations(db).await {
        Ok(migrations) => Ok(migrations.len()),
        Err(DbErr::Exec(_)) => Ok(0), // Migration table doesn't exist yet
        Err(e) => Err(e),
    }
}

/// Get the name of the latest applied migration.
/// Returns None if no migrations have been applied or the migration table doesn't exist.
pub async fn get_latest_migration_version(db: &DatabaseConnection) -> Result<Option<String>, DbErr>
{
    match Migrator::get_applied_migrations(db).await {
        Ok(migrations) => Ok(migrations.last().map(|m| m.name().to_string())),
        Err(DbErr::Exec(_)) => Ok(None), // Migration table doesn't exist yet
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_link(name: &str, revision: &'static str, down: Option<&'static str>) -> ChainLink {
        ChainLink {
            name: name.to_string(),
            revision,
            down_revision: down,
            plan: None,
        }
    }

    #[test]
    fn chain_is_linear() {
        let chain = schema_chain();
        assert_eq!(validate_chain(&chain), Ok(()));
        for pair in chain.windows(2) {
            assert_eq!(pair[1].down_revision, Some(pair[0].revision));
        }
    }

    #[test]
    fn chain_matches_migrator_order() {
        let names: Vec<String> = Migrator::migrations()
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        let chain_names: Vec<String> = schema_chain().into_iter().map(|l| l.name).collect();
        assert_eq!(names, chain_names);
    }

    #[test]
    fn latest_version_is_last_link() {
        let chain = schema_chain();
        assert_eq!(chain.last().map(|l| l.revision), Some(LATEST_SCHEMA_VERSION));
        assert_eq!(LATEST_SCHEMA_VERSION, "1.0.48");
    }

    #[test]
    fn broken_link_is_reported() {
        let chain = vec![
            bare_link("a", "1.0.1", None),
            bare_link("b", "1.0.2", Some("1.0.1")),
            bare_link("c", "1.0.3", Some("1.0.1")),
        ];
        assert_eq!(
            validate_chain(&chain),
            Err(ChainError::BrokenLink {
                name: "c".into(),
                expected: "1.0.2".into(),
                found: Some("1.0.1".into()),
            })
        );
    }

    #[test]
    fn root_must_not_have_predecessor() {
        let chain = vec![bare_link("a", "1.0.1", Some("1.0.0"))];
        assert!(matches!(
            validate_chain(&chain),
            Err(ChainError::RootHasPredecessor { .. })
        ));
        assert_eq!(validate_chain(&[]), Err(ChainError::Empty));
    }
}

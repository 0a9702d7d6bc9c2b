use std::future::Future;
use std::time::{Duration, Instant};

use migration::{migrate, MigrationCommand, Migrator, MigratorTrait};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::{info, trace, warn};

use crate::config::db::{connect_options, make_conn_url, DbEngine, DbSettings, PoolPurpose};
use crate::error::DbInfraError;

const PG_CONNECT_ATTEMPTS: u32 = 5;
const PG_CONNECT_INTERVAL_MS: u64 = 500;

async fn retry_connection<T, F, Fut>(
    mut connect_fn: F,
    max_attempts: u32,
    interval_ms: u64,
) -> Result<T, DbInfraError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbInfraError>>,
{
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match connect_fn().await {
            Ok(result) => {
                if attempt > 1 {
                    info!(
                        "connection_retry=success attempts={} interval_ms={}",
                        attempt, interval_ms
                    );
                }
                return Ok(result);
            }
            Err(e) => {
                last_error = Some(e);
                if attempt < max_attempts {
                    warn!(
                        "connection_retry=failed attempt={} max_attempts={} interval_ms={}",
                        attempt, max_attempts, interval_ms
                    );
                    tokio::time::sleep(Duration::from_millis(interval_ms)).await;
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| DbInfraError::Connect {
        message: "no error recorded after max attempts".to_string(),
    }))
}

/// Open a pool for `settings`. PostgreSQL connects are retried a few times;
/// SQLite connects once. No migrations are run here.
pub async fn connect(
    settings: &DbSettings,
    purpose: PoolPurpose,
) -> Result<DatabaseConnection, DbInfraError> {
    let opt = connect_options(settings, purpose)?;
    let url = redacted_conn_url(settings)?;
    let started = Instant::now();

    let pool = match settings.engine {
        DbEngine::Postgres => {
            retry_connection(
                || {
                    let opt_clone = opt.clone();
                    let url = url.clone();
                    async move {
                        Database::connect(opt_clone)
                            .await
                            .map_err(|e| DbInfraError::Connect {
                                message: format!("failed to connect to {url}: {e}"),
                            })
                    }
                },
                PG_CONNECT_ATTEMPTS,
                PG_CONNECT_INTERVAL_MS,
            )
            .await?
        }
        DbEngine::Sqlite => {
            let pool = Database::connect(opt)
                .await
                .map_err(|e| DbInfraError::Connect {
                    message: format!("failed to connect to {url}: {e}"),
                })?;
            if !settings.is_memory() {
                setup_sqlite_file_prerequisites(&pool).await?;
            }
            pool
        }
    };

    info!(
        engine = ?settings.engine,
        ?purpose,
        url = %url,
        elapsed_ms = started.elapsed().as_millis(),
        "database connected"
    );
    Ok(pool)
}

/// The connection URL for `settings` with any password masked, for logs and
/// error messages.
pub fn redacted_conn_url(settings: &DbSettings) -> Result<String, DbInfraError> {
    Ok(sanitize_db_url(&make_conn_url(settings)?))
}

/// Sanitize database URL by masking password in connection strings.
pub fn sanitize_db_url(url: &str) -> String {
    let Some((auth_part, host_part)) = url.rsplit_once('@') else {
        return url.to_string();
    };
    // scheme "://" user ":" password
    let Some(scheme_end) = auth_part.find("://") else {
        return url.to_string();
    };
    match auth_part[scheme_end + 3..].find(':') {
        Some(colon_pos) => {
            let scheme_user = &auth_part[..scheme_end + 3 + colon_pos];
            format!("{scheme_user}:***@{host_part}")
        }
        None => url.to_string(),
    }
}

async fn fast_path_schema_check(conn: &DatabaseConnection) -> Result<bool, DbInfraError> {
    let expected_count = Migrator::migrations().len();
    let expected_last = Migrator::migrations()
        .last()
        .map(|m| m.name().to_string())
        .unwrap_or_default();

    let (current_count, current_last) = match Migrator::get_applied_migrations(conn).await {
        Ok(migrations) => {
            let last = migrations.last().map(|m| m.name().to_string());
            (migrations.len(), last)
        }
        Err(DbErr::Exec(_)) => {
            trace!(fastpath = "miss", reason = "migration_table_missing");
            return Ok(false);
        }
        Err(e) => {
            return Err(DbInfraError::Migration {
                message: format!("failed to get applied migrations: {e}"),
            });
        }
    };

    let is_up_to_date = current_count == expected_count
        && (!expected_last.is_empty() && current_last.as_deref() == Some(&expected_last));

    trace!(
        fastpath = if is_up_to_date { "hit" } else { "miss" },
        current_count = current_count,
        expected_count = expected_count,
        current_last = %current_last.as_deref().unwrap_or(""),
        expected_last = %expected_last
    );
    Ok(is_up_to_date)
}

/// Connect with a migration pool and run `command`.
pub async fn orchestrate_migration(
    settings: &DbSettings,
    command: MigrationCommand,
) -> Result<(), DbInfraError> {
    let pool = connect(settings, PoolPurpose::Migration).await?;
    orchestrate_migration_internal(&pool, command).await
}

pub async fn orchestrate_migration_internal(
    pool: &DatabaseConnection,
    command: MigrationCommand,
) -> Result<(), DbInfraError> {
    let start = Instant::now();
    info!(
        "migrate=start engine={:?} command={:?}",
        pool.get_database_backend(),
        command
    );

    if matches!(command, MigrationCommand::Up) && fast_path_schema_check(pool).await? {
        info!("migrate=skipped up_to_date=true");
        return Ok(());
    }

    migrate(pool, command)
        .await
        .map_err(|e| DbInfraError::Migration {
            message: format!("migration execution failed: {e}"),
        })?;

    let expected_count = Migrator::migrations().len();
    let applied_count = Migrator::get_applied_migrations(pool)
        .await
        .map(|m| m.len())
        .unwrap_or(0);
    info!(
        migrate = "counts",
        expected_count = expected_count,
        applied_count = applied_count,
        elapsed_ms = start.elapsed().as_millis()
    );

    match command {
        MigrationCommand::Reset if applied_count != 0 => {
            return Err(DbInfraError::Migration {
                message: format!(
                    "Migration verification failed: reset should leave 0 migrations applied, but {applied_count} were found"
                ),
            });
        }
        MigrationCommand::Up | MigrationCommand::Fresh | MigrationCommand::Refresh
            if applied_count != expected_count =>
        {
            return Err(DbInfraError::Migration {
                message: format!(
                    "Migration verification failed: expected {expected_count} migrations, but {applied_count} were applied"
                ),
            });
        }
        _ => {}
    }

    info!("migrate=done");
    Ok(())
}

async fn setup_sqlite_file_prerequisites(pool: &DatabaseConnection) -> Result<(), DbInfraError> {
    use sea_orm::{DatabaseBackend, Statement};

    for pragma in ["PRAGMA journal_mode = WAL;", "PRAGMA foreign_keys = ON;"] {
        pool.execute(Statement::from_string(DatabaseBackend::Sqlite, pragma))
            .await
            .map_err(|e| DbInfraError::Connect {
                message: format!("failed to apply `{pragma}`: {e}"),
            })?;
    }
    Ok(())
}

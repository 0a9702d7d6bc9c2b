//! Database engine selection and connection URL construction.

use std::str::FromStr;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use sea_orm::{ConnectOptions, DatabaseBackend};

use crate::error::DbInfraError;

/// Database name that selects an in-memory SQLite database.
pub const SQLITE_MEMORY: &str = ":memory:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbEngine {
    Postgres,
    Sqlite,
}

impl FromStr for DbEngine {
    type Err = DbInfraError;

    /// Accepts the engine names written by profile setup, including the
    /// driver-qualified `postgresql_psycopg2`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgresql_psycopg2" | "postgresql" | "postgres" => Ok(DbEngine::Postgres),
            "sqlite" | "sqlite3" => Ok(DbEngine::Sqlite),
            other => Err(DbInfraError::config(format!(
                "Unsupported database engine '{other}'"
            ))),
        }
    }
}

impl From<DbEngine> for DatabaseBackend {
    fn from(engine: DbEngine) -> Self {
        match engine {
            DbEngine::Postgres => DatabaseBackend::Postgres,
            DbEngine::Sqlite => DatabaseBackend::Sqlite,
        }
    }
}

/// What a pool is used for; migrations get a single connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolPurpose {
    Runtime,
    Migration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSettings {
    pub engine: DbEngine,
    pub host: String,
    pub port: String,
    pub name: String,
    pub user: String,
    pub password: String,
}

impl DbSettings {
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            engine: DbEngine::Sqlite,
            host: String::new(),
            port: String::new(),
            name: path.into(),
            user: String::new(),
            password: String::new(),
        }
    }

    pub fn is_memory(&self) -> bool {
        self.engine == DbEngine::Sqlite && self.name == SQLITE_MEMORY
    }
}

fn host_or_default(host: &str) -> &str {
    if host.is_empty() {
        "localhost"
    } else {
        host
    }
}

fn port_or_default(port: &str) -> &str {
    if port.is_empty() {
        "5432"
    } else {
        port
    }
}

fn required<'a>(value: &'a str, what: &str) -> Result<&'a str, DbInfraError> {
    if value.trim().is_empty() {
        return Err(DbInfraError::config(format!(
            "Database {what} is required but empty"
        )));
    }
    Ok(value)
}

/// Build the connection URL for `settings`.
pub fn make_conn_url(settings: &DbSettings) -> Result<String, DbInfraError> {
    match settings.engine {
        DbEngine::Postgres => {
            let name = required(&settings.name, "name")?;
            let user = required(&settings.user, "user")?;
            let port = port_or_default(&settings.port);
            port.parse::<u16>().map_err(|_| {
                DbInfraError::config(format!("Invalid database port '{port}'"))
            })?;

            let user = utf8_percent_encode(user, NON_ALPHANUMERIC);
            let auth = if settings.password.is_empty() {
                user.to_string()
            } else {
                let password = utf8_percent_encode(&settings.password, NON_ALPHANUMERIC);
                format!("{user}:{password}")
            };
            Ok(format!(
                "postgresql://{auth}@{}:{port}/{name}",
                host_or_default(&settings.host)
            ))
        }
        DbEngine::Sqlite => {
            let name = required(&settings.name, "name")?;
            if name == SQLITE_MEMORY {
                Ok("sqlite::memory:".to_string())
            } else {
                Ok(format!("sqlite://{name}?mode=rwc"))
            }
        }
    }
}

/// Pool options for `settings`, sized by purpose.
pub fn connect_options(
    settings: &DbSettings,
    purpose: PoolPurpose,
) -> Result<ConnectOptions, DbInfraError> {
    let url = make_conn_url(settings)?;
    let mut opt = ConnectOptions::new(url);

    // every connection to sqlite::memory: opens a separate database
    let max = match (purpose, settings.is_memory()) {
        (_, true) | (PoolPurpose::Migration, _) => 1,
        (PoolPurpose::Runtime, false) => 5,
    };
    opt.min_connections(1)
        .max_connections(max)
        .acquire_timeout(Duration::from_secs(2))
        .sqlx_logging(false);
    Ok(opt)
}

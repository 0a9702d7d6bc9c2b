//! Computer rename migration against a real PostgreSQL database.
//!
//! Runs only when `AIIDA_TEST_PG_NAME` names a scratch database; every table
//! in it is dropped. Connection details come from `AIIDA_TEST_PG_HOST`,
//! `AIIDA_TEST_PG_PORT`, `AIIDA_TEST_PG_USER` and `AIIDA_TEST_PG_PASS`.

use std::env;

use db_infra::db::{DbEngine, DbSettings, PoolPurpose};
use db_infra::{connect, orchestrate_migration};
use migration::{get_schema_version, MigrationCommand, LATEST_SCHEMA_VERSION};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};

fn skip_unless_postgres(test_name: &str) -> Option<DbSettings> {
    let Ok(name) = env::var("AIIDA_TEST_PG_NAME") else {
        println!("Skipping {test_name}: AIIDA_TEST_PG_NAME is not set");
        return None;
    };
    Some(DbSettings {
        engine: DbEngine::Postgres,
        host: env::var("AIIDA_TEST_PG_HOST").unwrap_or_default(),
        port: env::var("AIIDA_TEST_PG_PORT").unwrap_or_default(),
        name,
        user: env::var("AIIDA_TEST_PG_USER").unwrap_or_else(|_| "postgres".into()),
        password: env::var("AIIDA_TEST_PG_PASS").unwrap_or_default(),
    })
}

async fn text_column(conn: &DatabaseConnection, sql: &str) -> Vec<String> {
    conn.query_all(Statement::from_string(conn.get_database_backend(), sql))
        .await
        .unwrap()
        .iter()
        .map(|row| row.try_get::<String>("", "v").unwrap())
        .collect()
}

async fn computer_indexes(conn: &DatabaseConnection) -> Vec<String> {
    text_column(
        conn,
        "SELECT indexname::text AS v FROM pg_indexes WHERE tablename = 'db_dbcomputer'",
    )
    .await
}

async fn computer_columns(conn: &DatabaseConnection) -> Vec<String> {
    text_column(
        conn,
        "SELECT column_name::text AS v FROM information_schema.columns \
         WHERE table_name = 'db_dbcomputer'",
    )
    .await
}

fn has(list: &[String], item: &str) -> bool {
    list.iter().any(|i| i == item)
}

#[tokio::test]
async fn test_rename_round_trip_on_postgres() {
    let Some(settings) = skip_unless_postgres("test_rename_round_trip_on_postgres") else {
        return;
    };

    orchestrate_migration(&settings, MigrationCommand::Fresh)
        .await
        .unwrap();
    let conn = connect(&settings, PoolPurpose::Runtime).await.unwrap();

    let indexes = computer_indexes(&conn).await;
    assert!(has(&indexes, "db_dbcomputer_label_bc480bab_uniq"), "{indexes:?}");
    assert!(has(&indexes, "db_dbcomputer_label_bc480bab_like"), "{indexes:?}");
    assert!(!has(&indexes, "db_dbcomputer_name_key"), "{indexes:?}");
    assert!(has(&computer_columns(&conn).await, "label"));
    assert_eq!(
        get_schema_version(&conn).await.unwrap().as_deref(),
        Some(LATEST_SCHEMA_VERSION)
    );

    orchestrate_migration(&settings, MigrationCommand::Down)
        .await
        .unwrap();

    let indexes = computer_indexes(&conn).await;
    assert!(has(&indexes, "db_dbcomputer_name_key"), "{indexes:?}");
    assert!(has(&indexes, "db_dbcomputer_name_f1800b1a_like"), "{indexes:?}");
    assert!(!has(&indexes, "db_dbcomputer_label_bc480bab_uniq"), "{indexes:?}");
    let columns = computer_columns(&conn).await;
    assert!(has(&columns, "name") && !has(&columns, "label"), "{columns:?}");
    assert_eq!(
        get_schema_version(&conn).await.unwrap().as_deref(),
        Some("1.0.47")
    );

    orchestrate_migration(&settings, MigrationCommand::Up)
        .await
        .unwrap();

    let indexes = computer_indexes(&conn).await;
    assert!(has(&indexes, "db_dbcomputer_label_bc480bab_uniq"), "{indexes:?}");
    assert!(has(&indexes, "db_dbcomputer_label_bc480bab_like"), "{indexes:?}");
}

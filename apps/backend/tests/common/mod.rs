#![allow(dead_code)]

// tests/common/mod.rs
use aiida_backends::entities::{db_authinfo, db_computer, db_log, db_user, db_workflow};
use aiida_backends::{BackendKind, Computer, Config, DbEnv, User, WorkflowState};
use backend_test_support::fresh_sqlite_db;
use backend_test_support::unique_helpers::{unique_email, unique_str, unique_uuid};
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, NotSet, Set};
use time::OffsetDateTime;

#[ctor::ctor]
fn init_logging() {
    backend_test_support::logging::init();
}

pub const PROFILE: &str = "test";

/// Single-profile configuration for an in-memory SQLite database.
pub fn config_for(backend: &str, default_user_email: Option<&str>) -> Config {
    let email = default_user_email
        .map(|e| format!(r#", "default_user_email": "{e}""#))
        .unwrap_or_default();
    Config::from_json(&format!(
        r#"{{
            "default_profiles": {{"verdi": "{PROFILE}", "daemon": "{PROFILE}"}},
            "profiles": {{
                "{PROFILE}": {{
                    "AIIDADB_BACKEND": "{backend}",
                    "AIIDADB_ENGINE": "sqlite",
                    "AIIDADB_NAME": ":memory:"{email}
                }}
            }}
        }}"#
    ))
    .unwrap()
}

/// A loaded environment on a fresh database whose default user exists.
pub struct TestEnv {
    pub env: DbEnv,
    pub conn: DatabaseConnection,
    pub default_user: User,
}

pub async fn loaded_env(kind: BackendKind) -> TestEnv {
    let conn = fresh_sqlite_db().await.unwrap();
    let default_user = seed_user(&conn, &unique_email("default")).await;

    let mut env = DbEnv::new(config_for(kind.as_str(), Some(&default_user.email)));
    env.load_with_connection(None, None, conn.clone())
        .await
        .unwrap();

    TestEnv {
        env,
        conn,
        default_user,
    }
}

pub async fn seed_user<C: ConnectionTrait>(conn: &C, email: &str) -> User {
    let model = db_user::ActiveModel {
        id: NotSet,
        email: Set(email.to_string()),
        first_name: Set("Ada".into()),
        last_name: Set("Lovelace".into()),
        institution: Set("EPFL".into()),
        is_active: Set(true),
        date_joined: Set(OffsetDateTime::now_utc()),
    }
    .insert(conn)
    .await
    .unwrap();
    User::from(model)
}

pub async fn seed_computer<C: ConnectionTrait>(conn: &C, label: &str) -> Computer {
    let model = db_computer::ActiveModel {
        id: NotSet,
        uuid: Set(unique_uuid()),
        label: Set(label.to_string()),
        hostname: Set(format!("{label}.example.test")),
        description: Set(String::new()),
        enabled: Set(true),
        transport_type: Set("ssh".into()),
        scheduler_type: Set("slurm".into()),
        transport_params: Set("{}".into()),
        metadata: Set(r#"{"workdir": "/scratch"}"#.into()),
    }
    .insert(conn)
    .await
    .unwrap();
    Computer::try_from(model).unwrap()
}

pub async fn seed_fresh_computer<C: ConnectionTrait>(conn: &C) -> Computer {
    seed_computer(conn, &unique_str("computer")).await
}

pub async fn seed_authinfo<C: ConnectionTrait>(
    conn: &C,
    user: &User,
    computer: &Computer,
    auth_params: &str,
) -> db_authinfo::Model {
    db_authinfo::ActiveModel {
        id: NotSet,
        aiidauser_id: Set(user.id),
        dbcomputer_id: Set(computer.id),
        auth_params: Set(auth_params.to_string()),
        metadata: Set("{}".into()),
        enabled: Set(true),
    }
    .insert(conn)
    .await
    .unwrap()
}

/// Lets a test create the duplicate authinfo rows older databases may hold.
pub async fn drop_authinfo_unique_index<C: ConnectionTrait>(conn: &C) {
    conn.execute_unprepared("DROP INDEX db_dbauthinfo_aiidauser_id_dbcomputer_id_key")
        .await
        .unwrap();
}

pub async fn seed_log<C: ConnectionTrait>(
    conn: &C,
    objname: &str,
    objpk: i32,
    time: OffsetDateTime,
    message: &str,
) -> db_log::Model {
    db_log::ActiveModel {
        id: NotSet,
        time: Set(time),
        loggername: Set("aiida.execmanager".into()),
        levelname: Set("WARNING".into()),
        objname: Set(objname.to_string()),
        objpk: Set(Some(objpk)),
        message: Set(message.to_string()),
        metadata: Set("{}".into()),
    }
    .insert(conn)
    .await
    .unwrap()
}

pub async fn seed_workflow<C: ConnectionTrait>(
    conn: &C,
    user: &User,
    state: WorkflowState,
    ctime: OffsetDateTime,
) -> db_workflow::Model {
    db_workflow::ActiveModel {
        id: NotSet,
        uuid: Set(unique_uuid()),
        ctime: Set(ctime),
        mtime: Set(ctime),
        user_id: Set(user.id),
        label: Set(unique_str("wf")),
        description: Set(String::new()),
        state: Set(state),
        module: Set("aiida.workflows.user".into()),
        module_class: Set("TestWorkflow".into()),
        script_path: Set(String::new()),
    }
    .insert(conn)
    .await
    .unwrap()
}

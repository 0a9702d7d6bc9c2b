//! The database environment handle.
//!
//! A [`DbEnv`] starts unloaded. [`DbEnv::load`] resolves a profile, picks
//! the backend that profile names, connects and runs the backend's own
//! loader. Every data-access call afterwards is routed to that backend.
//!
//! Loading is accepted once per handle. The handle counts as loaded as soon
//! as a load is attempted, so a failed load cannot be retried on the same
//! handle either.

use db_infra::db::PoolPurpose;
use sea_orm::{ConnectionTrait, DatabaseConnection};
use tracing::{debug, info};

use crate::backends::{self, BackendContext, BackendKind, StorageBackend};
use crate::config::{Config, Profile};
use crate::error::BackendError;
use crate::repos::authinfos::AuthInfo;
use crate::repos::computers::{find_computer_by_label, Computer};
use crate::repos::logs::{LogMessage, LogTarget};
use crate::repos::users::{find_user_by_email, User};
use crate::repos::workflows::{Workflow, WorkflowListFilter};

#[derive(Debug)]
enum Phase {
    Unloaded,
    Failed,
    Loaded(LoadedEnv),
}

#[derive(Debug)]
pub struct DbEnv {
    config: Config,
    phase: Phase,
}

impl DbEnv {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            phase: Phase::Unloaded,
        }
    }

    /// Build a handle from the configuration file in the config directory.
    pub fn from_env() -> Result<Self, BackendError> {
        Ok(Self::new(Config::from_env()?))
    }

    /// Whether a load has been attempted on this handle.
    pub fn is_loaded(&self) -> bool {
        !matches!(self.phase, Phase::Unloaded)
    }

    /// Resolve the profile, connect to its database and load its backend.
    pub async fn load(
        &mut self,
        process: Option<&str>,
        profile: Option<&str>,
    ) -> Result<&LoadedEnv, BackendError> {
        self.load_inner(process, profile, None).await
    }

    /// Like [`DbEnv::load`] but adopts an already open connection instead of
    /// connecting with the profile's settings.
    pub async fn load_with_connection(
        &mut self,
        process: Option<&str>,
        profile: Option<&str>,
        conn: DatabaseConnection,
    ) -> Result<&LoadedEnv, BackendError> {
        self.load_inner(process, profile, Some(conn)).await
    }

    async fn load_inner(
        &mut self,
        process: Option<&str>,
        profile: Option<&str>,
        conn: Option<DatabaseConnection>,
    ) -> Result<&LoadedEnv, BackendError> {
        if self.is_loaded() {
            return Err(BackendError::invalid_operation(
                "You cannot load the database environment multiple times",
            ));
        }
        self.phase = Phase::Failed;

        let loaded = LoadedEnv::open(&self.config, process, profile, conn).await?;
        self.phase = Phase::Loaded(loaded);
        self.loaded()
    }

    pub fn loaded(&self) -> Result<&LoadedEnv, BackendError> {
        match &self.phase {
            Phase::Loaded(env) => Ok(env),
            Phase::Unloaded => Err(BackendError::invalid_operation(
                "The database environment has not been loaded",
            )),
            Phase::Failed => Err(BackendError::invalid_operation(
                "Loading the database environment failed earlier",
            )),
        }
    }

    pub fn backend_kind(&self) -> Option<BackendKind> {
        self.loaded().ok().map(LoadedEnv::backend_kind)
    }

    pub async fn automatic_user(&self) -> Result<User, BackendError> {
        self.loaded()?.automatic_user().await
    }

    pub async fn workflow_list(
        &self,
        filter: &WorkflowListFilter,
    ) -> Result<Vec<Workflow>, BackendError> {
        self.loaded()?.workflow_list(filter).await
    }

    pub async fn log_messages(&self, target: &LogTarget) -> Result<Vec<LogMessage>, BackendError> {
        self.loaded()?.log_messages(target).await
    }

    pub async fn authinfo(&self, computer: &Computer, user: &User) -> Result<AuthInfo, BackendError> {
        self.loaded()?.authinfo(computer, user).await
    }

    pub async fn daemon_user(&self) -> Result<String, BackendError> {
        self.loaded()?.daemon_user().await
    }
}

/// A loaded environment: the selected profile and its live backend.
#[derive(Debug)]
pub struct LoadedEnv {
    profile: Profile,
    backend_kind: BackendKind,
    conn: DatabaseConnection,
    backend: Box<dyn StorageBackend>,
}

impl LoadedEnv {
    async fn open(
        config: &Config,
        process: Option<&str>,
        profile: Option<&str>,
        conn: Option<DatabaseConnection>,
    ) -> Result<Self, BackendError> {
        let profile = config.resolve(process, profile)?;
        let backend_kind = profile.backend_kind()?;

        let conn = match conn {
            Some(conn) => conn,
            None => db_infra::connect(&profile.db_settings()?, PoolPurpose::Runtime).await?,
        };

        info!(
            profile = %profile.name,
            backend = %backend_kind,
            engine = ?conn.get_database_backend(),
            "loading database environment"
        );

        let backend = backends::instantiate(
            backend_kind,
            BackendContext {
                conn: conn.clone(),
                profile: profile.clone(),
            },
        )?;
        backend.load_environment().await?;

        Ok(Self {
            profile,
            backend_kind,
            conn,
            backend,
        })
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend_kind
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    pub async fn automatic_user(&self) -> Result<User, BackendError> {
        debug!(op = "automatic_user", backend = %self.backend_kind);
        self.backend.automatic_user().await
    }

    pub async fn workflow_list(
        &self,
        filter: &WorkflowListFilter,
    ) -> Result<Vec<Workflow>, BackendError> {
        debug!(op = "workflow_list", backend = %self.backend_kind);
        self.backend.workflow_list(filter).await
    }

    pub async fn log_messages(&self, target: &LogTarget) -> Result<Vec<LogMessage>, BackendError> {
        debug!(op = "log_messages", backend = %self.backend_kind, objname = %target.objname, objpk = target.objpk);
        self.backend.log_messages(target).await
    }

    pub async fn authinfo(&self, computer: &Computer, user: &User) -> Result<AuthInfo, BackendError> {
        debug!(op = "authinfo", backend = %self.backend_kind, computer = %computer.label);
        self.backend.authinfo(computer, user).await
    }

    pub async fn daemon_user(&self) -> Result<String, BackendError> {
        debug!(op = "daemon_user", backend = %self.backend_kind);
        self.backend.daemon_user().await
    }

    pub async fn find_user(&self, email: &str) -> Result<User, BackendError> {
        find_user_by_email(&self.conn, email)
            .await?
            .ok_or_else(|| BackendError::not_found(format!("No aiida user with email {email}")))
    }

    pub async fn find_computer(&self, label: &str) -> Result<Computer, BackendError> {
        find_computer_by_label(&self.conn, label)
            .await?
            .ok_or_else(|| BackendError::not_found(format!("No computer with label {label}")))
    }
}

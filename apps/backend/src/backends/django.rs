//! The `django` backend: entity-API queries and a strict schema check.

use async_trait::async_trait;
use migration::{get_schema_version, LATEST_SCHEMA_VERSION};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use tracing::debug;

use crate::backends::{BackendContext, BackendKind, StorageBackend};
use crate::entities::{db_authinfo, db_log, db_workflow};
use crate::error::BackendError;
use crate::repos::authinfos::{exactly_one, AuthInfo};
use crate::repos::computers::Computer;
use crate::repos::logs::{LogMessage, LogTarget};
use crate::repos::settings::{get_setting, DAEMON_USER_KEY};
use crate::repos::users::{find_user_by_email, User};
use crate::repos::workflows::{Workflow, WorkflowListFilter, TERMINAL_STATES};

#[derive(Debug)]
pub struct DjangoBackend {
    ctx: BackendContext,
}

impl DjangoBackend {
    pub fn new(ctx: BackendContext) -> Self {
        Self { ctx }
    }

    /// Refuse to run against a database whose schema is not the one this
    /// build was written for.
    async fn check_schema_version(&self) -> Result<(), BackendError> {
        let found = get_schema_version(&self.ctx.conn).await.map_err(|e| {
            BackendError::config(format!(
                "Unable to read the database schema version ({e}); has the database been migrated?"
            ))
        })?;

        match found.as_deref() {
            Some(version) if version == LATEST_SCHEMA_VERSION => Ok(()),
            other => Err(BackendError::config(format!(
                "Database schema version {} does not match the code schema version {LATEST_SCHEMA_VERSION}; \
                 migrate the database of profile '{}'",
                other.unwrap_or("<none>"),
                self.ctx.profile.name
            ))),
        }
    }
}

#[async_trait]
impl StorageBackend for DjangoBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Django
    }

    async fn load_environment(&self) -> Result<(), BackendError> {
        self.check_schema_version().await
    }

    async fn automatic_user(&self) -> Result<User, BackendError> {
        let email = self.ctx.default_user_email()?;
        find_user_by_email(&self.ctx.conn, email)
            .await?
            .ok_or_else(|| BackendError::config(format!("No aiida user with email {email}")))
    }

    async fn workflow_list(
        &self,
        filter: &WorkflowListFilter,
    ) -> Result<Vec<Workflow>, BackendError> {
        let mut query = db_workflow::Entity::find();

        if !filter.pks.is_empty() {
            query = query.filter(db_workflow::Column::Id.is_in(filter.pks.clone()));
        } else {
            if let Some(user_id) = filter.user_id {
                query = query.filter(db_workflow::Column::UserId.eq(user_id));
            }
            if !filter.all_states {
                query = query.filter(db_workflow::Column::State.is_not_in(TERMINAL_STATES));
            }
            if let Some(since) = filter.created_since(time::OffsetDateTime::now_utc()) {
                query = query.filter(db_workflow::Column::Ctime.gte(since));
            }
        }

        let rows = query
            .order_by_asc(db_workflow::Column::Ctime)
            .order_by_asc(db_workflow::Column::Id)
            .all(&self.ctx.conn)
            .await?;
        debug!(count = rows.len(), "workflow_list");
        Ok(rows.into_iter().map(Workflow::from).collect())
    }

    async fn log_messages(&self, target: &LogTarget) -> Result<Vec<LogMessage>, BackendError> {
        db_log::Entity::find()
            .filter(db_log::Column::Objname.eq(target.objname.as_str()))
            .filter(db_log::Column::Objpk.eq(target.objpk))
            .order_by_asc(db_log::Column::Time)
            .order_by_asc(db_log::Column::Id)
            .all(&self.ctx.conn)
            .await?
            .into_iter()
            .map(LogMessage::try_from)
            .collect()
    }

    async fn authinfo(&self, computer: &Computer, user: &User) -> Result<AuthInfo, BackendError> {
        // two rows are enough to tell "unique" from "duplicated"
        let matches = db_authinfo::Entity::find()
            .filter(db_authinfo::Column::DbcomputerId.eq(computer.id))
            .filter(db_authinfo::Column::AiidauserId.eq(user.id))
            .limit(2)
            .all(&self.ctx.conn)
            .await?;
        AuthInfo::try_from(exactly_one(matches, computer, user)?)
    }

    async fn daemon_user(&self) -> Result<String, BackendError> {
        match get_setting(&self.ctx.conn, DAEMON_USER_KEY).await? {
            Some(email) => Ok(email),
            None => Ok(self.ctx.default_user_email()?.to_string()),
        }
    }
}

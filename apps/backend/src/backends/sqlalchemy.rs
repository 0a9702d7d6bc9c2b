//! The `sqlalchemy` backend: session-style queries.
//!
//! Statements are assembled with `sea-query`, executed through the raw
//! connection and mapped onto the entity models. Legacy workflows are not
//! available here.

use async_trait::async_trait;
use migration::{get_schema_version, LATEST_SCHEMA_VERSION};
use sea_orm::sea_query::{Expr, Order, Query, SelectStatement};
use sea_orm::{ConnectionTrait, EntityTrait, FromQueryResult, Iterable, Statement};
use tracing::{info, warn};

use crate::backends::{BackendContext, BackendKind, StorageBackend};
use crate::entities::{db_authinfo, db_log, db_setting, db_user};
use crate::error::BackendError;
use crate::repos::authinfos::{exactly_one, AuthInfo};
use crate::repos::computers::Computer;
use crate::repos::logs::{LogMessage, LogTarget};
use crate::repos::settings::DAEMON_USER_KEY;
use crate::repos::users::User;

#[derive(Debug)]
pub struct SqlAlchemyBackend {
    ctx: BackendContext,
}

/// `SELECT <all columns> FROM <entity>`
fn select_all<E: EntityTrait>(entity: E) -> SelectStatement {
    Query::select()
        .columns(E::Column::iter())
        .from(entity)
        .to_owned()
}

impl SqlAlchemyBackend {
    pub fn new(ctx: BackendContext) -> Self {
        Self { ctx }
    }

    fn build(&self, stmt: &SelectStatement) -> Statement {
        self.ctx.conn.get_database_backend().build(stmt)
    }
}

#[async_trait]
impl StorageBackend for SqlAlchemyBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::SqlAlchemy
    }

    async fn load_environment(&self) -> Result<(), BackendError> {
        // The version is reported, not enforced.
        match get_schema_version(&self.ctx.conn).await {
            Ok(Some(version)) if version == LATEST_SCHEMA_VERSION => {
                info!(schema_version = %version, "schema version");
            }
            Ok(found) => {
                warn!(
                    found = found.as_deref().unwrap_or("<none>"),
                    expected = LATEST_SCHEMA_VERSION,
                    "database schema version differs from code schema version"
                );
            }
            Err(e) => warn!(error = %e, "unable to read database schema version"),
        }
        Ok(())
    }

    async fn automatic_user(&self) -> Result<User, BackendError> {
        let email = self.ctx.default_user_email()?;
        let stmt = select_all(db_user::Entity)
            .and_where(Expr::col(db_user::Column::Email).eq(email))
            .limit(1)
            .to_owned();

        db_user::Model::find_by_statement(self.build(&stmt))
            .one(&self.ctx.conn)
            .await?
            .map(User::from)
            .ok_or_else(|| BackendError::config(format!("No aiida user with email {email}")))
    }

    async fn log_messages(&self, target: &LogTarget) -> Result<Vec<LogMessage>, BackendError> {
        let stmt = select_all(db_log::Entity)
            .and_where(Expr::col(db_log::Column::Objname).eq(target.objname.as_str()))
            .and_where(Expr::col(db_log::Column::Objpk).eq(target.objpk))
            .order_by(db_log::Column::Time, Order::Asc)
            .order_by(db_log::Column::Id, Order::Asc)
            .to_owned();

        db_log::Model::find_by_statement(self.build(&stmt))
            .all(&self.ctx.conn)
            .await?
            .into_iter()
            .map(LogMessage::try_from)
            .collect()
    }

    async fn authinfo(&self, computer: &Computer, user: &User) -> Result<AuthInfo, BackendError> {
        let stmt = select_all(db_authinfo::Entity)
            .and_where(Expr::col(db_authinfo::Column::DbcomputerId).eq(computer.id))
            .and_where(Expr::col(db_authinfo::Column::AiidauserId).eq(user.id))
            .limit(2)
            .to_owned();

        let matches = db_authinfo::Model::find_by_statement(self.build(&stmt))
            .all(&self.ctx.conn)
            .await?;
        AuthInfo::try_from(exactly_one(matches, computer, user)?)
    }

    async fn daemon_user(&self) -> Result<String, BackendError> {
        let stmt = Query::select()
            .column(db_setting::Column::Val)
            .from(db_setting::Entity)
            .and_where(Expr::col(db_setting::Column::Key).eq(DAEMON_USER_KEY))
            .to_owned();

        match self.ctx.conn.query_one(self.build(&stmt)).await? {
            Some(row) => Ok(row.try_get::<String>("", "val")?),
            None => Ok(self.ctx.default_user_email()?.to_string()),
        }
    }
}

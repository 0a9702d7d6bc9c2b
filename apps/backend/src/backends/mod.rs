//! Storage backends and the capability set every backend exposes.
//!
//! Each backend is compiled behind its own cargo feature and only the one a
//! profile selects is ever constructed. Operations a backend cannot perform
//! keep the trait's default body, which reports them as unsupported.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;

use crate::config::Profile;
use crate::error::BackendError;
use crate::repos::authinfos::AuthInfo;
use crate::repos::computers::Computer;
use crate::repos::logs::{LogMessage, LogTarget};
use crate::repos::users::User;
use crate::repos::workflows::{Workflow, WorkflowListFilter};

#[cfg(feature = "django")]
pub mod django;
#[cfg(feature = "sqlalchemy")]
pub mod sqlalchemy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Django,
    SqlAlchemy,
}

impl BackendKind {
    pub const ALL: [BackendKind; 2] = [BackendKind::Django, BackendKind::SqlAlchemy];

    /// The identifier used in profile configuration.
    pub const fn as_str(self) -> &'static str {
        match self {
            BackendKind::Django => "django",
            BackendKind::SqlAlchemy => "sqlalchemy",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BackendKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| BackendError::config(format!("Invalid AIIDADB_BACKEND: {s}")))
    }
}

/// What a backend is built from: an open connection and the profile that
/// selected it.
#[derive(Debug, Clone)]
pub struct BackendContext {
    pub conn: DatabaseConnection,
    pub profile: Profile,
}

impl BackendContext {
    /// The profile's default user email, required by the user lookups.
    pub fn default_user_email(&self) -> Result<&str, BackendError> {
        self.profile.default_user_email().ok_or_else(|| {
            BackendError::config(format!(
                "Profile '{}' does not define a default user email",
                self.profile.name
            ))
        })
    }
}

#[async_trait]
pub trait StorageBackend: Send + Sync + fmt::Debug {
    fn kind(&self) -> BackendKind;

    /// Backend-specific checks run once when the environment is loaded.
    async fn load_environment(&self) -> Result<(), BackendError>;

    /// The user configured as the profile's default user.
    async fn automatic_user(&self) -> Result<User, BackendError>;

    async fn workflow_list(
        &self,
        _filter: &WorkflowListFilter,
    ) -> Result<Vec<Workflow>, BackendError> {
        Err(BackendError::unsupported("workflow_list", self.kind()))
    }

    /// Log entries of one object, oldest first.
    async fn log_messages(&self, target: &LogTarget) -> Result<Vec<LogMessage>, BackendError>;

    /// The single authentication record linking `user` to `computer`.
    async fn authinfo(&self, computer: &Computer, user: &User) -> Result<AuthInfo, BackendError>;

    /// Email of the user the daemon runs as.
    async fn daemon_user(&self) -> Result<String, BackendError>;
}

#[cfg(feature = "django")]
fn django_backend(ctx: BackendContext) -> Result<Box<dyn StorageBackend>, BackendError> {
    Ok(Box::new(django::DjangoBackend::new(ctx)))
}

#[cfg(not(feature = "django"))]
fn django_backend(_ctx: BackendContext) -> Result<Box<dyn StorageBackend>, BackendError> {
    Err(BackendError::config(
        "The django backend is not available in this build",
    ))
}

#[cfg(feature = "sqlalchemy")]
fn sqlalchemy_backend(ctx: BackendContext) -> Result<Box<dyn StorageBackend>, BackendError> {
    Ok(Box::new(sqlalchemy::SqlAlchemyBackend::new(ctx)))
}

#[cfg(not(feature = "sqlalchemy"))]
fn sqlalchemy_backend(_ctx: BackendContext) -> Result<Box<dyn StorageBackend>, BackendError> {
    Err(BackendError::config(
        "The sqlalchemy backend is not available in this build",
    ))
}

/// Construct the backend for `kind`.
pub fn instantiate(
    kind: BackendKind,
    ctx: BackendContext,
) -> Result<Box<dyn StorageBackend>, BackendError> {
    match kind {
        BackendKind::Django => django_backend(ctx),
        BackendKind::SqlAlchemy => sqlalchemy_backend(ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_known_backends() {
        assert_eq!("django".parse::<BackendKind>().unwrap(), BackendKind::Django);
        assert_eq!(
            "sqlalchemy".parse::<BackendKind>().unwrap(),
            BackendKind::SqlAlchemy
        );
    }

    #[test]
    fn test_parse_is_exact() {
        for raw in ["Django", "sqla", "", "mongodb", " django"] {
            let err = raw.parse::<BackendKind>().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Configuration, "input {raw:?}");
        }
    }

    #[test]
    fn test_display_round_trips() {
        for kind in BackendKind::ALL {
            assert_eq!(kind.to_string().parse::<BackendKind>().unwrap(), kind);
        }
    }
}

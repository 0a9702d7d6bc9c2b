//! Error type shared by the dispatcher and both storage backends.
//!
//! Callers branch on [`ErrorKind`] (via [`BackendError::kind`]); the message
//! text is for humans only.

use db_infra::DbInfraError;
use thiserror::Error;

use crate::backends::BackendKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidOperation,
    Configuration,
    Authentication,
    Unsupported,
    NotFound,
    Database,
}

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Invalid operation: {detail}")]
    InvalidOperation { detail: String },
    #[error("Configuration error: {detail}")]
    Config { detail: String },
    #[error("Authentication error: {detail}")]
    Authentication { detail: String },
    #[error("Operation '{operation}' is not available for the {backend} backend")]
    Unsupported {
        operation: &'static str,
        backend: BackendKind,
    },
    #[error("Not found: {detail}")]
    NotFound { detail: String },
    #[error("Database error: {detail}")]
    Db { detail: String },
}

impl BackendError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BackendError::InvalidOperation { .. } => ErrorKind::InvalidOperation,
            BackendError::Config { .. } => ErrorKind::Configuration,
            BackendError::Authentication { .. } => ErrorKind::Authentication,
            BackendError::Unsupported { .. } => ErrorKind::Unsupported,
            BackendError::NotFound { .. } => ErrorKind::NotFound,
            BackendError::Db { .. } => ErrorKind::Database,
        }
    }

    pub fn invalid_operation(detail: impl Into<String>) -> Self {
        Self::InvalidOperation {
            detail: detail.into(),
        }
    }

    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }

    pub fn authentication(detail: impl Into<String>) -> Self {
        Self::Authentication {
            detail: detail.into(),
        }
    }

    pub fn unsupported(operation: &'static str, backend: BackendKind) -> Self {
        Self::Unsupported { operation, backend }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::NotFound {
            detail: detail.into(),
        }
    }

    pub fn db(detail: impl Into<String>) -> Self {
        Self::Db {
            detail: detail.into(),
        }
    }
}

impl From<sea_orm::DbErr> for BackendError {
    fn from(e: sea_orm::DbErr) -> Self {
        BackendError::Db {
            detail: e.to_string(),
        }
    }
}

impl From<DbInfraError> for BackendError {
    fn from(e: DbInfraError) -> Self {
        match e {
            DbInfraError::Config { message } => BackendError::Config { detail: message },
            DbInfraError::Connect { message } | DbInfraError::Migration { message } => {
                BackendError::Db { detail: message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(
            BackendError::invalid_operation("x").kind(),
            ErrorKind::InvalidOperation
        );
        assert_eq!(BackendError::config("x").kind(), ErrorKind::Configuration);
        assert_eq!(
            BackendError::authentication("x").kind(),
            ErrorKind::Authentication
        );
        assert_eq!(
            BackendError::unsupported("workflow_list", BackendKind::SqlAlchemy).kind(),
            ErrorKind::Unsupported
        );
        assert_eq!(BackendError::db("x").kind(), ErrorKind::Database);
    }

    #[test]
    fn test_unsupported_message_names_backend() {
        let err = BackendError::unsupported("workflow_list", BackendKind::SqlAlchemy);
        assert_eq!(
            err.to_string(),
            "Operation 'workflow_list' is not available for the sqlalchemy backend"
        );
    }

    #[test]
    fn test_infra_config_maps_to_configuration() {
        let err: BackendError = DbInfraError::config("bad engine").into();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        let err: BackendError = DbInfraError::Connect {
            message: "refused".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Database);
    }
}

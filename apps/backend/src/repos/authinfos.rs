//! Authentication record: which user may use which computer, and how.

use serde_json::Value;

use crate::entities::db_authinfo;
use crate::error::BackendError;
use crate::repos::computers::Computer;
use crate::repos::parse_json;
use crate::repos::users::User;

#[derive(Debug, Clone, PartialEq)]
pub struct AuthInfo {
    pub id: i32,
    pub user_id: i32,
    pub computer_id: i32,
    pub auth_params: Value,
    pub metadata: Value,
    pub enabled: bool,
}

impl AuthInfo {
    pub fn from_parts(
        id: i32,
        user_id: i32,
        computer_id: i32,
        auth_params: &str,
        metadata: &str,
        enabled: bool,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            id,
            user_id,
            computer_id,
            auth_params: parse_json(auth_params, "db_dbauthinfo", id)?,
            metadata: parse_json(metadata, "db_dbauthinfo", id)?,
            enabled,
        })
    }
}

impl TryFrom<db_authinfo::Model> for AuthInfo {
    type Error = BackendError;

    fn try_from(model: db_authinfo::Model) -> Result<Self, Self::Error> {
        Self::from_parts(
            model.id,
            model.aiidauser_id,
            model.dbcomputer_id,
            &model.auth_params,
            &model.metadata,
            model.enabled,
        )
    }
}

/// Reduce the matches of an authinfo lookup to the single allowed record.
///
/// Both backends fetch at most two rows and hand them here, so zero and
/// several matches fail the same way regardless of backend.
pub fn exactly_one<T>(
    mut matches: Vec<T>,
    computer: &Computer,
    user: &User,
) -> Result<T, BackendError> {
    match matches.len() {
        0 => Err(BackendError::authentication(format!(
            "The aiida user {} is not configured to use computer {}",
            user.email, computer.label
        ))),
        1 => Ok(matches.remove(0)),
        _ => Err(BackendError::config(format!(
            "The aiida user {} is configured more than once to use computer {}! \
             Only one configuration is allowed",
            user.email, computer.label
        ))),
    }
}

//! Log entries attached to stored objects.

use serde_json::Value;

use crate::entities::db_log;
use crate::error::BackendError;
use crate::repos::parse_json;

/// The object whose log entries are requested, e.g. a calculation node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    pub objname: String,
    pub objpk: i32,
}

impl LogTarget {
    pub fn new(objname: impl Into<String>, objpk: i32) -> Self {
        Self {
            objname: objname.into(),
            objpk,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogMessage {
    pub id: i32,
    pub time: time::OffsetDateTime,
    pub loggername: String,
    pub levelname: String,
    pub objname: String,
    pub objpk: Option<i32>,
    pub message: String,
    pub metadata: Value,
}

impl TryFrom<db_log::Model> for LogMessage {
    type Error = BackendError;

    fn try_from(model: db_log::Model) -> Result<Self, Self::Error> {
        let metadata = parse_json(&model.metadata, "db_dblog", model.id)?;
        Ok(Self {
            id: model.id,
            time: model.time,
            loggername: model.loggername,
            levelname: model.levelname,
            objname: model.objname,
            objpk: model.objpk,
            message: model.message,
            metadata,
        })
    }
}

//! Legacy workflow records.

use time::{Duration, OffsetDateTime};

use crate::entities::db_workflow;
pub use crate::entities::db_workflow::WorkflowState;

#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
    pub id: i32,
    pub uuid: String,
    pub ctime: OffsetDateTime,
    pub mtime: OffsetDateTime,
    pub user_id: i32,
    pub label: String,
    pub description: String,
    pub state: WorkflowState,
    pub module: String,
    pub module_class: String,
    pub script_path: String,
}

impl From<db_workflow::Model> for Workflow {
    fn from(model: db_workflow::Model) -> Self {
        Self {
            id: model.id,
            uuid: model.uuid,
            ctime: model.ctime,
            mtime: model.mtime,
            user_id: model.user_id,
            label: model.label,
            description: model.description,
            state: model.state,
            module: model.module,
            module_class: model.module_class,
            script_path: model.script_path,
        }
    }
}

/// Selection for a workflow listing.
///
/// A non-empty `pks` selects exactly those workflows and ignores the other
/// fields. Otherwise workflows are narrowed by owner, by state (finished and
/// failed ones are hidden unless `all_states`) and by age.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowListFilter {
    pub pks: Vec<i32>,
    pub user_id: Option<i32>,
    pub all_states: bool,
    pub n_days_ago: Option<u32>,
}

impl WorkflowListFilter {
    pub fn by_pks(pks: impl IntoIterator<Item = i32>) -> Self {
        Self {
            pks: pks.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn for_user(user_id: i32) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn all_states(mut self, all: bool) -> Self {
        self.all_states = all;
        self
    }

    pub fn n_days_ago(mut self, days: u32) -> Self {
        self.n_days_ago = Some(days);
        self
    }

    /// Oldest creation time still listed, relative to `now`.
    ///
    /// A window reaching past the earliest representable time places no
    /// lower bound on the listing.
    pub fn created_since(&self, now: OffsetDateTime) -> Option<OffsetDateTime> {
        self.n_days_ago
            .and_then(|days| now.checked_sub(Duration::days(i64::from(days))))
    }
}

/// States hidden from a listing unless all states are requested.
pub const TERMINAL_STATES: [WorkflowState; 2] = [WorkflowState::Finished, WorkflowState::Error];

//! Typed, reversible schema operations.
//!
//! A migration is described as a [`MigrationPlan`]: a revision, the revision
//! it upgrades from, and an ordered list of [`SchemaOp`]s. Running a plan
//! backward applies the inverse of every operation in reverse order, so a
//! forward run followed by a backward run leaves the schema untouched.
//!
//! [`SchemaSnapshot`] is an in-memory model of the parts of a schema these
//! operations touch. It lets a plan be checked without a database.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use sea_orm::{ConnectionTrait, DatabaseBackend};
use sea_orm_migration::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::schema_version::set_schema_version;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaOp {
    RenameColumn {
        table: &'static str,
        from: &'static str,
        to: &'static str,
    },
    /// Index rename issued as raw PostgreSQL DDL. Other engines skip it.
    RenameIndex {
        from: &'static str,
        to: &'static str,
    },
    SetSchemaVersion {
        from: &'static str,
        to: &'static str,
    },
}

impl SchemaOp {
    pub fn inverse(&self) -> SchemaOp {
        match *self {
            SchemaOp::RenameColumn { table, from, to } => SchemaOp::RenameColumn {
                table,
                from: to,
                to: from,
            },
            SchemaOp::RenameIndex { from, to } => SchemaOp::RenameIndex { from: to, to: from },
            SchemaOp::SetSchemaVersion { from, to } => {
                SchemaOp::SetSchemaVersion { from: to, to: from }
            }
        }
    }

    /// The raw statement for operations that are issued verbatim.
    pub fn raw_sql(&self) -> Option<String> {
        match self {
            SchemaOp::RenameIndex { from, to } => Some(format!("ALTER INDEX {from} rename TO {to}")),
            _ => None,
        }
    }

    pub async fn apply(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        match self {
            SchemaOp::RenameColumn { table, from, to } => {
                manager
                    .alter_table(
                        Table::alter()
                            .table(Alias::new(*table))
                            .rename_column(Alias::new(*from), Alias::new(*to))
                            .to_owned(),
                    )
                    .await
            }
            SchemaOp::RenameIndex { .. } => {
                let backend = manager.get_database_backend();
                if backend != DatabaseBackend::Postgres {
                    debug!(op = %self, ?backend, "index rename skipped for engine");
                    return Ok(());
                }
                let sql = self
                    .raw_sql()
                    .ok_or_else(|| DbErr::Custom(format!("no SQL rendered for {self}")))?;
                manager.get_connection().execute_unprepared(&sql).await?;
                Ok(())
            }
            SchemaOp::SetSchemaVersion { to, .. } => {
                set_schema_version(manager.get_connection(), to).await
            }
        }
    }
}

impl fmt::Display for SchemaOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaOp::RenameColumn { table, from, to } => {
                write!(f, "rename column {table}.{from} -> {to}")
            }
            SchemaOp::RenameIndex { from, to } => write!(f, "rename index {from} -> {to}"),
            SchemaOp::SetSchemaVersion { from, to } => {
                write!(f, "set schema version {from} -> {to}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    pub revision: &'static str,
    pub down_revision: &'static str,
    ops: Vec<SchemaOp>,
}

impl MigrationPlan {
    pub fn new(revision: &'static str, down_revision: &'static str) -> Self {
        Self {
            revision,
            down_revision,
            ops: Vec::new(),
        }
    }

    pub fn op(mut self, op: SchemaOp) -> Self {
        self.ops.push(op);
        self
    }

    /// Append the version bump. Call this last so an interrupted run never
    /// records a revision whose structural changes are incomplete.
    pub fn bump_version(self) -> Self {
        let (from, to) = (self.down_revision, self.revision);
        self.op(SchemaOp::SetSchemaVersion { from, to })
    }

    pub fn forward(&self) -> &[SchemaOp] {
        &self.ops
    }

    pub fn backward(&self) -> Vec<SchemaOp> {
        self.ops.iter().rev().map(SchemaOp::inverse).collect()
    }

    pub fn steps(&self, direction: Direction) -> Vec<SchemaOp> {
        match direction {
            Direction::Forward => self.ops.clone(),
            Direction::Backward => self.backward(),
        }
    }

    pub async fn run(&self, manager: &SchemaManager<'_>, direction: Direction) -> Result<(), DbErr> {
        debug!(
            revision = self.revision,
            down_revision = self.down_revision,
            ?direction,
            "running migration plan"
        );
        for op in self.steps(direction) {
            op.apply(manager).await?;
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("table {0} does not exist")]
    MissingTable(String),
    #[error("column {table}.{column} does not exist")]
    MissingColumn { table: String, column: String },
    #[error("column {table}.{column} already exists")]
    ColumnExists { table: String, column: String },
    #[error("index {0} does not exist")]
    MissingIndex(String),
    #[error("index {0} already exists")]
    IndexExists(String),
    #[error("schema version is {found:?}, expected {expected}")]
    VersionMismatch {
        expected: String,
        found: Option<String>,
    },
}

/// In-memory view of tables, index names and the recorded schema version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaSnapshot {
    tables: BTreeMap<String, BTreeSet<String>>,
    indexes: BTreeSet<String>,
    schema_version: Option<String>,
}

impl SchemaSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: &str, columns: &[&str]) -> Self {
        self.tables.insert(
            table.to_string(),
            columns.iter().map(|c| (*c).to_owned()).collect(),
        );
        self
    }

    pub fn with_index(mut self, name: &str) -> Self {
        self.indexes.insert(name.to_string());
        self
    }

    pub fn with_schema_version(mut self, version: &str) -> Self {
        self.schema_version = Some(version.to_string());
        self
    }

    pub fn has_column(&self, table: &str, column: &str) -> bool {
        self.tables
            .get(table)
            .is_some_and(|cols| cols.contains(column))
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.contains(name)
    }

    pub fn schema_version(&self) -> Option<&str> {
        self.schema_version.as_deref()
    }

    pub fn apply(&mut self, op: &SchemaOp) -> Result<(), SnapshotError> {
        match *op {
            SchemaOp::RenameColumn { table, from, to } => {
                let cols = self
                    .tables
                    .get_mut(table)
                    .ok_or_else(|| SnapshotError::MissingTable(table.to_string()))?;
                if cols.contains(to) {
                    return Err(SnapshotError::ColumnExists {
                        table: table.to_string(),
                        column: to.to_string(),
                    });
                }
                if !cols.remove(from) {
                    return Err(SnapshotError::MissingColumn {
                        table: table.to_string(),
                        column: from.to_string(),
                    });
                }
                cols.insert(to.to_string());
            }
            SchemaOp::RenameIndex { from, to } => {
                if self.indexes.contains(to) {
                    return Err(SnapshotError::IndexExists(to.to_string()));
                }
                if !self.indexes.remove(from) {
                    return Err(SnapshotError::MissingIndex(from.to_string()));
                }
                self.indexes.insert(to.to_string());
            }
            SchemaOp::SetSchemaVersion { from, to } => {
                if self.schema_version.as_deref() != Some(from) {
                    return Err(SnapshotError::VersionMismatch {
                        expected: from.to_string(),
                        found: self.schema_version.clone(),
                    });
                }
                self.schema_version = Some(to.to_string());
            }
        }
        Ok(())
    }

    /// Apply `ops` in order, stopping at the first failure.
    pub fn apply_all(&mut self, ops: &[SchemaOp]) -> Result<(), SnapshotError> {
        ops.iter().try_for_each(|op| self.apply(op))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn inverse_of_inverse_is_identity() {
        let op = SchemaOp::RenameColumn {
            table: "t",
            from: "a",
            to: "b",
        };
        assert_eq!(op.inverse().inverse(), op);
    }

    #[test]
    fn raw_sql_only_for_index_renames() {
        let idx = SchemaOp::RenameIndex { from: "x", to: "y" };
        assert_eq!(idx.raw_sql().as_deref(), Some("ALTER INDEX x rename TO y"));
        assert_eq!(idx.inverse().raw_sql().as_deref(), Some("ALTER INDEX y rename TO x"));

        let col = SchemaOp::RenameColumn {
            table: "t",
            from: "a",
            to: "b",
        };
        assert!(col.raw_sql().is_none());
    }

    #[test]
    fn backward_reverses_order() {
        let plan = MigrationPlan::new("2", "1")
            .op(SchemaOp::RenameColumn {
                table: "t",
                from: "a",
                to: "b",
            })
            .op(SchemaOp::RenameIndex { from: "i", to: "j" })
            .bump_version();

        let back = plan.backward();
        assert_eq!(back[0], SchemaOp::SetSchemaVersion { from: "2", to: "1" });
        assert_eq!(back[1], SchemaOp::RenameIndex { from: "j", to: "i" });
        assert_eq!(
            back[2],
            SchemaOp::RenameColumn {
                table: "t",
                from: "b",
                to: "a"
            }
        );
    }

    #[test]
    fn snapshot_rejects_missing_column() {
        let mut snap = SchemaSnapshot::new().with_table("t", &["a"]);
        let err = snap
            .apply(&SchemaOp::RenameColumn {
                table: "t",
                from: "zzz",
                to: "b",
            })
            .unwrap_err();
        assert_eq!(
            err,
            SnapshotError::MissingColumn {
                table: "t".into(),
                column: "zzz".into()
            }
        );
    }

    #[test]
    fn snapshot_rejects_clobbering_index() {
        let mut snap = SchemaSnapshot::new().with_index("i").with_index("j");
        let err = snap
            .apply(&SchemaOp::RenameIndex { from: "i", to: "j" })
            .unwrap_err();
        assert_eq!(err, SnapshotError::IndexExists("j".into()));
        assert!(snap.has_index("i"));
    }

    #[test]
    fn snapshot_checks_version_predecessor() {
        let mut snap = SchemaSnapshot::new().with_schema_version("1.0.46");
        let err = snap
            .apply(&SchemaOp::SetSchemaVersion {
                from: "1.0.47",
                to: "1.0.48",
            })
            .unwrap_err();
        assert!(matches!(err, SnapshotError::VersionMismatch { .. }));
        assert_eq!(snap.schema_version(), Some("1.0.46"));
    }

    fn leak(s: String) -> &'static str {
        Box::leak(s.into_boxed_str())
    }

    proptest! {
        #[test]
        fn forward_then_backward_restores_snapshot(
            col_from in "[a-z]{1,8}",
            col_to in "[A-Z]{1,8}",
            idx_from in "ix_[a-z]{1,8}",
            idx_to in "ux_[a-z]{1,8}",
        ) {
            let (col_from, col_to) = (leak(col_from), leak(col_to));
            let (idx_from, idx_to) = (leak(idx_from), leak(idx_to));

            let original = SchemaSnapshot::new()
                .with_table("tbl", &[col_from, "other"])
                .with_index(idx_from)
                .with_schema_version("1");
            let plan = MigrationPlan::new("2", "1")
                .op(SchemaOp::RenameColumn { table: "tbl", from: col_from, to: col_to })
                .op(SchemaOp::RenameIndex { from: idx_from, to: idx_to })
                .bump_version();

            let mut snap = original.clone();
            snap.apply_all(plan.forward()).unwrap();
            prop_assert!(snap.has_column("tbl", col_to));
            prop_assert!(snap.has_index(idx_to));
            prop_assert_eq!(snap.schema_version(), Some("2"));

            snap.apply_all(&plan.backward()).unwrap();
            prop_assert_eq!(snap, original);
        }
    }
}

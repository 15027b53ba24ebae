//! Diff a [`SchemaDescriptor`] against a [`LiveSchema`].
//!
//! The planner is pure: it only emits additive operations and never emits one
//! for something the live schema already has. Extra live tables and columns
//! are ignored.

use std::fmt;

use super::descriptor::{ColumnSpec, IndexSpec, SchemaDescriptor, TableSpec};
use super::introspect::{LiveSchema, TableState};

/// Kind tag of a [`MigrationOperation`], handy for logs and assertions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    CreateTable,
    AddColumn,
    CreateIndex,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CreateTable => "create_table",
            Self::AddColumn => "add_column",
            Self::CreateIndex => "create_index",
        })
    }
}

/// One additive schema change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MigrationOperation {
    CreateTable { table: TableSpec },
    AddColumn { table: String, column: ColumnSpec },
    CreateIndex { table: String, index: IndexSpec },
}

impl MigrationOperation {
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::CreateTable { .. } => OperationKind::CreateTable,
            Self::AddColumn { .. } => OperationKind::AddColumn,
            Self::CreateIndex { .. } => OperationKind::CreateIndex,
        }
    }

    /// Target table.
    #[must_use]
    pub fn table(&self) -> &str {
        match self {
            Self::CreateTable { table } => &table.name,
            Self::AddColumn { table, .. } | Self::CreateIndex { table, .. } => table,
        }
    }
}

impl fmt::Display for MigrationOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateTable { table } => write!(f, "create table {}", table.name),
            Self::AddColumn { table, column } => {
                write!(f, "add column {table}.{}", column.name)
            }
            Self::CreateIndex { table, index } => {
                write!(f, "create index {} on {table}", index.name)
            }
        }
    }
}

/// Ordered list of operations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MigrationPlan {
    operations: Vec<MigrationOperation>,
}

impl MigrationPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MigrationOperation> {
        self.operations.iter()
    }

    #[must_use]
    pub fn operations(&self) -> &[MigrationOperation] {
        &self.operations
    }
}

impl IntoIterator for MigrationPlan {
    type Item = MigrationOperation;
    type IntoIter = std::vec::IntoIter<MigrationOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_iter()
    }
}

impl<'a> IntoIterator for &'a MigrationPlan {
    type Item = &'a MigrationOperation;
    type IntoIter = std::slice::Iter<'a, MigrationOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

/// Compute the minimal ordered set of operations that brings `live` up to
/// `descriptor`.
#[must_use]
pub fn plan(descriptor: &SchemaDescriptor, live: &LiveSchema) -> MigrationPlan {
    let mut operations = Vec::new();

    for table in descriptor.tables() {
        match live.table(&table.name) {
            TableState::Missing => {
                operations.push(MigrationOperation::CreateTable {
                    table: table.clone(),
                });
                operations.extend(table.indexes.iter().map(|index| {
                    MigrationOperation::CreateIndex {
                        table: table.name.clone(),
                        index: index.clone(),
                    }
                }));
            }
            TableState::Present { columns, indexes } => {
                operations.extend(
                    table
                        .columns
                        .iter()
                        .filter(|c| !columns.contains(&c.name))
                        .map(|column| MigrationOperation::AddColumn {
                            table: table.name.clone(),
                            column: column.clone(),
                        }),
                );
                // Index columns either exist already or are added just above.
                operations.extend(
                    table
                        .indexes
                        .iter()
                        .filter(|i| !indexes.contains(&i.name))
                        .map(|index| MigrationOperation::CreateIndex {
                            table: table.name.clone(),
                            index: index.clone(),
                        }),
                );
            }
        }
    }

    MigrationPlan { operations }
}

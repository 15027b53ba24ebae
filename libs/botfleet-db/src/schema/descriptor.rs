//! Declared shape of the schema the application expects.
//!
//! A [`SchemaDescriptor`] is static per binary and never persisted. The planner
//! diffs it against the live store; nothing here performs I/O.

use std::collections::BTreeSet;

use thiserror::Error;

/// Portable column types. Rendering per engine lives in `schema::sql`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColumnType {
    BigInt,
    Text,
    Boolean,
    Timestamp,
    Json,
}

/// Constant column defaults.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnDefault {
    CurrentTimestamp,
    Bool(bool),
    Int(i64),
    Text(String),
}

/// One declared column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub ty: ColumnType,
    pub nullable: bool,
    /// Auto-increment integer primary key.
    pub primary_key: bool,
    pub unique: bool,
    pub default: Option<ColumnDefault>,
}

impl ColumnSpec {
    /// A `NOT NULL` column without default.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
            primary_key: false,
            unique: false,
            default: None,
        }
    }

    /// The conventional `id` auto-increment primary key.
    #[must_use]
    pub fn id() -> Self {
        Self {
            primary_key: true,
            ..Self::new("id", ColumnType::BigInt)
        }
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub fn default(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }

    /// Whether this column can be added to a table that already holds rows.
    ///
    /// `SQLite` rejects `ADD COLUMN` for `NOT NULL` columns without a default,
    /// for non-constant defaults and for primary keys.
    #[must_use]
    pub fn is_addable(&self) -> bool {
        if self.primary_key || self.unique {
            return false;
        }
        match &self.default {
            Some(ColumnDefault::CurrentTimestamp) => false,
            Some(_) => true,
            None => self.nullable,
        }
    }
}

/// One declared index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

impl IndexSpec {
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
        }
    }

    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// One declared table: ordered columns plus indexes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableSpec {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
    pub indexes: Vec<IndexSpec>,
}

impl TableSpec {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
        }
    }

    #[must_use]
    pub fn column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn index(mut self, index: IndexSpec) -> Self {
        self.indexes.push(index);
        self
    }

    #[must_use]
    pub fn find_column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Problems with a descriptor itself, caught before any I/O.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("table '{table}' is declared more than once")]
    DuplicateTable { table: String },

    #[error("column '{column}' is declared more than once in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("index '{index}' on table '{table}' references unknown column '{column}'")]
    UnknownIndexColumn {
        table: String,
        index: String,
        column: String,
    },

    #[error("table '{table}' declares no columns")]
    EmptyTable { table: String },
}

/// Ordered list of tables the application expects.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchemaDescriptor {
    tables: Vec<TableSpec>,
}

impl SchemaDescriptor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn table(mut self, table: TableSpec) -> Self {
        self.tables.push(table);
        self
    }

    #[must_use]
    pub fn tables(&self) -> &[TableSpec] {
        &self.tables
    }

    /// Table names in declaration order.
    #[must_use]
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Structural checks: unique table and column names, non-empty tables,
    /// index columns that exist.
    ///
    /// # Errors
    /// Returns the first `DescriptorError` found.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        let mut tables = BTreeSet::new();
        for table in &self.tables {
            if !tables.insert(table.name.as_str()) {
                return Err(DescriptorError::DuplicateTable {
                    table: table.name.clone(),
                });
            }
            if table.columns.is_empty() {
                return Err(DescriptorError::EmptyTable {
                    table: table.name.clone(),
                });
            }

            let mut columns = BTreeSet::new();
            for column in &table.columns {
                if !columns.insert(column.name.as_str()) {
                    return Err(DescriptorError::DuplicateColumn {
                        table: table.name.clone(),
                        column: column.name.clone(),
                    });
                }
            }

            for index in &table.indexes {
                if let Some(missing) = index
                    .columns
                    .iter()
                    .find(|c| !columns.contains(c.as_str()))
                {
                    return Err(DescriptorError::UnknownIndexColumn {
                        table: table.name.clone(),
                        index: index.name.clone(),
                        column: missing.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn bots() -> TableSpec {
        TableSpec::new("bots")
            .column(ColumnSpec::id())
            .column(ColumnSpec::new("name", ColumnType::Text))
            .column(ColumnSpec::new("owner_id", ColumnType::BigInt).nullable())
    }

    #[test]
    fn valid_descriptor_passes() {
        let desc = SchemaDescriptor::new()
            .table(bots().index(IndexSpec::new("ix_bots_owner_id", ["owner_id"])));
        assert_eq!(desc.validate(), Ok(()));
        assert_eq!(desc.table_names(), vec!["bots"]);
    }

    #[test]
    fn duplicate_table_is_rejected() {
        let desc = SchemaDescriptor::new().table(bots()).table(bots());
        assert!(matches!(
            desc.validate(),
            Err(DescriptorError::DuplicateTable { .. })
        ));
    }

    #[test]
    fn duplicate_column_is_rejected() {
        let desc =
            SchemaDescriptor::new().table(bots().column(ColumnSpec::new("name", ColumnType::Text)));
        assert_eq!(
            desc.validate(),
            Err(DescriptorError::DuplicateColumn {
                table: "bots".into(),
                column: "name".into()
            })
        );
    }

    #[test]
    fn index_on_unknown_column_is_rejected() {
        let desc =
            SchemaDescriptor::new().table(bots().index(IndexSpec::new("ix_bad", ["nope"])));
        assert!(matches!(
            desc.validate(),
            Err(DescriptorError::UnknownIndexColumn { .. })
        ));
    }

    #[test]
    fn addability_follows_sqlite_rules() {
        assert!(ColumnSpec::new("owner_id", ColumnType::BigInt).nullable().is_addable());
        assert!(
            ColumnSpec::new("is_active", ColumnType::Boolean)
                .default(ColumnDefault::Bool(true))
                .is_addable()
        );
        assert!(!ColumnSpec::new("stage", ColumnType::Text).is_addable());
        assert!(
            !ColumnSpec::new("created_at", ColumnType::Timestamp)
                .default(ColumnDefault::CurrentTimestamp)
                .is_addable()
        );
        assert!(!ColumnSpec::id().is_addable());
    }
}

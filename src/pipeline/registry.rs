//! Table registry: the column layout of every table a pipeline may reference.
//!
//! The registry is supplied by the caller for each validation and is only ever
//! read. Column order is preserved as given; duplicate names within a table are
//! dropped on insert.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping from table name to its ordered column names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableRegistry {
    tables: BTreeMap<String, Vec<String>>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table, builder style
    #[must_use]
    pub fn with_table<I, S>(mut self, name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(name, columns);
        self
    }

    /// Register (or replace) a table
    pub fn insert<I, S>(&mut self, name: impl Into<String>, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for column in columns {
            let column = column.into();
            if !unique.contains(&column) {
                unique.push(column);
            }
        }
        self.tables.insert(name.into(), unique);
    }

    /// Columns of `table`, in their original order
    pub fn columns(&self, table: &str) -> Option<&[String]> {
        self.tables.get(table).map(Vec::as_slice)
    }

    pub fn contains_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn has_column(&self, table: &str, column: &str) -> bool {
        self.columns(table)
            .is_some_and(|cols| cols.iter().any(|c| c == column))
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }
}

impl<K, I, S> FromIterator<(K, I)> for TableRegistry
where
    K: Into<String>,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, I)>>(iter: T) -> Self {
        let mut registry = Self::new();
        for (name, columns) in iter {
            registry.insert(name, columns);
        }
        registry
    }
}

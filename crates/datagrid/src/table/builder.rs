use std::sync::Arc;

use crate::column::Column;
use crate::error::{DatagridError, Result};
use crate::filter::QuerySnapshot;
use crate::options::{Options, ResolvedOptions};
use crate::registry::Registry;

/// Collects the columns of a table in insertion order, keyed by path.
#[derive(Debug)]
pub struct TableBuilder {
    columns: Vec<Column>,
    table_options: Arc<ResolvedOptions>,
    snapshot: Option<QuerySnapshot>,
    registry: Arc<Registry>,
}

impl TableBuilder {
    pub fn new(table_options: Arc<ResolvedOptions>, snapshot: Option<QuerySnapshot>, registry: Arc<Registry>) -> Self {
        TableBuilder {
            columns: Vec::new(),
            table_options,
            snapshot,
            registry,
        }
    }

    /// Creates a column of `type_name` at `path`.
    ///
    /// Adding a path twice replaces the earlier column in place.
    pub fn add(&mut self, path: &str, type_name: &str, options: Options) -> Result<&mut Self> {
        let column = Column::new(
            path,
            type_name,
            options,
            self.table_options.clone(),
            self.snapshot.clone(),
            self.registry.clone(),
        )?;
        Ok(self.add_column(column))
    }

    /// Adds a prepared column under its path.
    pub fn add_column(&mut self, column: Column) -> &mut Self {
        match self.columns.iter().position(|c| c.path() == column.path()) {
            Some(index) => self.columns[index] = column,
            None => self.columns.push(column),
        }
        self
    }

    pub fn get(&self, path: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.path() == path)
            .ok_or_else(|| DatagridError::UnknownColumn(path.to_string()))
    }

    pub fn get_mut(&mut self, path: &str) -> Result<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.path() == path)
            .ok_or_else(|| DatagridError::UnknownColumn(path.to_string()))
    }

    pub fn has(&self, path: &str) -> bool {
        self.columns.iter().any(|c| c.path() == path)
    }

    pub fn remove(&mut self, path: &str) -> Option<Column> {
        let index = self.columns.iter().position(|c| c.path() == path)?;
        Some(self.columns.remove(index))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn table_options(&self) -> &ResolvedOptions {
        &self.table_options
    }

    /// Reorders the columns by path. Columns not named keep their relative
    /// order after the named ones.
    pub(crate) fn reorder(&mut self, paths: &[String]) {
        let mut remaining = std::mem::take(&mut self.columns);
        for path in paths {
            if let Some(index) = remaining.iter().position(|c| c.path() == path) {
                self.columns.push(remaining.remove(index));
            }
        }
        self.columns.append(&mut remaining);
    }
}

//! In-memory store
//!
//! Backs the loopback channel in tests, the CLI demo, and embedded use.
//! The metadata revision id of a table is regenerated only when a write
//! actually changes its entry list.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use super::Store;
use crate::metadata::{MetadataEntry, MetadataSet};
use crate::protocol::{
    QueryRequest, QueryResult, Row, TableInfo, Token, TransportError, TransportResult,
};

#[derive(Debug)]
struct TableState {
    columns: Vec<String>,
    rows: Vec<Row>,
    open: bool,
    metadata: MetadataSet,
}

impl TableState {
    fn info(&self, table_id: &str) -> TableInfo {
        TableInfo {
            table_id: table_id.to_string(),
            columns: self.columns.clone(),
            row_count: self.rows.len() as u64,
        }
    }

    fn bump_revision(&mut self) {
        self.metadata.revision_id = Some(Token::generate());
    }
}

/// In-memory implementation of `Store`
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, TableState>>,
    writers: RwLock<HashSet<String>>,
}

fn poisoned() -> TransportError {
    TransportError::internal("Lock poisoned")
}

fn no_such_table(table_id: &str) -> TransportError {
    TransportError::argument_error(format!("no such table: {}", table_id))
}

fn table_not_open(table_id: &str) -> TransportError {
    TransportError::storage_error(format!("table not open: {}", table_id))
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with the given columns.
    pub fn create_table(&self, table_id: &str, columns: &[&str]) -> TransportResult<()> {
        if table_id.is_empty() {
            return Err(TransportError::argument_error("table id must not be empty"));
        }
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        if tables.contains_key(table_id) {
            return Err(TransportError::argument_error(format!(
                "table already exists: {}",
                table_id
            )));
        }
        tables.insert(
            table_id.to_string(),
            TableState {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                rows: Vec::new(),
                open: false,
                metadata: MetadataSet::new(table_id, Some(Token::generate()), Vec::new()),
            },
        );
        Ok(())
    }

    /// Append a row. Every column of the row must belong to the table.
    pub fn insert_row(&self, table_id: &str, row: Row) -> TransportResult<()> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let table = tables
            .get_mut(table_id)
            .ok_or_else(|| no_such_table(table_id))?;

        if let Some(unknown) = row.values.keys().find(|c| !table.columns.contains(c)) {
            return Err(TransportError::argument_error(format!(
                "unknown column {} in table {}",
                unknown, table_id
            )));
        }
        if table.rows.iter().any(|r| r.row_id == row.row_id) {
            return Err(TransportError::storage_error(format!(
                "duplicate row id {} in table {}",
                row.row_id, table_id
            )));
        }
        table.rows.push(row);
        Ok(())
    }

    /// Allow `principal` to write metadata.
    pub fn grant_write(&self, principal: impl Into<String>) -> TransportResult<()> {
        self.writers
            .write()
            .map_err(|_| poisoned())?
            .insert(principal.into());
        Ok(())
    }

    fn authorize(&self, principal: Option<&str>) -> TransportResult<()> {
        let writers = self.writers.read().map_err(|_| poisoned())?;
        match principal {
            Some(p) if writers.contains(p) => Ok(()),
            Some(p) => Err(TransportError::not_authorized(format!(
                "{} may not write metadata",
                p
            ))),
            None => Err(TransportError::not_authorized(
                "metadata writes require a principal",
            )),
        }
    }
}

impl Store for MemoryStore {
    fn open_table(&self, table_id: &str) -> TransportResult<TableInfo> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let table = tables
            .get_mut(table_id)
            .ok_or_else(|| no_such_table(table_id))?;
        table.open = true;
        Ok(table.info(table_id))
    }

    fn close_table(&self, table_id: &str) -> TransportResult<()> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let table = tables
            .get_mut(table_id)
            .ok_or_else(|| no_such_table(table_id))?;
        if !table.open {
            return Err(table_not_open(table_id));
        }
        table.open = false;
        Ok(())
    }

    fn query(&self, request: &QueryRequest) -> TransportResult<QueryResult> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        let table = tables
            .get(&request.table_id)
            .ok_or_else(|| no_such_table(&request.table_id))?;
        if !table.open {
            return Err(table_not_open(&request.table_id));
        }

        if let Some(filter) = &request.filter {
            if !table.columns.contains(&filter.column) {
                return Err(TransportError::argument_error(format!(
                    "unknown column {} in table {}",
                    filter.column, request.table_id
                )));
            }
        }

        let rows = table
            .rows
            .iter()
            .filter(|row| match &request.filter {
                Some(filter) => row.values.get(&filter.column) == Some(&filter.equals),
                None => true,
            })
            .take(request.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Ok(QueryResult {
            table_id: request.table_id.clone(),
            columns: table.columns.clone(),
            rows,
        })
    }

    fn get_row(&self, table_id: &str, row_id: &str) -> TransportResult<Option<Row>> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        let table = tables.get(table_id).ok_or_else(|| no_such_table(table_id))?;
        if !table.open {
            return Err(table_not_open(table_id));
        }
        Ok(table.rows.iter().find(|r| r.row_id == row_id).cloned())
    }

    fn metadata(&self, table_id: &str) -> TransportResult<MetadataSet> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        let table = tables.get(table_id).ok_or_else(|| no_such_table(table_id))?;
        Ok(table.metadata.clone())
    }

    fn put_metadata(&self, principal: Option<&str>, entry: MetadataEntry) -> TransportResult<()> {
        self.authorize(principal)?;
        if entry.key.is_empty() {
            return Err(TransportError::argument_error("metadata key must not be empty"));
        }

        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let table = tables
            .get_mut(&entry.table_id)
            .ok_or_else(|| no_such_table(&entry.table_id))?;

        let entries = &mut table.metadata.entries;
        match entries
            .iter_mut()
            .find(|e| e.same_slot(&entry.partition, &entry.aspect, &entry.key))
        {
            Some(existing) if *existing == entry => return Ok(()),
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        table.bump_revision();
        Ok(())
    }

    fn delete_metadata(
        &self,
        principal: Option<&str>,
        table_id: &str,
        partition: &str,
        aspect: &str,
        key: &str,
    ) -> TransportResult<()> {
        self.authorize(principal)?;

        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let table = tables
            .get_mut(table_id)
            .ok_or_else(|| no_such_table(table_id))?;

        let before = table.metadata.entries.len();
        table
            .metadata
            .entries
            .retain(|e| !e.same_slot(partition, aspect, key));
        if table.metadata.entries.len() != before {
            table.bump_revision();
        }
        Ok(())
    }
}

//! The table registry: every live table, owned by the game worker.
//!
//! One `Registry` holds the whole server's tables. It is owned by the
//! single game worker and never shared, so there is no locking; everything
//! here is plain synchronous map manipulation.

use log::info;
use std::collections::BTreeMap;

use super::{Table, TableConfig, TableError, TableSnapshot};
use crate::game::entities::TableId;

#[derive(Debug)]
pub struct Registry {
    tables: BTreeMap<TableId, Table>,
    next_id: TableId,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            tables: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Validate `config` and open a new table under a fresh id.
    pub fn create(&mut self, config: TableConfig) -> Result<&mut Table, TableError> {
        config.validate().map_err(TableError::InvalidConfig)?;
        let id = self.next_id;
        self.next_id += 1;
        info!("created table {id} '{}'", config.name);
        let table = self.tables.entry(id).or_insert_with(|| Table::new(id, config));
        Ok(table)
    }

    pub fn get(&self, id: TableId) -> Result<&Table, TableError> {
        self.tables.get(&id).ok_or(TableError::NoSuchTable(id))
    }

    pub fn get_mut(&mut self, id: TableId) -> Result<&mut Table, TableError> {
        self.tables.get_mut(&id).ok_or(TableError::NoSuchTable(id))
    }

    /// Close a table and hand it back to the caller, who is responsible for
    /// telling its observers.
    pub fn delete(&mut self, id: TableId) -> Result<Table, TableError> {
        let table = self.tables.remove(&id).ok_or(TableError::NoSuchTable(id))?;
        info!("deleted table {id} '{}'", table.config().name);
        Ok(table)
    }

    pub fn list(&self) -> Vec<TableSnapshot> {
        self.tables.values().map(Table::snapshot).collect()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.tables.values_mut()
    }
}

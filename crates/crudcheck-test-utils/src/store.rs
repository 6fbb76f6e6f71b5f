//! In-memory stand-in for the `items` table

use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crudcheck_core::model::{ItemRow, NewItem};
use crudcheck_core::{HarnessError, HarnessResult, ItemLookup};

#[derive(Debug)]
struct Table {
    next_id: i64,
    rows: BTreeMap<i64, ItemRow>,
}

impl Table {
    fn take_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Default for Table {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

/// Shared table; clones see the same rows
#[derive(Debug, Clone, Default)]
pub struct InMemoryItemStore {
    table: Arc<RwLock<Table>>,
    unreachable: Arc<AtomicBool>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row with the next serial id
    pub fn insert(&self, item: &NewItem) -> ItemRow {
        let mut table = self.table.write();
        let id = table.take_id();

        let row = ItemRow {
            id,
            name: item.name.clone(),
            description: item.description.clone(),
        };
        table.rows.insert(id, row.clone());
        row
    }

    /// Consume the next serial id without writing a row
    pub fn reserve_id(&self) -> i64 {
        self.table.write().take_id()
    }

    pub fn get(&self, id: i64) -> Option<ItemRow> {
        self.table.read().rows.get(&id).cloned()
    }

    /// First row holding `name`
    pub fn find_by_name(&self, name: &str) -> Option<ItemRow> {
        self.table
            .read()
            .rows
            .values()
            .find(|row| row.name == name)
            .cloned()
    }

    pub fn remove(&self, id: i64) -> Option<ItemRow> {
        self.table.write().rows.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.table.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make lookups through [`ItemLookup`] fail as if the database were down.
    /// The HTTP side keeps working.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    fn check_reachable(&self) -> HarnessResult<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(HarnessError::Database(sqlx::Error::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "database unreachable",
            ))));
        }
        Ok(())
    }
}

#[async_trait]
impl ItemLookup for InMemoryItemStore {
    async fn find_item(&self, id: i64) -> HarnessResult<Option<ItemRow>> {
        self.check_reachable()?;
        Ok(self.get(id))
    }

    async fn item_exists(&self, id: i64) -> HarnessResult<bool> {
        self.check_reachable()?;
        Ok(self.get(id).is_some())
    }
}

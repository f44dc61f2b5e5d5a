//! The `ID -> Row` mapping a load produces.
//!
//! Rows go into a [`RecordStoreBuilder`] while a table is decoded. Once every section and copy
//! entry has been applied, [`RecordStoreBuilder::finish`] freezes it into a [`RecordStore`], which
//! has no mutating methods at all. Readers on any number of threads can share the frozen store.

use std::collections::{btree_map, BTreeMap};

use crate::error::{Error, Result};
use crate::row::Row;

/// Accumulates rows during a single load.
#[derive(Debug, Default)]
pub(crate) struct RecordStoreBuilder {
    rows: BTreeMap<u32, Row>,
    copies: BTreeMap<u32, u32>,
}

impl RecordStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a decoded row. Each ID can only be inserted once.
    pub fn insert(&mut self, row: Row) -> Result<()> {
        match self.rows.entry(row.id()) {
            btree_map::Entry::Occupied(_) => Err(Error::DuplicateId(row.id())),
            btree_map::Entry::Vacant(slot) => {
                slot.insert(row);
                Ok(())
            }
        }
    }

    /// Queue a copy-table entry. Copies are materialized by [`finish`][Self::finish], after every
    /// decoded row is present. A later entry for the same new ID replaces an earlier one.
    pub fn queue_copy(&mut self, new_id: u32, source_id: u32) {
        self.copies.insert(new_id, source_id);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Apply the queued copies and freeze the store.
    ///
    /// A copy entry with a new ID of zero is skipped: the format uses it as "no copy", and it
    /// neither creates nor replaces a row.
    pub fn finish(mut self) -> Result<RecordStore> {
        let copies = std::mem::take(&mut self.copies);
        for (new_id, source_id) in copies {
            if new_id == 0 {
                continue;
            }
            let row = self
                .rows
                .get(&source_id)
                .ok_or(Error::MissingCopySource { new_id, source_id })?
                .with_id(new_id);
            self.insert(row)?;
        }
        Ok(RecordStore { rows: self.rows })
    }
}

/// Decoded rows, keyed by ID. Immutable once built.
#[derive(Clone, Debug, Default)]
pub struct RecordStore {
    rows: BTreeMap<u32, Row>,
}

impl RecordStore {
    pub fn get(&self, id: u32) -> Option<&Row> {
        self.rows.get(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.rows.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over rows in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.rows.keys().copied()
    }
}

impl<'a> IntoIterator for &'a RecordStore {
    type Item = &'a Row;
    type IntoIter = btree_map::Values<'a, u32, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.values()
    }
}

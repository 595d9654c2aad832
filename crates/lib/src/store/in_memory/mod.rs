//! In-memory record store implementation
//!
//! This module provides an in-memory implementation of the RecordStore trait,
//! suitable for testing, development, or embedding where the ordered records
//! fit comfortably in memory and durability is handled by saving to a file.

mod persistence;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{RecordStore, ShiftCriteria, StoreError};
use crate::Result;
use crate::config::SequencerConfig;
use crate::record::{GroupKey, Position, RecordId};

/// Stored rows keyed by record id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Table {
    pub(crate) rows: BTreeMap<RecordId, Position>,
}

/// A record store held entirely in memory.
///
/// Transactions are serialized: [`begin`](RecordStore::begin) waits for any
/// other open transaction to finish, then works on a private copy of the
/// table. [`commit`](RecordStore::commit) swaps the copy in and
/// [`rollback`](RecordStore::rollback) throws it away, so a failed move never
/// leaves half-shifted siblings behind.
///
/// Cloning an `InMemory` yields another handle to the same table.
///
/// Do not call [`save_to_file`](InMemory::save_to_file) or
/// [`snapshot`](InMemory::snapshot) while holding an open transaction from the
/// same task; they wait for that transaction to end.
#[derive(Debug, Clone)]
pub struct InMemory {
    table: Arc<Mutex<Table>>,
    config: SequencerConfig,
}

/// An open [`InMemory`] transaction.
///
/// Holds the table lock for its whole lifetime. Dropping it without
/// committing is equivalent to a rollback.
#[derive(Debug)]
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<Table>,
    staged: Table,
}

impl InMemory {
    /// Creates a new, empty store using the default field names.
    pub fn new() -> Self {
        Self::with_config(SequencerConfig::default())
    }

    /// Creates a new, empty store whose persistence file uses the field
    /// names from `config`.
    pub fn with_config(config: SequencerConfig) -> Self {
        Self::from_table(Table::default(), config)
    }

    pub(crate) fn from_table(table: Table, config: SequencerConfig) -> Self {
        Self {
            table: Arc::new(Mutex::new(table)),
            config,
        }
    }

    /// The configuration this store was created with.
    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Committed positions of every record.
    pub async fn snapshot(&self) -> BTreeMap<RecordId, Position> {
        self.table.lock().await.rows.clone()
    }

    /// Saves every committed row to a JSON file.
    ///
    /// Rows are written as objects keyed by the configured id, group and
    /// sequence field names.
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let table = self.table.lock().await.clone();
        persistence::save_to_file(&table, &self.config, path).await
    }

    /// Loads a store previously written by [`save_to_file`](InMemory::save_to_file).
    ///
    /// `config` must name the same fields the file was saved with.
    pub async fn load_from_file<P: AsRef<Path>>(path: P, config: SequencerConfig) -> Result<Self> {
        let table = persistence::load_from_file(path, &config).await?;
        Ok(Self::from_table(table, config))
    }
}

impl Default for InMemory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemory {
    type Transaction = InMemoryTransaction;

    async fn begin(&self) -> Result<InMemoryTransaction> {
        let guard = Arc::clone(&self.table).lock_owned().await;
        let staged = guard.clone();
        Ok(InMemoryTransaction { guard, staged })
    }

    async fn commit(&self, tx: InMemoryTransaction) -> Result<()> {
        let InMemoryTransaction { mut guard, staged } = tx;
        *guard = staged;
        Ok(())
    }

    async fn rollback(&self, tx: InMemoryTransaction) -> Result<()> {
        drop(tx);
        Ok(())
    }

    async fn read_position(
        &self,
        tx: &mut InMemoryTransaction,
        id: RecordId,
    ) -> Result<Option<Position>> {
        Ok(tx.staged.rows.get(&id).copied())
    }

    async fn max_sequence(
        &self,
        tx: &mut InMemoryTransaction,
        group: GroupKey,
    ) -> Result<Option<i64>> {
        Ok(tx
            .staged
            .rows
            .values()
            .filter(|position| position.group == group)
            .map(|position| position.sequence)
            .max())
    }

    async fn shift(
        &self,
        tx: &mut InMemoryTransaction,
        criteria: ShiftCriteria,
        delta: i64,
    ) -> Result<u64> {
        let mut changed = 0;
        for (id, position) in tx.staged.rows.iter_mut() {
            if criteria.matches(*id, position) {
                position.sequence += delta;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn persist_position(
        &self,
        tx: &mut InMemoryTransaction,
        id: RecordId,
        position: Position,
    ) -> Result<()> {
        match tx.staged.rows.get_mut(&id) {
            Some(stored) => {
                *stored = position;
                Ok(())
            }
            None => Err(StoreError::RecordNotFound { id }.into()),
        }
    }

    async fn insert(
        &self,
        tx: &mut InMemoryTransaction,
        id: RecordId,
        position: Position,
    ) -> Result<()> {
        if tx.staged.rows.contains_key(&id) {
            return Err(StoreError::DuplicateRecord { id }.into());
        }
        tx.staged.rows.insert(id, position);
        Ok(())
    }

    async fn delete(&self, tx: &mut InMemoryTransaction, id: RecordId) -> Result<bool> {
        Ok(tx.staged.rows.remove(&id).is_some())
    }

    async fn members(
        &self,
        tx: &mut InMemoryTransaction,
        group: GroupKey,
    ) -> Result<Vec<(RecordId, i64)>> {
        let mut members: Vec<(RecordId, i64)> = tx
            .staged
            .rows
            .iter()
            .filter(|(_, position)| position.group == group)
            .map(|(id, position)| (*id, position.sequence))
            .collect();
        members.sort_by_key(|(id, sequence)| (*sequence, *id));
        Ok(members)
    }

    async fn groups(&self, tx: &mut InMemoryTransaction) -> Result<Vec<GroupKey>> {
        let groups: BTreeSet<GroupKey> = tx
            .staged
            .rows
            .values()
            .map(|position| position.group)
            .collect();
        Ok(groups.into_iter().collect())
    }
}

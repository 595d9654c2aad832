//! Record store implementations for seqtree
//!
//! This module provides the core `RecordStore` trait and the bundled store
//! implementations.
//!
//! The `RecordStore` trait defines the narrow interface the sequencer needs from
//! whatever persists the records: reading a record's position, aggregating the
//! maximum sequence of a group, shifting a range of sequences, and writing a
//! record's own position. This allows the ordering logic (`Sequencer`) to be
//! independent of the specific storage mechanism.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::record::{GroupKey, Position, RecordId};

mod errors;
pub use errors::StoreError;

mod in_memory;
pub use in_memory::{InMemory, InMemoryTransaction};

#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub mod sql;
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub use sql::{DbKind, SqlStore};

/// Comparison applied to the sequence field when selecting records to shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Comparison {
    /// `sequence < operand`
    Lt,
    /// `sequence > operand`
    Gt,
    /// `sequence <= operand`
    Le,
    /// `sequence >= operand`
    Ge,
    /// `sequence <> operand`
    Ne,
    /// `sequence = operand`
    #[default]
    Eq,
}

impl Comparison {
    /// SQL operator for this comparison.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Comparison::Lt => "<",
            Comparison::Gt => ">",
            Comparison::Le => "<=",
            Comparison::Ge => ">=",
            Comparison::Ne => "<>",
            Comparison::Eq => "=",
        }
    }

    /// Evaluate `value <op> operand`.
    pub fn matches(&self, value: i64, operand: i64) -> bool {
        match self {
            Comparison::Lt => value < operand,
            Comparison::Gt => value > operand,
            Comparison::Le => value <= operand,
            Comparison::Ge => value >= operand,
            Comparison::Ne => value != operand,
            Comparison::Eq => value == operand,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Selects the records a [`RecordStore::shift`] applies to.
///
/// A record matches when it is in `group`, its sequence satisfies
/// `comparison` against `sequence`, and it is not `exclude`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftCriteria {
    pub group: GroupKey,
    pub comparison: Comparison,
    pub sequence: i64,
    pub exclude: Option<RecordId>,
}

impl ShiftCriteria {
    pub fn new(group: GroupKey, comparison: Comparison, sequence: i64) -> Self {
        Self {
            group,
            comparison,
            sequence,
            exclude: None,
        }
    }

    /// Leave the record with this id untouched even if it matches.
    pub fn excluding(mut self, id: RecordId) -> Self {
        self.exclude = Some(id);
        self
    }

    /// Whether a stored row matches.
    pub fn matches(&self, id: RecordId, position: &Position) -> bool {
        position.group == self.group
            && self.comparison.matches(position.sequence, self.sequence)
            && self.exclude != Some(id)
    }
}

/// Storage abstraction the [`Sequencer`](crate::Sequencer) runs against.
///
/// Every data operation takes the transaction opened by [`begin`]. All of a
/// move's reads and shifts happen inside that one transaction, and the caller
/// decides whether to [`commit`] or [`rollback`] it. Implementations must
/// isolate concurrent transactions touching the same group, or the gap-free
/// ordering can be lost to interleaved shifts.
///
/// [`begin`]: RecordStore::begin
/// [`commit`]: RecordStore::commit
/// [`rollback`]: RecordStore::rollback
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Transaction scope handed back to every data operation.
    type Transaction: Send;

    /// Open a transaction.
    async fn begin(&self) -> Result<Self::Transaction>;

    /// Make every change in `tx` durable.
    async fn commit(&self, tx: Self::Transaction) -> Result<()>;

    /// Discard every change in `tx`.
    async fn rollback(&self, tx: Self::Transaction) -> Result<()>;

    /// Read a record's stored group and sequence.
    ///
    /// Returns `None` if no row has this id.
    async fn read_position(
        &self,
        tx: &mut Self::Transaction,
        id: RecordId,
    ) -> Result<Option<Position>>;

    /// Largest sequence in `group`, or `None` if the group is empty.
    async fn max_sequence(&self, tx: &mut Self::Transaction, group: GroupKey)
    -> Result<Option<i64>>;

    /// Add `delta` to the sequence of every row matching `criteria`.
    ///
    /// Returns the number of rows changed.
    async fn shift(
        &self,
        tx: &mut Self::Transaction,
        criteria: ShiftCriteria,
        delta: i64,
    ) -> Result<u64>;

    /// Write only the group and sequence fields of an existing row.
    async fn persist_position(
        &self,
        tx: &mut Self::Transaction,
        id: RecordId,
        position: Position,
    ) -> Result<()>;

    /// Insert a new row.
    ///
    /// Fails with [`StoreError::DuplicateRecord`] if the id is taken.
    async fn insert(
        &self,
        tx: &mut Self::Transaction,
        id: RecordId,
        position: Position,
    ) -> Result<()>;

    /// Delete a row, returning whether it existed.
    async fn delete(&self, tx: &mut Self::Transaction, id: RecordId) -> Result<bool>;

    /// Ids and sequences in `group`, ordered by sequence then id.
    async fn members(
        &self,
        tx: &mut Self::Transaction,
        group: GroupKey,
    ) -> Result<Vec<(RecordId, i64)>>;

    /// Every group with at least one member.
    async fn groups(&self, tx: &mut Self::Transaction) -> Result<Vec<GroupKey>>;
}

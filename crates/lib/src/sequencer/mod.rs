//! Gap-free ordering of records within their groups.
//!
//! The [`Sequencer`] owns no records. It is handed caller-owned values through
//! the [`Sequenced`] trait and keeps the sequence column of their siblings
//! consistent by issuing range shifts against a [`RecordStore`].
//!
//! Every move is built from two primitives:
//!
//! - **extraction** closes the gap a record leaves behind: every sibling after
//!   it moves down by one.
//! - **gap insertion** opens a slot at the target: every record at or after the
//!   target moves up by one.
//!
//! Both primitives run inside the transaction passed to each operation. Between
//! them a group is briefly inconsistent, so the caller must commit or roll back
//! the whole transaction rather than keep part of a move.

mod errors;
mod hooks;
mod verify;

pub use errors::SequencerError;

use tracing::{debug, trace};

use crate::Result;
use crate::config::SequencerConfig;
use crate::record::{GroupKey, Node, Position, RecordId, Sequenced};
use crate::store::{Comparison, RecordStore, ShiftCriteria, StoreError};

/// Maintains contiguous, zero-based sequences per group over a record store.
///
/// All operations take the store transaction explicitly:
///
/// ```
/// # use seqtree::{GroupKey, Node, RecordId, Sequencer, store::{InMemory, RecordStore}};
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> seqtree::Result<()> {
/// let sequencer = Sequencer::new(InMemory::new());
/// let mut tx = sequencer.store().begin().await?;
///
/// let mut folder = Node::new(RecordId(1), GroupKey::Root);
/// let mut note = Node::new(RecordId(2), GroupKey::Root);
/// sequencer.create(&mut tx, &mut folder).await?;
/// sequencer.create(&mut tx, &mut note).await?;
///
/// sequencer.append_to(&mut tx, &mut note, &folder).await?;
/// assert_eq!(note.sequence, Some(0));
/// assert_eq!(folder.sequence, Some(0));
///
/// sequencer.store().commit(tx).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Sequencer<S: RecordStore> {
    store: S,
    config: SequencerConfig,
}

impl<S: RecordStore> Sequencer<S> {
    /// Creates a sequencer over `store` with the default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, SequencerConfig::default())
    }

    pub fn with_config(store: S, config: SequencerConfig) -> Self {
        Self { store, config }
    }

    /// The underlying store, for opening and finishing transactions.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Consumes the sequencer, returning the store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Largest sequence in `group`, or `None` if the group is empty.
    pub async fn max_sequence(
        &self,
        tx: &mut S::Transaction,
        group: GroupKey,
    ) -> Result<Option<i64>> {
        self.store.max_sequence(tx, group).await
    }

    /// The sequence a record appended to `group` would receive.
    ///
    /// This is also the number of records in a contiguous group.
    pub async fn new_max_sequence(&self, tx: &mut S::Transaction, group: GroupKey) -> Result<i64> {
        Ok(self
            .max_sequence(tx, group)
            .await?
            .map_or(0, |max| max + 1))
    }

    /// Loads a stored record as a [`Node`].
    pub async fn node(&self, tx: &mut S::Transaction, id: RecordId) -> Result<Node> {
        match self.store.read_position(tx, id).await? {
            Some(position) => Ok(Node::at(id, position)),
            None => Err(StoreError::RecordNotFound { id }.into()),
        }
    }

    /// Reads the record's stored position and copies it onto the record.
    async fn current_position<R: Sequenced>(
        &self,
        tx: &mut S::Transaction,
        record: &mut R,
    ) -> Result<Position> {
        let id = record.record_id();
        let stored = self
            .store
            .read_position(tx, id)
            .await?
            .ok_or(StoreError::RecordNotFound { id })?;

        if record.position() != Some(stored) {
            debug!(
                record = %id,
                stored = %stored,
                "In-memory position was stale, using stored position"
            );
            record.set_position(stored);
        }
        Ok(stored)
    }

    /// Closes the gap `record` leaves in its current group.
    ///
    /// Every other record in the group with a greater sequence moves down by
    /// one. The record's own fields are left untouched. Returns the number of
    /// siblings shifted.
    pub async fn extract<R: Sequenced>(
        &self,
        tx: &mut S::Transaction,
        record: &mut R,
    ) -> Result<u64> {
        let position = self.current_position(tx, record).await?;
        self.extract_at(tx, position, record.record_id()).await
    }

    pub(crate) async fn extract_at(
        &self,
        tx: &mut S::Transaction,
        position: Position,
        exclude: RecordId,
    ) -> Result<u64> {
        let criteria = ShiftCriteria::new(position.group, Comparison::Gt, position.sequence)
            .excluding(exclude);
        let shifted = self.store.shift(tx, criteria, -1).await?;
        trace!(group = %position.group, after = position.sequence, shifted, "Closed gap");
        Ok(shifted)
    }

    /// Opens a slot at `sequence` in `group`.
    ///
    /// Every record in the group at or after `sequence` moves up by one,
    /// except `exclude`. Returns the number of records shifted.
    pub async fn insert_gap_at(
        &self,
        tx: &mut S::Transaction,
        group: GroupKey,
        sequence: i64,
        exclude: Option<RecordId>,
    ) -> Result<u64> {
        let mut criteria = ShiftCriteria::new(group, Comparison::Ge, sequence);
        if let Some(id) = exclude {
            criteria = criteria.excluding(id);
        }
        let shifted = self.store.shift(tx, criteria, 1).await?;
        trace!(group = %group, at = sequence, shifted, "Opened gap");
        Ok(shifted)
    }

    /// Sets the record's position in memory and persists exactly its group
    /// and sequence fields. Siblings are not touched.
    pub async fn reposition<R: Sequenced>(
        &self,
        tx: &mut S::Transaction,
        record: &mut R,
        position: Position,
    ) -> Result<()> {
        record.set_position(position);
        self.store
            .persist_position(tx, record.record_id(), position)
            .await
    }

    /// Moves `record` to an already-resolved `target`.
    ///
    /// `target.sequence` is interpreted after the record has been extracted:
    /// within its own group it must be in `0..=len-1`, in another group in
    /// `0..=len`. Nothing is written if it is out of range.
    pub async fn move_to<R: Sequenced>(
        &self,
        tx: &mut S::Transaction,
        record: &mut R,
        target: Position,
    ) -> Result<()> {
        let id = record.record_id();
        let current = self.current_position(tx, record).await?;

        let dest_len = self.new_max_sequence(tx, target.group).await?;
        let max = if target.group == current.group {
            dest_len - 1
        } else {
            dest_len
        };
        if !(0..=max).contains(&target.sequence) {
            return Err(SequencerError::PositionOutOfRange {
                group: target.group,
                sequence: target.sequence,
                max,
            }
            .into());
        }

        debug!(record = %id, from = %current, to = %target, "Moving record");

        self.extract_at(tx, current, id).await?;
        record.set_position(target);
        self.insert_gap_at(tx, target.group, target.sequence, Some(id))
            .await?;
        self.store.persist_position(tx, id, target).await
    }

    /// Where `record` lands when placed at `reference`'s current slot.
    ///
    /// Within one group, a reference after the record sits one slot earlier
    /// once the record has been extracted, so its sequence is reduced by one.
    pub async fn resolve_target_position<R: Sequenced, Q: Sequenced>(
        &self,
        tx: &mut S::Transaction,
        record: &mut R,
        reference: &mut Q,
    ) -> Result<Position> {
        let current = self.current_position(tx, record).await?;
        let mut target = self.current_position(tx, reference).await?;
        if target.group == current.group && target.sequence > current.sequence {
            target.sequence -= 1;
        }
        Ok(target)
    }

    /// Moves `record` to the front of `parent`'s children.
    pub async fn prepend_to<R: Sequenced, P: Sequenced>(
        &self,
        tx: &mut S::Transaction,
        record: &mut R,
        parent: &P,
    ) -> Result<()> {
        self.prepend_to_group(tx, record, GroupKey::from(parent.record_id()))
            .await
    }

    /// Moves `record` to the end of `parent`'s children.
    pub async fn append_to<R: Sequenced, P: Sequenced>(
        &self,
        tx: &mut S::Transaction,
        record: &mut R,
        parent: &P,
    ) -> Result<()> {
        self.append_to_group(tx, record, GroupKey::from(parent.record_id()))
            .await
    }

    /// Moves `record` to the front of `group`.
    pub async fn prepend_to_group<R: Sequenced>(
        &self,
        tx: &mut S::Transaction,
        record: &mut R,
        group: GroupKey,
    ) -> Result<()> {
        self.move_to(tx, record, Position { group, sequence: 0 })
            .await
    }

    /// Moves `record` to the end of `group`.
    pub async fn append_to_group<R: Sequenced>(
        &self,
        tx: &mut S::Transaction,
        record: &mut R,
        group: GroupKey,
    ) -> Result<()> {
        let current = self.current_position(tx, record).await?;
        let mut sequence = self.new_max_sequence(tx, group).await?;
        if group == current.group {
            sequence -= 1;
        }
        self.move_to(tx, record, Position { group, sequence }).await
    }

    /// Moves `record` into `reference`'s group, directly before it.
    pub async fn insert_before<R: Sequenced, Q: Sequenced>(
        &self,
        tx: &mut S::Transaction,
        record: &mut R,
        reference: &mut Q,
    ) -> Result<()> {
        if record.record_id() == reference.record_id() {
            debug!(record = %record.record_id(), "Record placed relative to itself, nothing to do");
            return Ok(());
        }
        let target = self.resolve_target_position(tx, record, reference).await?;
        self.move_to(tx, record, target).await
    }

    /// Moves `record` into `reference`'s group, directly after it.
    pub async fn insert_after<R: Sequenced, Q: Sequenced>(
        &self,
        tx: &mut S::Transaction,
        record: &mut R,
        reference: &mut Q,
    ) -> Result<()> {
        if record.record_id() == reference.record_id() {
            debug!(record = %record.record_id(), "Record placed relative to itself, nothing to do");
            return Ok(());
        }
        let mut target = self.resolve_target_position(tx, record, reference).await?;
        target.sequence += 1;
        self.move_to(tx, record, target).await
    }

    /// Detaches `record` from the ordering of its group.
    ///
    /// Siblings after it move down by one. The record keeps its stale group
    /// and sequence and is not persisted, so it should be deleted or
    /// repositioned within the same transaction.
    pub async fn remove<R: Sequenced>(&self, tx: &mut S::Transaction, record: &mut R) -> Result<()> {
        debug!(record = %record.record_id(), "Removing record from its group");
        self.extract(tx, record).await?;
        Ok(())
    }
}

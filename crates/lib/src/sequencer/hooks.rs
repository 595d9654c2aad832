//! Lifecycle hooks for the layer that inserts and deletes rows.
//!
//! A persistence layer that owns row creation calls [`on_before_insert`]
//! before writing a new row and one of the delete hooks around removing one.
//! [`create`] and [`delete`] wire the hooks around the store's own row
//! lifecycle for callers without such a layer.
//!
//! [`on_before_insert`]: Sequencer::on_before_insert
//! [`create`]: Sequencer::create
//! [`delete`]: Sequencer::delete

use tracing::debug;

use super::{Sequencer, SequencerError};
use crate::Result;
use crate::config::DeleteTiming;
use crate::record::{Position, Sequenced};
use crate::store::RecordStore;

impl<S: RecordStore> Sequencer<S> {
    /// Prepares a record that is about to be inserted.
    ///
    /// An unset sequence becomes one past the group's current max. A set
    /// sequence must be in `0..=len`; the siblings at and after it move up to
    /// make room. Returns the position the row should be written with.
    pub async fn on_before_insert<R: Sequenced>(
        &self,
        tx: &mut S::Transaction,
        record: &mut R,
    ) -> Result<Position> {
        let group = record.group();
        let len = self.new_max_sequence(tx, group).await?;

        let position = match record.sequence() {
            None => Position {
                group,
                sequence: len,
            },
            Some(sequence) => {
                if !(0..=len).contains(&sequence) {
                    return Err(SequencerError::PositionOutOfRange {
                        group,
                        sequence,
                        max: len,
                    }
                    .into());
                }
                self.insert_gap_at(tx, group, sequence, Some(record.record_id()))
                    .await?;
                Position { group, sequence }
            }
        };

        record.set_position(position);
        debug!(record = %record.record_id(), position = %position, "Prepared record for insert");
        Ok(position)
    }

    /// Closes the gap a record will leave, while its row still exists.
    pub async fn on_before_delete<R: Sequenced>(
        &self,
        tx: &mut S::Transaction,
        record: &mut R,
    ) -> Result<()> {
        self.remove(tx, record).await
    }

    /// Closes the gap a deleted record left.
    ///
    /// The row is already gone, so the record's in-memory position is used
    /// and is not checked against the store. It must be current in this
    /// transaction: a copy loaded before a sibling moved closes the wrong
    /// gap. Reload the record with [`node`] before deleting it if in doubt.
    /// A record that never had a sequence leaves no gap.
    ///
    /// [`node`]: Sequencer::node
    pub async fn on_after_delete<R: Sequenced>(
        &self,
        tx: &mut S::Transaction,
        record: &R,
    ) -> Result<()> {
        let Some(position) = record.position() else {
            debug!(record = %record.record_id(), "Deleted record had no sequence");
            return Ok(());
        };
        debug!(record = %record.record_id(), position = %position, "Closing gap after delete");
        self.extract_at(tx, position, record.record_id()).await?;
        Ok(())
    }

    /// Inserts `record` as a new row, placing it with [`on_before_insert`].
    ///
    /// [`on_before_insert`]: Sequencer::on_before_insert
    pub async fn create<R: Sequenced>(&self, tx: &mut S::Transaction, record: &mut R) -> Result<()> {
        let position = self.on_before_insert(tx, record).await?;
        self.store.insert(tx, record.record_id(), position).await
    }

    /// Deletes `record`'s row and closes the gap it leaves.
    ///
    /// The gap is closed before or after the row is removed according to
    /// [`SequencerConfig::delete_timing`](crate::SequencerConfig::delete_timing).
    /// Either way the record's position is first refreshed from the store.
    pub async fn delete<R: Sequenced>(&self, tx: &mut S::Transaction, record: &mut R) -> Result<()> {
        let id = record.record_id();
        match self.config.delete_timing {
            DeleteTiming::BeforeDelete => {
                self.on_before_delete(tx, record).await?;
                self.store.delete(tx, id).await?;
            }
            DeleteTiming::AfterDelete => {
                self.current_position(tx, record).await?;
                self.store.delete(tx, id).await?;
                self.on_after_delete(tx, record).await?;
            }
        }
        debug!(record = %id, timing = ?self.config.delete_timing, "Deleted record");
        Ok(())
    }
}

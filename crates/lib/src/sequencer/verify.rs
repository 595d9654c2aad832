//! Read-side checks of the ordering.

use super::{Sequencer, SequencerError};
use crate::Result;
use crate::record::{GroupKey, RecordId};
use crate::store::RecordStore;

impl<S: RecordStore> Sequencer<S> {
    /// Ids in `group`, in sequence order.
    pub async fn children(&self, tx: &mut S::Transaction, group: GroupKey) -> Result<Vec<RecordId>> {
        let members = self.store.members(tx, group).await?;
        Ok(members.into_iter().map(|(id, _)| id).collect())
    }

    /// Checks that `group`'s sequences are exactly `0..n`.
    pub async fn verify_group(&self, tx: &mut S::Transaction, group: GroupKey) -> Result<()> {
        let found: Vec<i64> = self
            .store
            .members(tx, group)
            .await?
            .into_iter()
            .map(|(_, sequence)| sequence)
            .collect();

        if !is_contiguous(&found) {
            tracing::warn!(group = %group, found = ?found, "Group is not contiguous");
            return Err(SequencerError::NonContiguous { group, found }.into());
        }
        Ok(())
    }

    /// Runs [`verify_group`](Sequencer::verify_group) over every non-empty group.
    pub async fn verify_all(&self, tx: &mut S::Transaction) -> Result<()> {
        for group in self.store.groups(tx).await? {
            self.verify_group(tx, group).await?;
        }
        Ok(())
    }
}

/// `sorted` must already be in ascending order.
fn is_contiguous(sorted: &[i64]) -> bool {
    sorted
        .iter()
        .enumerate()
        .all(|(index, sequence)| i64::try_from(index).is_ok_and(|index| index == *sequence))
}

//! Ordering integrity check.

use seqtree::{Result, Sequencer, store::RecordStore};

use crate::output::Report;

/// Run the `check` command
pub async fn run<S: RecordStore>(
    sequencer: &Sequencer<S>,
    tx: &mut S::Transaction,
) -> Result<Report> {
    sequencer.verify_all(tx).await?;
    let groups = sequencer.store().groups(tx).await?.len();
    Ok(Report::Checked { groups })
}

//! Group listing command.

use seqtree::{Result, Sequencer, store::RecordStore};

use crate::cli::GroupArgs;
use crate::output::{Member, Report};

/// Run the `list` command
pub async fn run<S: RecordStore>(
    sequencer: &Sequencer<S>,
    tx: &mut S::Transaction,
    args: &GroupArgs,
) -> Result<Report> {
    let group = args.group();
    let members = sequencer
        .store()
        .members(tx, group)
        .await?
        .into_iter()
        .map(|(id, sequence)| Member { id, sequence })
        .collect();
    Ok(Report::Listed { group, members })
}

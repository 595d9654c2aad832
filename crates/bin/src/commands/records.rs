//! Commands that create, move or delete a single record.

use seqtree::{Node, Position, RecordId, Result, Sequencer, store::RecordStore};

use crate::cli::{AddArgs, GroupMoveArgs, RecordArgs, RelativeMoveArgs};
use crate::output::Report;

/// Run the `add` command
pub async fn add<S: RecordStore>(
    sequencer: &Sequencer<S>,
    tx: &mut S::Transaction,
    args: &AddArgs,
) -> Result<Report> {
    let group = args.group.group();
    let mut node = match args.at {
        Some(sequence) => Node::at(RecordId(args.id), Position { group, sequence }),
        None => Node::new(RecordId(args.id), group),
    };
    sequencer.create(tx, &mut node).await?;
    Ok(Report::placed(&node))
}

/// Run the `prepend` command
pub async fn prepend<S: RecordStore>(
    sequencer: &Sequencer<S>,
    tx: &mut S::Transaction,
    args: &GroupMoveArgs,
) -> Result<Report> {
    let mut node = sequencer.node(tx, RecordId(args.id)).await?;
    sequencer
        .prepend_to_group(tx, &mut node, args.group.group())
        .await?;
    Ok(Report::placed(&node))
}

/// Run the `append` command
pub async fn append<S: RecordStore>(
    sequencer: &Sequencer<S>,
    tx: &mut S::Transaction,
    args: &GroupMoveArgs,
) -> Result<Report> {
    let mut node = sequencer.node(tx, RecordId(args.id)).await?;
    sequencer
        .append_to_group(tx, &mut node, args.group.group())
        .await?;
    Ok(Report::placed(&node))
}

/// Run the `before` command
pub async fn before<S: RecordStore>(
    sequencer: &Sequencer<S>,
    tx: &mut S::Transaction,
    args: &RelativeMoveArgs,
) -> Result<Report> {
    let mut node = sequencer.node(tx, RecordId(args.id)).await?;
    let mut reference = sequencer.node(tx, RecordId(args.reference)).await?;
    sequencer
        .insert_before(tx, &mut node, &mut reference)
        .await?;
    Ok(Report::placed(&node))
}

/// Run the `after` command
pub async fn after<S: RecordStore>(
    sequencer: &Sequencer<S>,
    tx: &mut S::Transaction,
    args: &RelativeMoveArgs,
) -> Result<Report> {
    let mut node = sequencer.node(tx, RecordId(args.id)).await?;
    let mut reference = sequencer.node(tx, RecordId(args.reference)).await?;
    sequencer
        .insert_after(tx, &mut node, &mut reference)
        .await?;
    Ok(Report::placed(&node))
}

/// Run the `delete` command
pub async fn delete<S: RecordStore>(
    sequencer: &Sequencer<S>,
    tx: &mut S::Transaction,
    args: &RecordArgs,
) -> Result<Report> {
    let mut node = sequencer.node(tx, RecordId(args.id)).await?;
    sequencer.delete(tx, &mut node).await?;
    Ok(Report::Deleted { id: node.id })
}

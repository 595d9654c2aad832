//! Tests for the insert and delete lifecycle hooks.

use seqtree::{DeleteTiming, GroupKey, Node, Position, RecordId, SequencerConfig};

use crate::helpers::*;

#[tokio::test]
async fn test_create_assigns_next_sequence() {
    let sequencer = test_sequencer().await;
    let mut tx = sequencer.store().begin().await.unwrap();

    let nodes = seed_group(&sequencer, &mut tx, parent(1), &[10, 11, 12]).await;
    let sequences: Vec<_> = nodes.iter().map(|node| node.sequence).collect();
    assert_eq!(sequences, vec![Some(0), Some(1), Some(2)]);

    // Groups are numbered independently.
    let other = seed_group(&sequencer, &mut tx, parent(2), &[20]).await;
    assert_eq!(other[0].sequence, Some(0));
}

#[tokio::test]
async fn test_create_at_explicit_sequence_opens_gap() {
    let sequencer = test_sequencer().await;
    let mut tx = sequencer.store().begin().await.unwrap();

    seed_group(&sequencer, &mut tx, parent(1), &[10, 11, 12]).await;

    let mut middle = Node::at(RecordId(13), Position::new(RecordId(1), 1));
    sequencer.create(&mut tx, &mut middle).await.unwrap();
    assert_eq!(order(&sequencer, &mut tx, parent(1)).await, vec![10, 13, 11, 12]);

    let mut last = Node::at(RecordId(14), Position::new(RecordId(1), 4));
    sequencer.create(&mut tx, &mut last).await.unwrap();
    assert_eq!(
        order(&sequencer, &mut tx, parent(1)).await,
        vec![10, 13, 11, 12, 14]
    );
    sequencer.verify_group(&mut tx, parent(1)).await.unwrap();
}

#[tokio::test]
async fn test_create_rejects_sequence_past_end() {
    let sequencer = test_sequencer().await;
    let mut tx = sequencer.store().begin().await.unwrap();

    seed_group(&sequencer, &mut tx, parent(1), &[10]).await;

    let mut far = Node::at(RecordId(11), Position::new(RecordId(1), 2));
    let err = sequencer.create(&mut tx, &mut far).await.unwrap_err();
    assert!(err.is_position_error());
    assert!(sequencer.node(&mut tx, RecordId(11)).await.unwrap_err().is_not_found());
    assert_eq!(sequences(&sequencer, &mut tx, parent(1)).await, vec![0]);
}

#[tokio::test]
async fn test_create_duplicate_id_fails() {
    let sequencer = test_sequencer().await;
    let mut tx = sequencer.store().begin().await.unwrap();

    seed_group(&sequencer, &mut tx, GroupKey::Root, &[1]).await;
    let mut duplicate = Node::new(RecordId(1), GroupKey::Root);
    let err = sequencer.create(&mut tx, &mut duplicate).await.unwrap_err();
    assert!(err.is_store_error());
    assert!(matches!(
        err,
        seqtree::Error::Store(seqtree::StoreError::DuplicateRecord { .. })
    ));
}

#[tokio::test]
async fn test_on_before_insert_leaves_row_to_caller() {
    let sequencer = test_sequencer().await;
    let mut tx = sequencer.store().begin().await.unwrap();

    seed_group(&sequencer, &mut tx, parent(1), &[10, 11]).await;
    let mut node = Node::new(RecordId(12), parent(1));

    let position = sequencer.on_before_insert(&mut tx, &mut node).await.unwrap();
    assert_eq!(position, Position::new(RecordId(1), 2));
    assert_eq!(node.sequence, Some(2));
    assert_eq!(sequencer.max_sequence(&mut tx, parent(1)).await.unwrap(), Some(1));

    sequencer
        .store()
        .insert(&mut tx, node.id, position)
        .await
        .unwrap();
    assert_eq!(order(&sequencer, &mut tx, parent(1)).await, vec![10, 11, 12]);
}

#[tokio::test]
async fn test_delete_after_closes_gap() {
    let sequencer = test_sequencer().await;
    let mut tx = sequencer.store().begin().await.unwrap();

    let mut nodes = seed_group(&sequencer, &mut tx, parent(1), &[10, 11, 12, 13]).await;
    sequencer.delete(&mut tx, &mut nodes[1]).await.unwrap();

    assert_eq!(order(&sequencer, &mut tx, parent(1)).await, vec![10, 12, 13]);
    assert_eq!(sequences(&sequencer, &mut tx, parent(1)).await, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_delete_before_closes_gap() {
    let config = SequencerConfig::default().with_delete_timing(DeleteTiming::BeforeDelete);
    let sequencer = test_sequencer_with_config(config).await;
    let mut tx = sequencer.store().begin().await.unwrap();

    let mut nodes = seed_group(&sequencer, &mut tx, parent(1), &[10, 11, 12, 13]).await;
    sequencer.delete(&mut tx, &mut nodes[0]).await.unwrap();

    assert_eq!(order(&sequencer, &mut tx, parent(1)).await, vec![11, 12, 13]);
    assert_eq!(sequences(&sequencer, &mut tx, parent(1)).await, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_delete_uses_stored_position() {
    let sequencer = test_sequencer().await;
    let mut tx = sequencer.store().begin().await.unwrap();

    seed_group(&sequencer, &mut tx, parent(1), &[10, 11, 12]).await;
    let mut stale = reload(&sequencer, &mut tx, 12).await;
    let mut first = reload(&sequencer, &mut tx, 10).await;
    sequencer
        .append_to_group(&mut tx, &mut first, parent(1))
        .await
        .unwrap();

    // 12 now sits at 1 while the copy still says 2.
    sequencer.delete(&mut tx, &mut stale).await.unwrap();
    assert_eq!(order(&sequencer, &mut tx, parent(1)).await, vec![11, 10]);
    assert_eq!(sequences(&sequencer, &mut tx, parent(1)).await, vec![0, 1]);
}

#[tokio::test]
async fn test_delete_missing_record_fails() {
    let sequencer = test_sequencer().await;
    let mut tx = sequencer.store().begin().await.unwrap();

    let mut ghost = Node::at(RecordId(5), Position::new(GroupKey::Root, 0));
    let err = sequencer.delete(&mut tx, &mut ghost).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_on_after_delete_with_external_row_removal() {
    let sequencer = test_sequencer().await;
    let mut tx = sequencer.store().begin().await.unwrap();

    let nodes = seed_group(&sequencer, &mut tx, GroupKey::Root, &[1, 2, 3]).await;
    sequencer.store().delete(&mut tx, RecordId(1)).await.unwrap();
    sequencer.on_after_delete(&mut tx, &nodes[0]).await.unwrap();

    assert_eq!(order(&sequencer, &mut tx, GroupKey::Root).await, vec![2, 3]);
    sequencer.verify_all(&mut tx).await.unwrap();

    // A record that was never placed leaves nothing to close.
    let unplaced = Node::new(RecordId(9), GroupKey::Root);
    sequencer.on_after_delete(&mut tx, &unplaced).await.unwrap();
    assert_eq!(sequences(&sequencer, &mut tx, GroupKey::Root).await, vec![0, 1]);
}

#[tokio::test]
async fn test_on_after_delete_uses_reloaded_position() {
    let sequencer = test_sequencer().await;
    let mut tx = sequencer.store().begin().await.unwrap();

    let mut nodes = seed_group(&sequencer, &mut tx, GroupKey::Root, &[1, 2, 3]).await;
    let (head, rest) = nodes.split_at_mut(1);
    sequencer
        .insert_after(&mut tx, &mut head[0], &mut rest[1])
        .await
        .unwrap();
    // The seeded copy of 3 still says sequence 2.
    assert_eq!(rest[1].sequence, Some(2));

    let current = sequencer.node(&mut tx, RecordId(3)).await.unwrap();
    assert_eq!(current.sequence, Some(1));
    sequencer.store().delete(&mut tx, RecordId(3)).await.unwrap();
    sequencer.on_after_delete(&mut tx, &current).await.unwrap();

    assert_eq!(order(&sequencer, &mut tx, GroupKey::Root).await, vec![2, 1]);
    sequencer.verify_all(&mut tx).await.unwrap();
}

#[tokio::test]
async fn test_on_before_delete_with_external_row_removal() {
    let sequencer = test_sequencer().await;
    let mut tx = sequencer.store().begin().await.unwrap();

    let mut nodes = seed_group(&sequencer, &mut tx, GroupKey::Root, &[1, 2, 3]).await;
    sequencer.on_before_delete(&mut tx, &mut nodes[1]).await.unwrap();
    sequencer.store().delete(&mut tx, RecordId(2)).await.unwrap();

    assert_eq!(order(&sequencer, &mut tx, GroupKey::Root).await, vec![1, 3]);
    sequencer.verify_all(&mut tx).await.unwrap();
}

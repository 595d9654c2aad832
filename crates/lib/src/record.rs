//! Record identity and position types.
//!
//! Records are owned by the caller. The sequencer only sees them through the
//! [`Sequenced`] trait, reading their key, group and sequence and writing back
//! new positions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Primary key of a sequenced record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        RecordId(id)
    }
}

/// Identifies the group a record is ordered within.
///
/// Records without a parent all belong to [`GroupKey::Root`], which stores as
/// `NULL` in SQL backends.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(from = "Option<RecordId>", into = "Option<RecordId>")]
pub enum GroupKey {
    /// Top-level records with no parent.
    #[default]
    Root,
    /// Children of the record with this primary key.
    Parent(RecordId),
}

impl GroupKey {
    /// The parent id, or `None` for the root group.
    pub fn parent(&self) -> Option<RecordId> {
        match self {
            GroupKey::Root => None,
            GroupKey::Parent(id) => Some(*id),
        }
    }

    /// Raw column value for storage backends.
    pub(crate) fn as_column(&self) -> Option<i64> {
        self.parent().map(|id| id.0)
    }
}

impl From<RecordId> for GroupKey {
    fn from(id: RecordId) -> Self {
        GroupKey::Parent(id)
    }
}

impl From<Option<RecordId>> for GroupKey {
    fn from(parent: Option<RecordId>) -> Self {
        parent.map_or(GroupKey::Root, GroupKey::Parent)
    }
}

impl From<GroupKey> for Option<RecordId> {
    fn from(group: GroupKey) -> Self {
        group.parent()
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Root => write!(f, "root"),
            GroupKey::Parent(id) => write!(f, "{id}"),
        }
    }
}

/// A record's place: its group and zero-based sequence within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub group: GroupKey,
    pub sequence: i64,
}

impl Position {
    pub fn new(group: impl Into<GroupKey>, sequence: i64) -> Self {
        Self {
            group: group.into(),
            sequence,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.sequence)
    }
}

/// A record that can be ordered by the [`Sequencer`](crate::Sequencer).
///
/// Implement this for your own entity types. The sequencer reads the key,
/// group and sequence through it and writes moves back with [`set_position`].
///
/// [`set_position`]: Sequenced::set_position
pub trait Sequenced {
    /// Primary key. Also the [`GroupKey`] of this record's children.
    fn record_id(&self) -> RecordId;

    /// The group this record is ordered within.
    fn group(&self) -> GroupKey;

    /// Position within the group, or `None` before one has been assigned.
    fn sequence(&self) -> Option<i64>;

    /// Overwrite the in-memory group and sequence.
    fn set_position(&mut self, position: Position);

    /// Group and sequence together, if the sequence is set.
    fn position(&self) -> Option<Position> {
        self.sequence().map(|sequence| Position {
            group: self.group(),
            sequence,
        })
    }
}

/// A minimal record carrying only the fields the sequencer needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: RecordId,
    pub group: GroupKey,
    pub sequence: Option<i64>,
}

impl Node {
    /// A new record in `group` with its sequence still unset.
    pub fn new(id: RecordId, group: impl Into<GroupKey>) -> Self {
        Self {
            id,
            group: group.into(),
            sequence: None,
        }
    }

    /// A record already placed at `position`.
    pub fn at(id: RecordId, position: Position) -> Self {
        Self {
            id,
            group: position.group,
            sequence: Some(position.sequence),
        }
    }
}

impl Sequenced for Node {
    fn record_id(&self) -> RecordId {
        self.id
    }

    fn group(&self) -> GroupKey {
        self.group
    }

    fn sequence(&self) -> Option<i64> {
        self.sequence
    }

    fn set_position(&mut self, position: Position) {
        self.group = position.group;
        self.sequence = Some(position.sequence);
    }
}

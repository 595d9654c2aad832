//! Error types for sequencer operations.

use thiserror::Error;

use crate::record::GroupKey;

/// Errors raised by the ordering logic itself, as opposed to the store.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SequencerError {
    /// An explicit target sequence lies outside the destination group.
    #[error("Sequence {sequence} is out of range for group {group} (allowed 0..={max})")]
    PositionOutOfRange {
        group: GroupKey,
        sequence: i64,
        max: i64,
    },

    /// A group's sequences are not exactly `0..n`.
    #[error("Group {group} is not contiguous: found sequences {found:?}")]
    NonContiguous { group: GroupKey, found: Vec<i64> },
}

impl SequencerError {
    /// Check if this error was caused by an invalid target position.
    pub fn is_position_error(&self) -> bool {
        matches!(self, SequencerError::PositionOutOfRange { .. })
    }

    /// Check if this error indicates the stored ordering is broken.
    pub fn is_integrity_error(&self) -> bool {
        matches!(self, SequencerError::NonContiguous { .. })
    }

    /// The group this error refers to.
    pub fn group(&self) -> GroupKey {
        match self {
            SequencerError::PositionOutOfRange { group, .. }
            | SequencerError::NonContiguous { group, .. } => *group,
        }
    }
}

// Conversion from SequencerError to the main Error type
impl From<SequencerError> for crate::Error {
    fn from(err: SequencerError) -> Self {
        crate::Error::Sequencer(err)
    }
}

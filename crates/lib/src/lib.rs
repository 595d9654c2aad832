//!
//! seqtree: gap-free sibling ordering for grouped records.
//! This library keeps every group of records numbered `0..n` while records are
//! created, moved between groups, reordered and deleted.
//!
//! ## Core Concepts
//!
//! * **Records (`record::Sequenced`)**: Any caller-owned type with a primary key, a group key and a sequence.
//! * **Groups (`record::GroupKey`)**: The implicit set of records sharing a parent. Ordering is scoped per group.
//! * **Stores (`store::RecordStore`)**: A pluggable storage layer that reads positions and applies range shifts
//!   inside an explicit transaction:
//!     * **InMemory (`store::InMemory`)**: A serialized in-process table with optional JSON persistence.
//!     * **SqlStore (`store::SqlStore`)**: A sqlx-backed table on SQLite or PostgreSQL (requires the "sqlite" or
//!       "postgres" feature).
//! * **Sequencer (`sequencer::Sequencer`)**: The service that composes extraction and gap insertion into
//!   `prepend_to`, `append_to`, `insert_before`, `insert_after` and `remove`, plus the lifecycle hooks
//!   the embedding persistence layer calls on create and delete.
//!
//! ## Example
//!
//! ```
//! use seqtree::{GroupKey, Node, RecordId, Sequencer, store::{InMemory, RecordStore}};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> seqtree::Result<()> {
//! let sequencer = Sequencer::new(InMemory::new());
//! let mut tx = sequencer.store().begin().await?;
//!
//! let mut first = Node::new(RecordId(1), GroupKey::Root);
//! let mut second = Node::new(RecordId(2), GroupKey::Root);
//! sequencer.create(&mut tx, &mut first).await?;
//! sequencer.create(&mut tx, &mut second).await?;
//!
//! sequencer.prepend_to_group(&mut tx, &mut second, GroupKey::Root).await?;
//! assert_eq!(
//!     sequencer.children(&mut tx, GroupKey::Root).await?,
//!     vec![RecordId(2), RecordId(1)]
//! );
//!
//! sequencer.store().commit(tx).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod record;
pub mod sequencer;
pub mod store;

pub use config::{DeleteTiming, SequencerConfig};
pub use record::{GroupKey, Node, Position, RecordId, Sequenced};
pub use sequencer::{Sequencer, SequencerError};
pub use store::StoreError;

/// Result type used throughout the seqtree library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the seqtree library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured store errors from the store module
    #[error(transparent)]
    Store(store::StoreError),

    /// Structured ordering errors from the sequencer module
    #[error(transparent)]
    Sequencer(sequencer::SequencerError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Store(_) => "store",
            Error::Sequencer(_) => "sequencer",
        }
    }

    /// Check if this error indicates a record was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_not_found(),
            Error::Sequencer(_) => false,
        }
    }

    /// Check if this error came from the underlying store.
    pub fn is_store_error(&self) -> bool {
        matches!(self, Error::Store(_))
    }

    /// Check if this error indicates a broken or unreachable ordering.
    pub fn is_integrity_error(&self) -> bool {
        match self {
            Error::Sequencer(seq_err) => seq_err.is_integrity_error(),
            Error::Store(_) => false,
        }
    }

    /// Check if this error was caused by an invalid target position.
    pub fn is_position_error(&self) -> bool {
        match self {
            Error::Sequencer(seq_err) => seq_err.is_position_error(),
            Error::Store(_) => false,
        }
    }
}

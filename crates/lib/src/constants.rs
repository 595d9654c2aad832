//! Constants used throughout the seqtree library.
//!
//! This module provides central definitions for the default schema identifiers
//! used when no explicit [`SequencerConfig`](crate::config::SequencerConfig) is given.

/// Default table holding sequenced records.
pub const DEFAULT_TABLE: &str = "nodes";

/// Default primary key field.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Default group (parent) key field.
pub const DEFAULT_GROUP_FIELD: &str = "parentId";

/// Default sequence field.
pub const DEFAULT_SEQUENCE_FIELD: &str = "sequence";

/// Table used by SQL stores to track their schema version.
pub const SCHEMA_VERSION_TABLE: &str = "seqtree_schema_version";

//! CLI argument definitions for the seqtree binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use seqtree::{GroupKey, RecordId};

/// Storage backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// SQLite database (default)
    Sqlite,
    /// In-memory with JSON persistence
    Inmemory,
}

/// Keep grouped records in gap-free order
#[derive(Parser, Debug)]
#[command(name = "seqtree")]
#[command(about = "seqtree: gap-free sibling ordering for grouped records")]
#[command(version)]
pub struct Cli {
    /// Storage backend to use
    #[arg(short, long, global = true, default_value = "sqlite", env = "SEQTREE_BACKEND")]
    pub backend: Backend,

    /// Database file.
    /// For SQLite: defaults to seqtree.db
    /// For InMemory: defaults to seqtree.json
    #[arg(short = 'd', long, global = true, env = "SEQTREE_DATABASE")]
    pub database: Option<PathBuf>,

    /// JSON file overriding the table and field names
    #[arg(short, long, global = true, env = "SEQTREE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// The database path, falling back to the backend's default file name.
    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(|| {
            PathBuf::from(match self.backend {
                Backend::Sqlite => "seqtree.db",
                Backend::Inmemory => "seqtree.json",
            })
        })
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Create a record, at the end of its group unless --at is given
    Add(AddArgs),
    /// Move a record to the front of a group
    Prepend(GroupMoveArgs),
    /// Move a record to the end of a group
    Append(GroupMoveArgs),
    /// Move a record directly before another
    Before(RelativeMoveArgs),
    /// Move a record directly after another
    After(RelativeMoveArgs),
    /// Delete a record and close the gap it leaves
    Delete(RecordArgs),
    /// List a group's records in order
    List(GroupArgs),
    /// Verify every group is numbered 0..n
    Check,
}

/// Selects a group: a parent id, or the root group when omitted.
#[derive(clap::Args, Debug, Clone)]
pub struct GroupArgs {
    /// Parent record id (omit for the root group)
    #[arg(short, long)]
    pub parent: Option<i64>,
}

impl GroupArgs {
    pub fn group(&self) -> GroupKey {
        GroupKey::from(self.parent.map(RecordId))
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct AddArgs {
    /// Id of the new record
    pub id: i64,

    #[command(flatten)]
    pub group: GroupArgs,

    /// Sequence to insert at, shifting later siblings
    #[arg(long)]
    pub at: Option<i64>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct GroupMoveArgs {
    /// Record to move
    pub id: i64,

    #[command(flatten)]
    pub group: GroupArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct RelativeMoveArgs {
    /// Record to move
    pub id: i64,

    /// Record to place it next to
    pub reference: i64,
}

#[derive(clap::Args, Debug, Clone)]
pub struct RecordArgs {
    /// Record id
    pub id: i64,
}

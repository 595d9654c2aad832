//! SQL-based record store implementations.
//!
//! This module provides a SQL record store implementing the `RecordStore`
//! trait, keeping sequenced records in a relational table.
//!
//! ## Available Databases
//!
//! - **SQLite** (feature: `sqlite`): Embedded database
//! - **PostgreSQL** (feature: `postgres`): PostgreSQL database
//!
//! ## Architecture
//!
//! The SQL store uses sqlx with `AnyPool` for multi-database support. Each
//! `RecordStore` transaction is a `sqlx::Transaction` on the pool, and every
//! shift is a single `UPDATE ... SET sequence = sequence + delta` statement.
//!
//! Table, id, group and sequence names come from [`SequencerConfig`]. They are
//! validated as plain identifiers and always emitted double-quoted.
//!
//! ## Schema
//!
//! The table is created on connect if missing. See [`schema`].

mod queries;

/// Schema definition and version tracking.
pub mod schema;

use async_trait::async_trait;
use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;

use crate::Result;
use crate::config::SequencerConfig;
use crate::record::{GroupKey, Position, RecordId};
use crate::store::{RecordStore, ShiftCriteria, StoreError};

#[cfg(feature = "postgres")]
use sqlx::Executor;
#[cfg(feature = "postgres")]
use std::time::Duration;

/// Extension trait for sqlx Result types to simplify error handling.
///
/// Similar to `anyhow::Context`, this trait adds a method to convert
/// sqlx errors to `StoreError::SqlxError` with a context message.
pub(crate) trait SqlxResultExt<T> {
    /// Convert sqlx error to StoreError with context message.
    fn sql_context(self, context: &str) -> Result<T>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn sql_context(self, context: &str) -> Result<T> {
        self.map_err(|e| {
            StoreError::SqlxError {
                reason: format!("{context}: {e}"),
                source: Some(e),
            }
            .into()
        })
    }
}

/// Database kind for SQL dialect selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    /// SQLite database
    Sqlite,
    /// PostgreSQL database
    Postgres,
}

/// SQL-based record store using sqlx.
///
/// Supports both SQLite and PostgreSQL through sqlx's `AnyPool`.
///
/// # Isolation
///
/// Moves read a group and then shift it, so two concurrent transactions on
/// the same group must not interleave. On SQLite [`begin`] takes the database
/// write lock before anything is read, and a second transaction waits in
/// `begin` for up to the busy timeout (5s). On PostgreSQL run at
/// `SERIALIZABLE` or lock the group's rows when several writers share a group.
///
/// [`begin`]: RecordStore::begin
pub struct SqlStore {
    pool: AnyPool,
    kind: DbKind,
    config: SequencerConfig,
}

impl SqlStore {
    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// The configuration naming the table and its fields.
    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Check if this store is using SQLite.
    pub fn is_sqlite(&self) -> bool {
        self.kind == DbKind::Sqlite
    }

    async fn finish(pool: AnyPool, kind: DbKind, config: SequencerConfig) -> Result<Self> {
        let store = Self { pool, kind, config };
        schema::initialize(&store).await?;
        tracing::info!(
            kind = ?store.kind,
            table = %store.config.table,
            "SQL record store ready"
        );
        Ok(store)
    }
}

// SQLite-specific implementations
#[cfg(feature = "sqlite")]
impl SqlStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the database file and table if they don't exist.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use seqtree::{SequencerConfig, store::SqlStore};
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let store = SqlStore::open_sqlite("nodes.db", SequencerConfig::default()).await.unwrap();
    /// }
    /// ```
    pub async fn open_sqlite<P: AsRef<std::path::Path>>(
        path: P,
        config: SequencerConfig,
    ) -> Result<Self> {
        // mode=rwc: read-write-create (create file if it doesn't exist)
        let url = format!("sqlite:{}?mode=rwc", path.as_ref().display());
        Self::connect_sqlite(&url, config).await
    }

    /// Connect to a SQLite database using a connection URL.
    ///
    /// # Arguments
    ///
    /// * `url` - SQLite connection URL (e.g., "sqlite:./nodes.db")
    /// * `config` - Table and field names
    pub async fn connect_sqlite(url: &str, config: SequencerConfig) -> Result<Self> {
        config.validate()?;

        // Install any driver support
        sqlx::any::install_default_drivers();

        let is_in_memory = url.contains("mode=memory");

        // An in-memory SQLite database is destroyed when its last connection
        // closes, so keep one connection alive for the pool's lifetime.
        let pool = if is_in_memory {
            AnyPoolOptions::new()
                .max_connections(5)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(url)
                .await
                .sql_context("Failed to connect to SQLite")?
        } else {
            AnyPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .sql_context("Failed to connect to SQLite")?
        };

        if is_in_memory {
            sqlx::query("PRAGMA busy_timeout = 5000;")
                .execute(&pool)
                .await
                .sql_context("Failed to configure SQLite")?;
        } else {
            // File-based SQLite:
            // - journal_mode=WAL: Write-Ahead Logging for better concurrency
            // - synchronous=NORMAL: Balanced durability (safe with WAL)
            // - busy_timeout=5000: Wait up to 5s for locks before failing
            sqlx::query(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;",
            )
            .execute(&pool)
            .await
            .sql_context("Failed to configure SQLite")?;
        }

        Self::finish(pool, DbKind::Sqlite, config).await
    }

    /// Create an in-memory SQLite database.
    ///
    /// The database exists only for the lifetime of this store. Useful for testing.
    pub async fn sqlite_in_memory(config: SequencerConfig) -> Result<Self> {
        // Shared cache lets every pooled connection see the same database.
        // The unique name keeps separate stores (e.g. parallel tests) apart.
        let unique_id = uuid::Uuid::new_v4();
        let url = format!("sqlite:file:mem_{unique_id}?mode=memory&cache=shared");
        Self::connect_sqlite(&url, config).await
    }
}

// PostgreSQL-specific implementations
#[cfg(feature = "postgres")]
impl SqlStore {
    /// Connect to a PostgreSQL database using a connection URL.
    ///
    /// This connects to the default (public) schema. For test isolation,
    /// use `connect_postgres_isolated()` instead.
    pub async fn connect_postgres(url: &str, config: SequencerConfig) -> Result<Self> {
        Self::connect_postgres_with_schema(url, None, config).await
    }

    /// Connect to a PostgreSQL database with test isolation.
    ///
    /// Creates a unique schema for this store so parallel tests don't
    /// interfere with each other.
    pub async fn connect_postgres_isolated(url: &str, config: SequencerConfig) -> Result<Self> {
        // PostgreSQL schema names must start with a letter and be lowercase
        let unique_id = uuid::Uuid::new_v4().simple().to_string();
        let schema_name = format!("test_{unique_id}");
        Self::connect_postgres_with_schema(url, Some(schema_name), config).await
    }

    async fn connect_postgres_with_schema(
        url: &str,
        schema_name: Option<String>,
        config: SequencerConfig,
    ) -> Result<Self> {
        config.validate()?;

        // Install any driver support
        sqlx::any::install_default_drivers();

        if let Some(ref schema) = schema_name {
            let temp_pool = AnyPoolOptions::new()
                .max_connections(1)
                .connect(url)
                .await
                .sql_context("Failed to connect to PostgreSQL")?;

            let create_schema = format!("CREATE SCHEMA IF NOT EXISTS {schema}");
            sqlx::query(&create_schema)
                .execute(&temp_pool)
                .await
                .sql_context(&format!("Failed to create schema {schema}"))?;

            temp_pool.close().await;
        }

        let schema_for_hook = schema_name.clone();
        let mut pool_options = AnyPoolOptions::new();
        if schema_name.is_some() {
            // Test isolation: keep the pool small so many parallel tests
            // don't exhaust PostgreSQL's max_connections
            pool_options = pool_options
                .max_connections(2)
                .acquire_timeout(Duration::from_secs(30));
        } else {
            pool_options = pool_options.max_connections(5);
        }

        let pool = pool_options
            .after_connect(move |conn, _meta| {
                let schema = schema_for_hook.clone();
                Box::pin(async move {
                    if let Some(ref s) = schema {
                        let set_path = format!("SET search_path TO {s}");
                        conn.execute(set_path.as_str()).await?;
                    }
                    Ok(())
                })
            })
            .connect(url)
            .await
            .sql_context("Failed to connect to PostgreSQL")?;

        Self::finish(pool, DbKind::Postgres, config).await
    }
}

#[async_trait]
impl RecordStore for SqlStore {
    type Transaction = sqlx::Transaction<'static, sqlx::Any>;

    async fn begin(&self) -> Result<Self::Transaction> {
        let mut tx = self
            .pool
            .begin()
            .await
            .sql_context("Failed to begin transaction")?;
        if self.is_sqlite() {
            queries::reserve(self, &mut tx).await?;
        }
        Ok(tx)
    }

    async fn commit(&self, tx: Self::Transaction) -> Result<()> {
        tx.commit()
            .await
            .sql_context("Failed to commit transaction")
    }

    async fn rollback(&self, tx: Self::Transaction) -> Result<()> {
        tx.rollback()
            .await
            .sql_context("Failed to roll back transaction")
    }

    async fn read_position(
        &self,
        tx: &mut Self::Transaction,
        id: RecordId,
    ) -> Result<Option<Position>> {
        queries::read_position(self, tx, id).await
    }

    async fn max_sequence(&self, tx: &mut Self::Transaction, group: GroupKey) -> Result<Option<i64>> {
        queries::max_sequence(self, tx, group).await
    }

    async fn shift(
        &self,
        tx: &mut Self::Transaction,
        criteria: ShiftCriteria,
        delta: i64,
    ) -> Result<u64> {
        queries::shift(self, tx, criteria, delta).await
    }

    async fn persist_position(
        &self,
        tx: &mut Self::Transaction,
        id: RecordId,
        position: Position,
    ) -> Result<()> {
        queries::persist_position(self, tx, id, position).await
    }

    async fn insert(
        &self,
        tx: &mut Self::Transaction,
        id: RecordId,
        position: Position,
    ) -> Result<()> {
        queries::insert(self, tx, id, position).await
    }

    async fn delete(&self, tx: &mut Self::Transaction, id: RecordId) -> Result<bool> {
        queries::delete(self, tx, id).await
    }

    async fn members(
        &self,
        tx: &mut Self::Transaction,
        group: GroupKey,
    ) -> Result<Vec<(RecordId, i64)>> {
        queries::members(self, tx, group).await
    }

    async fn groups(&self, tx: &mut Self::Transaction) -> Result<Vec<GroupKey>> {
        queries::groups(self, tx).await
    }
}

#[cfg(feature = "sqlite")]
/// Convenience type alias for a SQLite-backed store.
pub type Sqlite = SqlStore;

#[cfg(feature = "postgres")]
/// Convenience type alias for a PostgreSQL-backed store.
pub type Postgres = SqlStore;

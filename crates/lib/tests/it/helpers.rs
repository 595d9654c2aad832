use async_trait::async_trait;
use seqtree::{
    GroupKey, Node, Position, RecordId, Result, Sequencer, SequencerConfig,
    store::{InMemory, InMemoryTransaction, ShiftCriteria},
};

// Re-exported so test modules can call store and record trait methods
pub use seqtree::Sequenced;
pub use seqtree::store::RecordStore;

#[cfg(any(feature = "sqlite", feature = "postgres"))]
use seqtree::store::SqlStore;

// ==========================
// BACKEND SELECTION
// ==========================
// A single point of change for backend matrix testing via TEST_BACKEND.

/// A store chosen at runtime, so every test body is written once.
pub enum TestStore {
    InMemory(InMemory),
    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    Sql(SqlStore),
}

pub enum TestTransaction {
    InMemory(InMemoryTransaction),
    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    Sql(<SqlStore as RecordStore>::Transaction),
}

/// Creates a test store based on TEST_BACKEND env var.
///
/// Supported values:
/// - "inmemory" or unset: InMemory store (default)
/// - "sqlite": SQLite in-memory store (requires `sqlite` feature)
/// - "postgres": PostgreSQL store in a fresh schema (requires `postgres` feature
///   and TEST_POSTGRES_URL)
///
/// # Example
/// ```bash
/// # Run tests with InMemory (default)
/// cargo test
///
/// # Run tests with SQLite
/// TEST_BACKEND=sqlite cargo test --features sqlite
///
/// # Run tests with PostgreSQL
/// TEST_BACKEND=postgres TEST_POSTGRES_URL="postgres://localhost/seqtree_test" \
///   cargo test --features postgres
/// ```
pub async fn test_store() -> TestStore {
    test_store_with_config(SequencerConfig::default()).await
}

pub async fn test_store_with_config(config: SequencerConfig) -> TestStore {
    match std::env::var("TEST_BACKEND").as_deref() {
        Ok("sqlite") => {
            #[cfg(feature = "sqlite")]
            {
                use seqtree::store::sql::Sqlite;
                TestStore::Sql(
                    Sqlite::sqlite_in_memory(config)
                        .await
                        .expect("Failed to create SQLite store"),
                )
            }
            #[cfg(not(feature = "sqlite"))]
            {
                let _ = config;
                panic!("TEST_BACKEND=sqlite requires the 'sqlite' feature to be enabled")
            }
        }
        Ok("postgres") => {
            #[cfg(feature = "postgres")]
            {
                use seqtree::store::sql::Postgres;
                let url = std::env::var("TEST_POSTGRES_URL")
                    .unwrap_or_else(|_| "postgres://localhost/seqtree_test".to_string());
                TestStore::Sql(
                    Postgres::connect_postgres_isolated(&url, config)
                        .await
                        .expect("Failed to connect to PostgreSQL"),
                )
            }
            #[cfg(not(feature = "postgres"))]
            {
                let _ = config;
                panic!("TEST_BACKEND=postgres requires the 'postgres' feature to be enabled")
            }
        }
        Ok("inmemory") | Ok("") | Err(_) => TestStore::InMemory(InMemory::with_config(config)),
        Ok(other) => {
            panic!("Unknown TEST_BACKEND value: {other}. Supported: inmemory, sqlite, postgres")
        }
    }
}

pub async fn test_sequencer() -> Sequencer<TestStore> {
    Sequencer::new(test_store().await)
}

pub async fn test_sequencer_with_config(config: SequencerConfig) -> Sequencer<TestStore> {
    Sequencer::with_config(test_store_with_config(config.clone()).await, config)
}

macro_rules! mismatched {
    () => {
        unreachable!("transaction opened on a different backend")
    };
}

#[async_trait]
impl RecordStore for TestStore {
    type Transaction = TestTransaction;

    async fn begin(&self) -> Result<TestTransaction> {
        match self {
            TestStore::InMemory(store) => Ok(TestTransaction::InMemory(store.begin().await?)),
            #[cfg(any(feature = "sqlite", feature = "postgres"))]
            TestStore::Sql(store) => Ok(TestTransaction::Sql(store.begin().await?)),
        }
    }

    async fn commit(&self, tx: TestTransaction) -> Result<()> {
        match (self, tx) {
            (TestStore::InMemory(store), TestTransaction::InMemory(tx)) => store.commit(tx).await,
            #[cfg(any(feature = "sqlite", feature = "postgres"))]
            (TestStore::Sql(store), TestTransaction::Sql(tx)) => store.commit(tx).await,
            #[allow(unreachable_patterns)]
            _ => mismatched!(),
        }
    }

    async fn rollback(&self, tx: TestTransaction) -> Result<()> {
        match (self, tx) {
            (TestStore::InMemory(store), TestTransaction::InMemory(tx)) => {
                store.rollback(tx).await
            }
            #[cfg(any(feature = "sqlite", feature = "postgres"))]
            (TestStore::Sql(store), TestTransaction::Sql(tx)) => store.rollback(tx).await,
            #[allow(unreachable_patterns)]
            _ => mismatched!(),
        }
    }

    async fn read_position(
        &self,
        tx: &mut TestTransaction,
        id: RecordId,
    ) -> Result<Option<Position>> {
        match (self, tx) {
            (TestStore::InMemory(store), TestTransaction::InMemory(tx)) => {
                store.read_position(tx, id).await
            }
            #[cfg(any(feature = "sqlite", feature = "postgres"))]
            (TestStore::Sql(store), TestTransaction::Sql(tx)) => {
                store.read_position(tx, id).await
            }
            #[allow(unreachable_patterns)]
            _ => mismatched!(),
        }
    }

    async fn max_sequence(&self, tx: &mut TestTransaction, group: GroupKey) -> Result<Option<i64>> {
        match (self, tx) {
            (TestStore::InMemory(store), TestTransaction::InMemory(tx)) => {
                store.max_sequence(tx, group).await
            }
            #[cfg(any(feature = "sqlite", feature = "postgres"))]
            (TestStore::Sql(store), TestTransaction::Sql(tx)) => {
                store.max_sequence(tx, group).await
            }
            #[allow(unreachable_patterns)]
            _ => mismatched!(),
        }
    }

    async fn shift(
        &self,
        tx: &mut TestTransaction,
        criteria: ShiftCriteria,
        delta: i64,
    ) -> Result<u64> {
        match (self, tx) {
            (TestStore::InMemory(store), TestTransaction::InMemory(tx)) => {
                store.shift(tx, criteria, delta).await
            }
            #[cfg(any(feature = "sqlite", feature = "postgres"))]
            (TestStore::Sql(store), TestTransaction::Sql(tx)) => {
                store.shift(tx, criteria, delta).await
            }
            #[allow(unreachable_patterns)]
            _ => mismatched!(),
        }
    }

    async fn persist_position(
        &self,
        tx: &mut TestTransaction,
        id: RecordId,
        position: Position,
    ) -> Result<()> {
        match (self, tx) {
            (TestStore::InMemory(store), TestTransaction::InMemory(tx)) => {
                store.persist_position(tx, id, position).await
            }
            #[cfg(any(feature = "sqlite", feature = "postgres"))]
            (TestStore::Sql(store), TestTransaction::Sql(tx)) => {
                store.persist_position(tx, id, position).await
            }
            #[allow(unreachable_patterns)]
            _ => mismatched!(),
        }
    }

    async fn insert(&self, tx: &mut TestTransaction, id: RecordId, position: Position) -> Result<()> {
        match (self, tx) {
            (TestStore::InMemory(store), TestTransaction::InMemory(tx)) => {
                store.insert(tx, id, position).await
            }
            #[cfg(any(feature = "sqlite", feature = "postgres"))]
            (TestStore::Sql(store), TestTransaction::Sql(tx)) => {
                store.insert(tx, id, position).await
            }
            #[allow(unreachable_patterns)]
            _ => mismatched!(),
        }
    }

    async fn delete(&self, tx: &mut TestTransaction, id: RecordId) -> Result<bool> {
        match (self, tx) {
            (TestStore::InMemory(store), TestTransaction::InMemory(tx)) => {
                store.delete(tx, id).await
            }
            #[cfg(any(feature = "sqlite", feature = "postgres"))]
            (TestStore::Sql(store), TestTransaction::Sql(tx)) => store.delete(tx, id).await,
            #[allow(unreachable_patterns)]
            _ => mismatched!(),
        }
    }

    async fn members(
        &self,
        tx: &mut TestTransaction,
        group: GroupKey,
    ) -> Result<Vec<(RecordId, i64)>> {
        match (self, tx) {
            (TestStore::InMemory(store), TestTransaction::InMemory(tx)) => {
                store.members(tx, group).await
            }
            #[cfg(any(feature = "sqlite", feature = "postgres"))]
            (TestStore::Sql(store), TestTransaction::Sql(tx)) => {
                store.members(tx, group).await
            }
            #[allow(unreachable_patterns)]
            _ => mismatched!(),
        }
    }

    async fn groups(&self, tx: &mut TestTransaction) -> Result<Vec<GroupKey>> {
        match (self, tx) {
            (TestStore::InMemory(store), TestTransaction::InMemory(tx)) => store.groups(tx).await,
            #[cfg(any(feature = "sqlite", feature = "postgres"))]
            (TestStore::Sql(store), TestTransaction::Sql(tx)) => store.groups(tx).await,
            #[allow(unreachable_patterns)]
            _ => mismatched!(),
        }
    }
}

// ==========================
// FIXTURES
// ==========================

/// Creates one record per id at the end of `group`, in order.
pub async fn seed_group(
    sequencer: &Sequencer<TestStore>,
    tx: &mut TestTransaction,
    group: GroupKey,
    ids: &[i64],
) -> Vec<Node> {
    let mut nodes = Vec::with_capacity(ids.len());
    for &id in ids {
        let mut node = Node::new(RecordId(id), group);
        sequencer
            .create(tx, &mut node)
            .await
            .expect("Failed to create record");
        nodes.push(node);
    }
    nodes
}

/// Raw ids in `group`, in sequence order.
pub async fn order(
    sequencer: &Sequencer<TestStore>,
    tx: &mut TestTransaction,
    group: GroupKey,
) -> Vec<i64> {
    sequencer
        .children(tx, group)
        .await
        .expect("Failed to list children")
        .into_iter()
        .map(|id| id.0)
        .collect()
}

/// Sequences in `group`, ascending.
pub async fn sequences(
    sequencer: &Sequencer<TestStore>,
    tx: &mut TestTransaction,
    group: GroupKey,
) -> Vec<i64> {
    sequencer
        .store()
        .members(tx, group)
        .await
        .expect("Failed to list members")
        .into_iter()
        .map(|(_, sequence)| sequence)
        .collect()
}

/// Fresh copy of a stored record.
pub async fn reload(sequencer: &Sequencer<TestStore>, tx: &mut TestTransaction, id: i64) -> Node {
    sequencer
        .node(tx, RecordId(id))
        .await
        .expect("Failed to load record")
}

pub fn parent(id: i64) -> GroupKey {
    GroupKey::Parent(RecordId(id))
}

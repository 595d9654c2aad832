//! SQL schema definitions and version tracking.
//!
//! The record table is built from the configured identifiers and is designed
//! to be portable between SQLite and PostgreSQL.
//!
//! There is no `UNIQUE (group, sequence)` constraint. Sequences within a group
//! may collide until the move that shifted them has finished.
//!
//! # Versioning
//!
//! Each store records the schema version of its table in
//! [`SCHEMA_VERSION_TABLE`]. A table at any other version is refused on
//! connect. There are no migrations yet.

use crate::Result;
use crate::constants::SCHEMA_VERSION_TABLE;
use crate::store::StoreError;

use super::queries::quote;
use super::SqlStore;

/// Current schema version.
///
/// Increment this when the table layout changes.
pub const SCHEMA_VERSION: i64 = 1;

/// Statements creating the record table and its schema version tracking.
pub fn create_tables(store: &SqlStore) -> Vec<String> {
    let config = store.config();
    vec![
        // BIGINT (64-bit) used for portability between SQLite and PostgreSQL
        format!(
            "CREATE TABLE IF NOT EXISTS {SCHEMA_VERSION_TABLE} (
                table_name TEXT PRIMARY KEY NOT NULL,
                version BIGINT NOT NULL
            )"
        ),
        // The group column is NULL for top-level records
        format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                {id} BIGINT PRIMARY KEY NOT NULL,
                {group} BIGINT NULL,
                {sequence} BIGINT NOT NULL
            )",
            table = quote(&config.table),
            id = quote(&config.id_field),
            group = quote(&config.group_field),
            sequence = quote(&config.sequence_field),
        ),
    ]
}

/// Statements creating indexes.
pub fn create_indexes(store: &SqlStore) -> Vec<String> {
    let config = store.config();
    vec![
        // Every max/shift/member query filters on group then compares sequence
        format!(
            "CREATE INDEX IF NOT EXISTS {index} ON {table} ({group}, {sequence})",
            index = quote(&format!(
                "idx_{}_{}_{}",
                config.table, config.group_field, config.sequence_field
            )),
            table = quote(&config.table),
            group = quote(&config.group_field),
            sequence = quote(&config.sequence_field),
        ),
    ]
}

/// Initialize the database schema.
///
/// Creates tables and indexes if they don't exist, and rejects a table
/// recorded at a different schema version.
pub async fn initialize(store: &SqlStore) -> Result<()> {
    let pool = store.pool();
    let table = &store.config().table;

    for statement in create_tables(store) {
        sqlx::query(&statement)
            .execute(pool)
            .await
            .map_err(|e| StoreError::SqlxError {
                reason: format!("Schema creation failed: {e} - SQL: {statement}"),
                source: Some(e),
            })?;
    }

    let version_query =
        format!("SELECT version FROM {SCHEMA_VERSION_TABLE} WHERE table_name = $1");
    let row: Option<(i64,)> = sqlx::query_as(&version_query)
        .bind(table.as_str())
        .fetch_optional(pool)
        .await
        .map_err(|e| StoreError::SqlxError {
            reason: format!("Failed to check schema version: {e}"),
            source: Some(e),
        })?;

    match row {
        None => {
            let insert = format!(
                "INSERT INTO {SCHEMA_VERSION_TABLE} (table_name, version) VALUES ($1, $2)"
            );
            sqlx::query(&insert)
                .bind(table.as_str())
                .bind(SCHEMA_VERSION)
                .execute(pool)
                .await
                .map_err(|e| StoreError::SqlxError {
                    reason: format!("Failed to initialize schema version: {e}"),
                    source: Some(e),
                })?;
            tracing::info!(table = %table, version = SCHEMA_VERSION, "Initialized record table");
        }
        Some((current,)) if current != SCHEMA_VERSION => {
            return Err(StoreError::SqlxError {
                reason: format!(
                    "Table {table} has schema version {current}, but only version {SCHEMA_VERSION} is supported"
                ),
                source: None,
            }
            .into());
        }
        Some(_) => {}
    }

    for statement in create_indexes(store) {
        sqlx::query(&statement)
            .execute(pool)
            .await
            .map_err(|e| StoreError::SqlxError {
                reason: format!("Index creation failed: {e} - SQL: {statement}"),
                source: Some(e),
            })?;
    }

    Ok(())
}

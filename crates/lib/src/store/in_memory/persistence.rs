//! Persistence operations for InMemory store
//!
//! This module handles serialization and file I/O for saving/loading
//! the in-memory table to/from JSON files.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::Table;
use crate::{
    Result,
    config::SequencerConfig,
    record::{GroupKey, Position, RecordId},
    store::StoreError,
};

/// The current persistence file format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const PERSISTENCE_VERSION: u8 = 0;

/// Helper to check if version is default (0) for serde skip_serializing_if
fn is_v0(v: &u8) -> bool {
    *v == 0
}

/// Validates the persistence version during deserialization.
fn validate_persistence_version<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != PERSISTENCE_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported persistence version {version}; only version {PERSISTENCE_VERSION} is supported"
        )));
    }
    Ok(version)
}

/// On-disk layout. Rows are free-form objects because their keys come from
/// the configured field names.
#[derive(Serialize, Deserialize)]
struct SerializableTable {
    /// File format version for compatibility checking
    #[serde(
        rename = "_v",
        default,
        skip_serializing_if = "is_v0",
        deserialize_with = "validate_persistence_version"
    )]
    version: u8,
    table: String,
    rows: Vec<Map<String, Value>>,
}

/// Saves the table to a JSON file.
pub(crate) async fn save_to_file<P: AsRef<Path>>(
    table: &Table,
    config: &SequencerConfig,
    path: P,
) -> Result<()> {
    let rows = table
        .rows
        .iter()
        .map(|(id, position)| row_to_json(config, *id, position))
        .collect();

    let serializable = SerializableTable {
        version: PERSISTENCE_VERSION,
        table: config.table.clone(),
        rows,
    };

    let json = serde_json::to_string_pretty(&serializable)
        .map_err(|e| StoreError::SerializationFailed { source: e })?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| StoreError::FileIo { source: e })?;
    Ok(())
}

/// Loads a table from a JSON file.
///
/// A missing file yields an empty table.
pub(crate) async fn load_from_file<P: AsRef<Path>>(
    path: P,
    config: &SequencerConfig,
) -> Result<Table> {
    let json = match tokio::fs::read_to_string(path.as_ref()).await {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.as_ref().display(), "No persistence file, starting empty");
            return Ok(Table::default());
        }
        Err(e) => return Err(StoreError::FileIo { source: e }.into()),
    };

    let serializable: SerializableTable =
        serde_json::from_str(&json).map_err(|e| StoreError::DeserializationFailed { source: e })?;

    if serializable.table != config.table {
        return Err(StoreError::MalformedRow {
            reason: format!(
                "file holds table {:?}, expected {:?}",
                serializable.table, config.table
            ),
        }
        .into());
    }

    let mut table = Table::default();
    for row in &serializable.rows {
        let (id, position) = row_from_json(config, row)?;
        if table.rows.insert(id, position).is_some() {
            return Err(StoreError::DuplicateRecord { id }.into());
        }
    }
    Ok(table)
}

fn row_to_json(config: &SequencerConfig, id: RecordId, position: &Position) -> Map<String, Value> {
    let mut row = Map::new();
    row.insert(config.id_field.clone(), Value::from(id.0));
    row.insert(
        config.group_field.clone(),
        position.group.as_column().map_or(Value::Null, Value::from),
    );
    row.insert(config.sequence_field.clone(), Value::from(position.sequence));
    row
}

fn row_from_json(config: &SequencerConfig, row: &Map<String, Value>) -> Result<(RecordId, Position)> {
    let integer = |field: &str| -> Result<Option<i64>> {
        match row.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value.as_i64().map(Some).ok_or_else(|| {
                StoreError::MalformedRow {
                    reason: format!("field {field:?} is not an integer: {value}"),
                }
                .into()
            }),
        }
    };
    let required = |field: &str| -> Result<i64> {
        integer(field)?.ok_or_else(|| {
            StoreError::MalformedRow {
                reason: format!("missing field {field:?}"),
            }
            .into()
        })
    };

    let id = RecordId(required(&config.id_field)?);
    let group = GroupKey::from(integer(&config.group_field)?.map(RecordId));
    let sequence = required(&config.sequence_field)?;
    Ok((id, Position { group, sequence }))
}

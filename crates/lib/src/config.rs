//! Sequencer configuration.
//!
//! A [`SequencerConfig`] names the table and fields a store keeps records in and
//! picks when the delete hook closes the gap. Every field has a default, so a
//! partial JSON document is enough to override just the names that differ.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::constants::{
    DEFAULT_GROUP_FIELD, DEFAULT_ID_FIELD, DEFAULT_SEQUENCE_FIELD, DEFAULT_TABLE,
};
use crate::store::StoreError;

/// When [`Sequencer::delete`](crate::Sequencer::delete) closes the gap
/// relative to removing the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteTiming {
    /// Shift following siblings, then delete the row.
    BeforeDelete,
    /// Delete the row, then shift following siblings.
    #[default]
    AfterDelete,
}

/// Schema identifiers and hook behaviour for a sequencer and its store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SequencerConfig {
    /// Table holding the records.
    pub table: String,
    /// Primary key field.
    pub id_field: String,
    /// Group (parent) key field.
    pub group_field: String,
    /// Sequence field.
    pub sequence_field: String,
    pub delete_timing: DeleteTiming,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            id_field: DEFAULT_ID_FIELD.to_string(),
            group_field: DEFAULT_GROUP_FIELD.to_string(),
            sequence_field: DEFAULT_SEQUENCE_FIELD.to_string(),
            delete_timing: DeleteTiming::default(),
        }
    }
}

impl SequencerConfig {
    /// Override the group and sequence field names.
    pub fn with_fields(
        mut self,
        group_field: impl Into<String>,
        sequence_field: impl Into<String>,
    ) -> Self {
        self.group_field = group_field.into();
        self.sequence_field = sequence_field.into();
        self
    }

    /// Override the table name.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_delete_timing(mut self, delete_timing: DeleteTiming) -> Self {
        self.delete_timing = delete_timing;
        self
    }

    /// Check that every identifier is safe to interpolate as a quoted SQL
    /// identifier and that the three field names are distinct.
    pub fn validate(&self) -> Result<()> {
        for (what, name) in [
            ("table", &self.table),
            ("id_field", &self.id_field),
            ("group_field", &self.group_field),
            ("sequence_field", &self.sequence_field),
        ] {
            if !is_identifier(name) {
                return Err(StoreError::InvalidConfiguration {
                    reason: format!("{what} {name:?} is not a valid identifier"),
                }
                .into());
            }
        }

        if self.id_field == self.group_field
            || self.id_field == self.sequence_field
            || self.group_field == self.sequence_field
        {
            return Err(StoreError::InvalidConfiguration {
                reason: format!(
                    "field names must be distinct (id {:?}, group {:?}, sequence {:?})",
                    self.id_field, self.group_field, self.sequence_field
                ),
            }
            .into());
        }

        Ok(())
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| StoreError::DeserializationFailed { source: e })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = tokio::fs::read_to_string(path.as_ref())
            .await
            .map_err(|e| StoreError::FileIo { source: e })?;
        Self::from_json(&json)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

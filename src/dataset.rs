//! # Dataset
//!
//! The dataset collaborator supplies relation groups, used to propagate
//! filters across related fields, and human-readable labels, used only when
//! rendering filter labels.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::source::FieldKey;

/// A relation group: each entry is a list of field keys, and every entry in
/// the group describes the same real-world attribute(s) in a different table.
/// Entries in one group have the same number of keys.
pub type Relation = Vec<Vec<FieldKey>>;

/// Metadata the filter service needs from the active dataset.
pub trait Dataset {
    /// Relation groups for the dataset.
    fn relations(&self) -> &[Relation];

    /// Human-readable label for a field.
    fn field_label(&self, _key: &FieldKey) -> Option<String> {
        None
    }

    /// Human-readable label for a table.
    fn table_label(&self, _datastore: &str, _database: &str, _table: &str) -> Option<String> {
        None
    }
}

/// In-memory dataset, typically deserialized from JSON:
///
/// ```json
/// {
///   "relations": [[["es.db.t1.id"], ["es.db.t2.ref"]]],
///   "labels": {"es.db.t1.id": "ID", "es.db.t1": "People"}
/// }
/// ```
///
/// Labels are keyed by the field key string, or by `datastore.database.table`
/// for table labels.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct StaticDataset {
    /// Relation groups.
    pub relations: Vec<Relation>,

    /// Field and table labels.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl StaticDataset {
    /// An empty dataset: no relations, no labels.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a dataset from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error when the JSON is malformed or contains an invalid
    /// field key.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Add a relation group.
    #[must_use]
    pub fn relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    /// Label a field.
    #[must_use]
    pub fn label(mut self, key: &FieldKey, label: impl Into<String>) -> Self {
        self.labels.insert(key.to_string(), label.into());
        self
    }

    /// Label a table.
    #[must_use]
    pub fn table(
        mut self, datastore: &str, database: &str, table: &str, label: impl Into<String>,
    ) -> Self {
        self.labels.insert(format!("{datastore}.{database}.{table}"), label.into());
        self
    }
}

impl Dataset for StaticDataset {
    fn relations(&self) -> &[Relation] {
        &self.relations
    }

    fn field_label(&self, key: &FieldKey) -> Option<String> {
        self.labels.get(&key.to_string()).cloned()
    }

    fn table_label(&self, datastore: &str, database: &str, table: &str) -> Option<String> {
        self.labels.get(&format!("{datastore}.{database}.{table}")).cloned()
    }
}
